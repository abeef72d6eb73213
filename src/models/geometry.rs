//! Screen geometry for graph layout and the floating dialogue panel.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A point in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the component-wise offset from `origin` to `self`.
    #[must_use]
    pub fn delta_from(self, origin: Self) -> (f64, f64) {
        (self.x - origin.x, self.y - origin.y)
    }
}

/// A width/height pair in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Size {
    /// Creates a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Committed geometry of the floating panel.
///
/// Only the panel controller mutates this, so `size` always lies within the
/// configured bounds and `position` keeps the panel inside the viewport
/// known at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelGeometry {
    /// Top-left corner.
    pub position: Point,
    /// Expanded size.
    pub size: Size,
    /// Whether the panel is collapsed to its title bar.
    pub is_minimized: bool,
}

impl PanelGeometry {
    /// Creates an expanded panel geometry.
    #[must_use]
    pub const fn new(position: Point, size: Size) -> Self {
        Self {
            position,
            size,
            is_minimized: false,
        }
    }

    /// Returns the on-screen size, which is `minimized` while collapsed.
    #[must_use]
    pub const fn effective_size(&self, minimized: Size) -> Size {
        if self.is_minimized {
            minimized
        } else {
            self.size
        }
    }

    /// Returns the bottom-right corner of the expanded panel.
    #[must_use]
    pub fn bottom_right(&self) -> Point {
        Point::new(
            self.position.x + self.size.width,
            self.position.y + self.size.height,
        )
    }
}

/// Edges moved by a resize handle.
///
/// Edge handles set one flag, corner handles set two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResizeDirection {
    /// Top edge moves.
    pub top: bool,
    /// Bottom edge moves.
    pub bottom: bool,
    /// Left edge moves.
    pub left: bool,
    /// Right edge moves.
    pub right: bool,
}

impl ResizeDirection {
    /// Top edge handle.
    pub const TOP: Self = Self::edges(true, false, false, false);
    /// Bottom edge handle.
    pub const BOTTOM: Self = Self::edges(false, true, false, false);
    /// Left edge handle.
    pub const LEFT: Self = Self::edges(false, false, true, false);
    /// Right edge handle.
    pub const RIGHT: Self = Self::edges(false, false, false, true);
    /// Top-left corner handle.
    pub const TOP_LEFT: Self = Self::edges(true, false, true, false);
    /// Top-right corner handle.
    pub const TOP_RIGHT: Self = Self::edges(true, false, false, true);
    /// Bottom-left corner handle.
    pub const BOTTOM_LEFT: Self = Self::edges(false, true, true, false);
    /// Bottom-right corner handle.
    pub const BOTTOM_RIGHT: Self = Self::edges(false, true, false, true);

    const fn edges(top: bool, bottom: bool, left: bool, right: bool) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Returns true if no edge is selected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !(self.top || self.bottom || self.left || self.right)
    }
}

impl fmt::Display for ResizeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vertical = match (self.top, self.bottom) {
            (true, _) => Some("top"),
            (false, true) => Some("bottom"),
            (false, false) => None,
        };
        let horizontal = match (self.left, self.right) {
            (true, _) => Some("left"),
            (false, true) => Some("right"),
            (false, false) => None,
        };
        match (vertical, horizontal) {
            (Some(v), Some(h)) => write!(f, "{v}-{h}"),
            (Some(edge), None) | (None, Some(edge)) => write!(f, "{edge}"),
            (None, None) => write!(f, "none"),
        }
    }
}

impl FromStr for ResizeDirection {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut direction = Self::default();
        for part in s.trim().to_lowercase().split(['-', '_', ' ']) {
            match part {
                "top" | "n" => direction.top = true,
                "bottom" | "s" => direction.bottom = true,
                "left" | "w" => direction.left = true,
                "right" | "e" => direction.right = true,
                "" => {},
                other => {
                    return Err(crate::Error::InvalidInput(format!(
                        "unknown resize edge '{other}' in '{s}'"
                    )));
                },
            }
        }
        if direction.is_empty()
            || (direction.top && direction.bottom)
            || (direction.left && direction.right)
        {
            return Err(crate::Error::InvalidInput(format!(
                "invalid resize direction: {s}"
            )));
        }
        Ok(direction)
    }
}
