//! Floating panel geometry controller.
//!
//! Drag and resize are pure functions of (geometry, delta) that clamp the
//! result, and [`PanelController`] drives them from discrete pointer
//! events:
//!
//! ```text
//! Idle --DragStart--> Dragging --Move*--> Dragging --Release--> Idle
//! Idle --ResizeStart--> Resizing(dir) --Move*--> Resizing(dir) --Release--> Idle
//! ```
//!
//! Deltas are measured from the pointer position at gesture start and
//! applied to the geometry captured at that moment, so a gesture never
//! accumulates rounding or clamping drift.
//!
//! # Invariants
//!
//! - `size` stays within `[min_size, max_size]` component-wise.
//! - The panel stays inside the viewport known at commit time.
//! - Resizing from the left or top keeps the opposite edge fixed.

use crate::config::PanelConfig;
use crate::models::{PanelGeometry, Point, ResizeDirection, Size};

/// Size limits of the floating panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelBounds {
    /// Smallest expanded size.
    pub min_size: Size,
    /// Largest expanded size.
    pub max_size: Size,
    /// On-screen size while minimized.
    pub minimized_size: Size,
}

impl Default for PanelBounds {
    fn default() -> Self {
        Self {
            min_size: Size::new(300.0, 400.0),
            max_size: Size::new(600.0, 700.0),
            minimized_size: Size::new(200.0, 60.0),
        }
    }
}

impl PanelBounds {
    /// Builds bounds from the `[panel]` config section.
    #[must_use]
    pub fn from_config(config: &PanelConfig) -> Self {
        Self {
            min_size: config.min_size,
            max_size: Size::new(
                config.max_size.width.max(config.min_size.width),
                config.max_size.height.max(config.min_size.height),
            ),
            minimized_size: config.minimized_size,
        }
    }
}

/// Returns `value` limited to `[lo, hi]`, preferring `lo` when `lo > hi`.
fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    value.min(hi).max(lo)
}

fn clamp_position(position: Point, size: Size, viewport: Size) -> Point {
    Point::new(
        clamp(position.x, 0.0, viewport.width - size.width),
        clamp(position.y, 0.0, viewport.height - size.height),
    )
}

/// Moves the panel by `(dx, dy)` and clamps it into the viewport.
#[must_use]
pub fn drag(
    geometry: &PanelGeometry,
    dx: f64,
    dy: f64,
    bounds: &PanelBounds,
    viewport: Size,
) -> PanelGeometry {
    let size = geometry.effective_size(bounds.minimized_size);
    let moved = Point::new(geometry.position.x + dx, geometry.position.y + dy);
    PanelGeometry {
        position: clamp_position(moved, size, viewport),
        ..*geometry
    }
}

/// Resizes the panel from the edges in `direction` by `(dx, dy)`.
///
/// Left and top resizes shift the position so the right and bottom edges
/// stay where they were. Growth is limited both by `max_size` and by the
/// viewport edge on the moving side. A minimized panel is returned
/// unchanged.
#[must_use]
pub fn resize(
    geometry: &PanelGeometry,
    direction: ResizeDirection,
    dx: f64,
    dy: f64,
    bounds: &PanelBounds,
    viewport: Size,
) -> PanelGeometry {
    if geometry.is_minimized || direction.is_empty() {
        return *geometry;
    }

    let PanelGeometry {
        mut position,
        mut size,
        ..
    } = *geometry;
    let (min, max) = (bounds.min_size, bounds.max_size);

    if direction.left {
        let anchor = position.x + size.width;
        size.width = clamp(size.width - dx, min.width, max.width.min(anchor));
        position.x = anchor - size.width;
    } else if direction.right {
        let room = viewport.width - position.x;
        size.width = clamp(size.width + dx, min.width, max.width.min(room));
    }

    if direction.top {
        let anchor = position.y + size.height;
        size.height = clamp(size.height - dy, min.height, max.height.min(anchor));
        position.y = anchor - size.height;
    } else if direction.bottom {
        let room = viewport.height - position.y;
        size.height = clamp(size.height + dy, min.height, max.height.min(room));
    }

    PanelGeometry {
        position: clamp_position(position, size, viewport),
        size,
        is_minimized: false,
    }
}

/// Pointer input delivered to the panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Pointer pressed on the title bar.
    DragStart(Point),
    /// Pointer pressed on a resize handle.
    ResizeStart(ResizeDirection, Point),
    /// Pointer moved to an absolute screen point.
    Move(Point),
    /// Pointer released.
    Release,
}

/// Gesture currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    /// No gesture.
    Idle,
    /// Moving the panel.
    Dragging,
    /// Resizing from the given edges.
    Resizing(ResizeDirection),
}

#[derive(Debug, Clone, Copy)]
enum Gesture {
    Idle,
    Dragging {
        origin: Point,
        start: PanelGeometry,
    },
    Resizing {
        direction: ResizeDirection,
        origin: Point,
        start: PanelGeometry,
    },
}

/// Owns the committed panel geometry and the active pointer gesture.
#[derive(Debug, Clone)]
pub struct PanelController {
    geometry: PanelGeometry,
    bounds: PanelBounds,
    viewport: Size,
    gesture: Gesture,
}

impl PanelController {
    /// Creates a controller, clamping `geometry` to the bounds and viewport.
    #[must_use]
    pub fn new(geometry: PanelGeometry, bounds: PanelBounds, viewport: Size) -> Self {
        let mut controller = Self {
            geometry,
            bounds,
            viewport,
            gesture: Gesture::Idle,
        };
        controller.geometry = controller.normalized(geometry);
        controller
    }

    /// Creates a controller at the configured default geometry.
    #[must_use]
    pub fn from_config(config: &PanelConfig) -> Self {
        Self::new(
            config.default_geometry(),
            PanelBounds::from_config(config),
            config.viewport,
        )
    }

    /// Committed geometry.
    #[must_use]
    pub const fn geometry(&self) -> &PanelGeometry {
        &self.geometry
    }

    /// Size limits.
    #[must_use]
    pub const fn bounds(&self) -> &PanelBounds {
        &self.bounds
    }

    /// Current viewport size.
    #[must_use]
    pub const fn viewport(&self) -> Size {
        self.viewport
    }

    /// Gesture in progress.
    #[must_use]
    pub const fn state(&self) -> PanelState {
        match self.gesture {
            Gesture::Idle => PanelState::Idle,
            Gesture::Dragging { .. } => PanelState::Dragging,
            Gesture::Resizing { direction, .. } => PanelState::Resizing(direction),
        }
    }

    /// Feeds one pointer event and returns the committed geometry.
    pub fn handle(&mut self, event: PointerEvent) -> PanelGeometry {
        match event {
            PointerEvent::DragStart(origin) => {
                self.gesture = Gesture::Dragging {
                    origin,
                    start: self.geometry,
                };
            },
            PointerEvent::ResizeStart(direction, origin) => {
                self.gesture = if self.geometry.is_minimized || direction.is_empty() {
                    Gesture::Idle
                } else {
                    Gesture::Resizing {
                        direction,
                        origin,
                        start: self.geometry,
                    }
                };
            },
            PointerEvent::Move(point) => match self.gesture {
                Gesture::Idle => {},
                Gesture::Dragging { origin, start } => {
                    let (dx, dy) = point.delta_from(origin);
                    self.geometry = drag(&start, dx, dy, &self.bounds, self.viewport);
                },
                Gesture::Resizing {
                    direction,
                    origin,
                    start,
                } => {
                    let (dx, dy) = point.delta_from(origin);
                    self.geometry =
                        resize(&start, direction, dx, dy, &self.bounds, self.viewport);
                },
            },
            PointerEvent::Release => {
                self.gesture = Gesture::Idle;
            },
        }
        self.geometry
    }

    /// Moves the committed geometry by a delta outside any gesture.
    pub fn on_drag_delta(&mut self, dx: f64, dy: f64) -> Point {
        self.geometry = drag(&self.geometry, dx, dy, &self.bounds, self.viewport);
        self.geometry.position
    }

    /// Resizes the committed geometry by a delta outside any gesture.
    pub fn on_resize_delta(&mut self, direction: ResizeDirection, dx: f64, dy: f64) -> PanelGeometry {
        self.geometry = resize(&self.geometry, direction, dx, dy, &self.bounds, self.viewport);
        self.geometry
    }

    /// Replaces the viewport and re-clamps the committed position.
    pub fn set_viewport(&mut self, viewport: Size) -> PanelGeometry {
        self.viewport = viewport;
        self.geometry = self.normalized(self.geometry);
        self.geometry
    }

    /// Places the panel at `position`, clamped into the viewport.
    pub fn set_position(&mut self, position: Point) -> PanelGeometry {
        self.geometry = self.normalized(PanelGeometry {
            position,
            ..self.geometry
        });
        self.geometry
    }

    /// Collapses or expands the panel. Ends any gesture in progress.
    pub fn set_minimized(&mut self, minimized: bool) -> PanelGeometry {
        self.gesture = Gesture::Idle;
        self.geometry = self.normalized(PanelGeometry {
            is_minimized: minimized,
            ..self.geometry
        });
        self.geometry
    }

    /// Replaces the committed geometry, clamped, and ends any gesture.
    pub fn reset(&mut self, geometry: PanelGeometry) -> PanelGeometry {
        self.gesture = Gesture::Idle;
        self.geometry = self.normalized(geometry);
        self.geometry
    }

    fn normalized(&self, geometry: PanelGeometry) -> PanelGeometry {
        let (min, max) = (self.bounds.min_size, self.bounds.max_size);
        let size = Size::new(
            clamp(geometry.size.width, min.width, max.width),
            clamp(geometry.size.height, min.height, max.height),
        );
        let on_screen = if geometry.is_minimized {
            self.bounds.minimized_size
        } else {
            size
        };
        PanelGeometry {
            position: clamp_position(geometry.position, on_screen, self.viewport),
            size,
            is_minimized: geometry.is_minimized,
        }
    }
}
