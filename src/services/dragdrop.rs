//! Drag-and-drop transfer of fragments into a dialogue context.
//!
//! A drag source serializes a [`DragPayload`] to JSON at drag start and the
//! drop target decodes it. Malformed or missing payloads are dropped
//! silently; a bad drop must never partially mutate the context.

use crate::models::{Fragment, Point, Size};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Data carried from a drag source to a drop target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragPayload {
    /// Resolved identity of the source graph node, when dragged from the graph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// The dragged fragment.
    pub fragment: Fragment,
}

impl DragPayload {
    /// Payload for a fragment dragged from a graph node.
    #[must_use]
    pub fn from_node(node_id: impl Into<String>, fragment: Fragment) -> Self {
        Self {
            node_id: Some(node_id.into()),
            fragment,
        }
    }
}

/// Serializes a payload at drag start.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn encode_drag_payload(payload: &DragPayload) -> Result<String> {
    serde_json::to_string(payload).map_err(|e| Error::OperationFailed {
        operation: "encode_drag_payload".to_string(),
        cause: e.to_string(),
    })
}

/// Decodes a drop payload, returning `None` for anything unusable.
///
/// Accepts the [`DragPayload`] envelope or a bare fragment object.
#[must_use]
pub fn decode_drag_payload(raw: &str) -> Option<DragPayload> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(payload) = serde_json::from_str::<DragPayload>(raw) {
        return Some(payload);
    }
    match serde_json::from_str::<Fragment>(raw) {
        Ok(fragment) => Some(DragPayload {
            node_id: None,
            fragment,
        }),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed drop payload");
            None
        },
    }
}

/// A decoded drop with its position relative to the drop zone.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedFragment {
    /// Decoded payload.
    pub payload: DragPayload,
    /// Drop point relative to the zone's top-left corner.
    pub position: Point,
}

/// Rectangular drop target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropZone {
    /// Top-left corner in screen coordinates.
    pub origin: Point,
    /// Zone size.
    pub size: Size,
    /// Whether drops are currently accepted.
    pub active: bool,
}

impl DropZone {
    /// Creates an active zone.
    #[must_use]
    pub const fn new(origin: Point, size: Size) -> Self {
        Self {
            origin,
            size,
            active: true,
        }
    }

    /// Returns true if `pointer` lies inside the zone.
    #[must_use]
    pub fn contains(&self, pointer: Point) -> bool {
        pointer.x >= self.origin.x
            && pointer.x <= self.origin.x + self.size.width
            && pointer.y >= self.origin.y
            && pointer.y <= self.origin.y + self.size.height
    }

    /// Returns true while a drag over `pointer` should be highlighted.
    #[must_use]
    pub fn is_drag_over(&self, pointer: Point) -> bool {
        self.active && self.contains(pointer)
    }

    /// Accepts a drop at screen point `pointer`.
    ///
    /// Returns `None` while inactive, outside the zone, or when the payload
    /// is malformed.
    #[must_use]
    pub fn accept(&self, raw: &str, pointer: Point) -> Option<DroppedFragment> {
        if !self.is_drag_over(pointer) {
            return None;
        }
        let payload = decode_drag_payload(raw)?;
        let (x, y) = pointer.delta_from(self.origin);
        Some(DroppedFragment {
            payload,
            position: Point::new(x, y),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_payload_roundtrip_keeps_node_id() {
        let payload = DragPayload::from_node("temp-2", Fragment::new("Draft", "x"));
        let raw = encode_drag_payload(&payload).unwrap();
        assert_eq!(decode_drag_payload(&raw), Some(payload));
    }

    #[test]
    fn test_bare_fragment_payload_is_accepted() {
        let decoded = decode_drag_payload(r#"{"id": 3, "title": "Grid", "tags": ["css"]}"#).unwrap();
        assert_eq!(decoded.node_id, None);
        assert_eq!(decoded.fragment.title, "Grid");
    }

    #[test_case(""; "empty")]
    #[test_case("   "; "whitespace")]
    #[test_case("not json"; "garbage")]
    #[test_case(r#"{"content": "no title"}"#; "missing title")]
    #[test_case("[1, 2]"; "wrong shape")]
    fn test_malformed_payloads_are_ignored(raw: &str) {
        assert!(decode_drag_payload(raw).is_none());
    }

    #[test]
    fn test_drop_position_is_relative_to_zone() {
        let zone = DropZone::new(Point::new(100.0, 50.0), Size::new(400.0, 300.0));
        let raw = r#"{"title": "t"}"#;
        let dropped = zone.accept(raw, Point::new(150.0, 80.0)).unwrap();
        assert_eq!(dropped.position, Point::new(50.0, 30.0));
    }

    #[test]
    fn test_inactive_zone_ignores_drops() {
        let mut zone = DropZone::new(Point::default(), Size::new(10.0, 10.0));
        zone.active = false;
        assert!(zone.accept(r#"{"title": "t"}"#, Point::new(1.0, 1.0)).is_none());
        assert!(!zone.is_drag_over(Point::new(1.0, 1.0)));
        assert!(zone.contains(Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_drop_outside_zone_is_ignored() {
        let zone = DropZone::new(Point::new(100.0, 100.0), Size::new(50.0, 50.0));
        assert!(zone.is_drag_over(Point::new(120.0, 120.0)));
        assert!(!zone.is_drag_over(Point::new(20.0, 120.0)));
        assert!(zone.accept(r#"{"title": "t"}"#, Point::new(20.0, 120.0)).is_none());
        assert!(zone.accept(r#"{"title": "t"}"#, Point::new(120.0, 120.0)).is_some());
    }
}
