//! Data models for fragmind.
//!
//! This module contains all the core data structures used throughout the system.

mod chat;
mod fragment;
mod geometry;
pub mod graph;

pub use chat::{ChatSession, ContextEntry, Message, Role, SessionId};
pub use fragment::{Fragment, FragmentId, FragmentMetadata, FragmentStatus, Priority};
pub use geometry::{PanelGeometry, Point, ResizeDirection, Size};
pub use graph::{EdgeStrength, FragmentGraph, GraphEdge, GraphNode, GraphStats};
