//! # Fragmind
//!
//! A knowledge-fragment graph and contextual dialogue engine.
//!
//! Fragmind turns a flat list of tagged text fragments into a graph whose
//! edges connect fragments sharing tags, and lets a user collect a working
//! set of fragments into a chat session whose tags and text are sent along
//! with every message to an external language-model endpoint.
//!
//! ## Features
//!
//! - Deterministic graph topology with collision-free node identity
//! - Per-session context store with idempotent reconciliation
//! - Tag-grouped prompt preamble and structured tag metadata
//! - Modal or floating-panel dialogue surface with clamped drag/resize
//! - Fallback replies so a failed turn never corrupts a session
//!
//! ## Example
//!
//! ```rust
//! use fragmind::models::Fragment;
//! use fragmind::services::GraphBuilder;
//!
//! let fragments = vec![
//!     Fragment::new("Ownership", "Each value has one owner").with_id(1).with_tags(["rust", "memory"]),
//!     Fragment::new("Borrowing", "References never outlive data").with_id(2).with_tags(["rust"]),
//! ];
//!
//! let graph = GraphBuilder::default().with_seed(7).build(&fragments);
//! assert_eq!(graph.nodes.len(), 2);
//! assert_eq!(graph.edges.len(), 1);
//! assert_eq!(graph.edges[0].weight, 1);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod config;
pub mod llm;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::FragmindConfig;
pub use llm::{DialogueEndpoint, DialogueRequest, DialogueResponse};
pub use models::{
    ChatSession, ContextEntry, Fragment, FragmentId, GraphEdge, GraphNode, GraphStats, Message,
    PanelGeometry, Point, Role, Size,
};
pub use services::{
    ContextStore, DialogueMode, DialogueOrchestrator, DialogueState, GraphBuilder,
    PanelController, PromptBuilder, resolve_identity,
};
pub use storage::{FilesystemFragmentStore, FragmentStore, MemoryFragmentStore};

/// Error type for fragmind operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Blank chat message, unknown resize direction, bad config value |
/// | `OperationFailed` | I/O errors, HTTP failures, JSON (de)serialization failures |
/// | `NotFound` | Updating a fragment id the store does not hold |
/// | `NoActiveSession` | Sending while no dialogue session is open |
///
/// Identity fallback, duplicate context insertion, malformed drop payloads
/// and out-of-bounds geometry are handled locally and never surface here.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Fragment store files cannot be read, parsed, or written
    /// - The dialogue endpoint is unreachable or returns an unreadable body
    /// - Logging cannot be initialized
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A stored fragment was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// No dialogue session is open to receive the operation.
    #[error("no active dialogue session")]
    NoActiveSession,
}

/// Result type alias for fragmind operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::OperationFailed {
            operation: "test".to_string(),
            cause: "failed".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'test' failed: failed");

        let err = Error::NotFound("fragment 7".to_string());
        assert_eq!(err.to_string(), "not found: fragment 7");

        assert_eq!(
            Error::NoActiveSession.to_string(),
            "no active dialogue session"
        );
    }
}
