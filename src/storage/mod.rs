//! Storage layer abstraction.
//!
//! Fragments are owned by a [`FragmentStore`]. Two backends are provided:
//! - **Memory**: ordered in-process map, for tests and embedding callers
//! - **Filesystem**: a single JSON array file under the data directory

pub mod persistence;
pub mod traits;

pub use persistence::{FilesystemFragmentStore, MemoryFragmentStore};
pub use traits::FragmentStore;
