//! Fragment store implementations.

mod filesystem;
mod memory;

pub use filesystem::FilesystemFragmentStore;
pub use memory::MemoryFragmentStore;
