//! Storage backend traits.

mod fragment;

pub(crate) use fragment::prepare_insert;

pub use fragment::FragmentStore;
