//! In-memory fragment store.
//!
//! Non-persistent implementation of [`FragmentStore`] used by tests and by
//! callers that already hold their fragments in memory.

use crate::models::{Fragment, FragmentId};
use crate::storage::traits::{FragmentStore, prepare_insert};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// In-memory fragment store ordered by id.
#[derive(Debug, Default)]
pub struct MemoryFragmentStore {
    fragments: RwLock<BTreeMap<FragmentId, Fragment>>,
}

impl MemoryFragmentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `fragments`; unsaved ones get fresh ids.
    ///
    /// # Errors
    ///
    /// Returns an error on a duplicate id or when ids run out.
    pub fn with_fragments(fragments: impl IntoIterator<Item = Fragment>) -> Result<Self> {
        let store = Self::new();
        for fragment in fragments {
            store.add(fragment)?;
        }
        Ok(store)
    }
}

fn poisoned(operation: &str) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: "Lock poisoned".to_string(),
    }
}

impl FragmentStore for MemoryFragmentStore {
    fn get_all(&self) -> Result<Vec<Fragment>> {
        let fragments = self.fragments.read().map_err(|_| poisoned("get_all_fragments"))?;
        Ok(fragments.values().cloned().collect())
    }

    fn get(&self, id: FragmentId) -> Result<Option<Fragment>> {
        let fragments = self.fragments.read().map_err(|_| poisoned("get_fragment"))?;
        Ok(fragments.get(&id).cloned())
    }

    fn add(&self, fragment: Fragment) -> Result<Fragment> {
        let mut fragments = self.fragments.write().map_err(|_| poisoned("add_fragment"))?;
        if let Some(id) = fragment.id.filter(|id| fragments.contains_key(id)) {
            return Err(Error::InvalidInput(format!("fragment {id} already exists")));
        }
        let fragment = prepare_insert(fragment, fragments.values())?;
        let Some(id) = fragment.id else {
            return Err(Error::InvalidInput("fragment has no id".to_string()));
        };
        fragments.insert(id, fragment.clone());
        Ok(fragment)
    }

    fn update(&self, mut fragment: Fragment) -> Result<Fragment> {
        let id = fragment
            .id
            .ok_or_else(|| Error::InvalidInput("cannot update an unsaved fragment".to_string()))?;
        let mut fragments = self.fragments.write().map_err(|_| poisoned("update_fragment"))?;
        let Some(existing) = fragments.get_mut(&id) else {
            return Err(Error::NotFound(format!("fragment {id}")));
        };
        fragment.created_at = fragment.created_at.or(existing.created_at);
        fragment.updated_at = Some(chrono::Utc::now());
        *existing = fragment.clone();
        Ok(fragment)
    }

    fn delete(&self, id: FragmentId) -> Result<bool> {
        let mut fragments = self.fragments.write().map_err(|_| poisoned("delete_fragment"))?;
        Ok(fragments.remove(&id).is_some())
    }
}
