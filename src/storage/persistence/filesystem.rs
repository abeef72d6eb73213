//! Filesystem fragment store.
//!
//! Keeps all fragments in a single JSON array file, the same shape the
//! fragment list is exchanged in. The file is created on first write and
//! replaced atomically (temp file + rename) on every change.

use crate::models::{Fragment, FragmentId};
use crate::storage::traits::{FragmentStore, prepare_insert};
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Maximum size of the fragment file (16MB).
const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Fragment store backed by one JSON file.
#[derive(Debug)]
pub struct FilesystemFragmentStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl FilesystemFragmentStore {
    /// Creates a store for `path`. Nothing is touched until the first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<Fragment>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let metadata = fs::metadata(&self.path).map_err(|e| Error::OperationFailed {
            operation: "read_fragment_store".to_string(),
            cause: e.to_string(),
        })?;
        if metadata.len() > MAX_FILE_SIZE {
            return Err(Error::InvalidInput(format!(
                "Fragment file exceeds maximum size of {MAX_FILE_SIZE} bytes: {}",
                self.path.display()
            )));
        }

        let json = fs::read_to_string(&self.path).map_err(|e| Error::OperationFailed {
            operation: "read_fragment_store".to_string(),
            cause: e.to_string(),
        })?;
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&json).map_err(|e| Error::OperationFailed {
            operation: "deserialize_fragments".to_string(),
            cause: e.to_string(),
        })
    }

    fn write(&self, fragments: &[Fragment]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_fragment_dir".to_string(),
                cause: e.to_string(),
            })?;
        }

        let json = serde_json::to_string_pretty(fragments).map_err(|e| Error::OperationFailed {
            operation: "serialize_fragments".to_string(),
            cause: e.to_string(),
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| Error::OperationFailed {
            operation: "write_fragment_store".to_string(),
            cause: e.to_string(),
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| Error::OperationFailed {
            operation: "write_fragment_store".to_string(),
            cause: e.to_string(),
        })?;

        tracing::debug!(path = %self.path.display(), count = fragments.len(), "Wrote fragment store");
        Ok(())
    }

    fn modify<T>(&self, f: impl FnOnce(&mut Vec<Fragment>) -> Result<T>) -> Result<T> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut fragments = self.read()?;
        let value = f(&mut fragments)?;
        self.write(&fragments)?;
        Ok(value)
    }
}

impl FragmentStore for FilesystemFragmentStore {
    fn get_all(&self) -> Result<Vec<Fragment>> {
        self.read()
    }

    fn get(&self, id: FragmentId) -> Result<Option<Fragment>> {
        Ok(self.read()?.into_iter().find(|f| f.id == Some(id)))
    }

    fn add(&self, fragment: Fragment) -> Result<Fragment> {
        self.modify(|fragments| {
            if let Some(id) = fragment.id.filter(|id| fragments.iter().any(|f| f.id == Some(*id))) {
                return Err(Error::InvalidInput(format!("fragment {id} already exists")));
            }
            let fragment = prepare_insert(fragment, fragments.iter())?;
            fragments.push(fragment.clone());
            Ok(fragment)
        })
    }

    fn update(&self, mut fragment: Fragment) -> Result<Fragment> {
        let id = fragment
            .id
            .ok_or_else(|| Error::InvalidInput("cannot update an unsaved fragment".to_string()))?;
        self.modify(|fragments| {
            let Some(existing) = fragments.iter_mut().find(|f| f.id == Some(id)) else {
                return Err(Error::NotFound(format!("fragment {id}")));
            };
            fragment.created_at = fragment.created_at.or(existing.created_at);
            fragment.updated_at = Some(chrono::Utc::now());
            *existing = fragment.clone();
            Ok(fragment)
        })
    }

    fn delete(&self, id: FragmentId) -> Result<bool> {
        if self.get(id)?.is_none() {
            return Ok(false);
        }
        self.modify(|fragments| {
            let before = fragments.len();
            fragments.retain(|f| f.id != Some(id));
            Ok(fragments.len() != before)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FilesystemFragmentStore) {
        let dir = TempDir::new().unwrap();
        let store = FilesystemFragmentStore::new(dir.path().join("data").join("fragments.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let (_dir, store) = store();
        assert!(store.get_all().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_add_creates_file_and_persists() {
        let (_dir, store) = store();
        let saved = store
            .add(Fragment::new("Ownership", "one owner").with_tags(["rust"]))
            .unwrap();
        assert_eq!(saved.id, Some(FragmentId::new(1)));
        assert!(store.path().exists());

        let reopened = FilesystemFragmentStore::new(store.path());
        let all = reopened.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Ownership");
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_update_delete_round() {
        let (_dir, store) = store();
        let mut fragment = store.add(Fragment::new("a", "old")).unwrap();
        store.add(Fragment::new("b", "")).unwrap();
        fragment.content = "new".to_string();
        store.update(fragment.clone()).unwrap();

        let id = fragment.id.unwrap();
        assert_eq!(store.get(id).unwrap().unwrap().content, "new");
        assert!(store.delete(id).unwrap());
        assert!(!store.delete(id).unwrap());
        assert_eq!(store.count().unwrap(), 1);
        assert!(matches!(store.update(fragment), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_reads_camel_case_file() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            r#"[{"id": 4, "title": "Imported", "content": "x", "tags": ["a"], "categoryId": 2, "priority": "high"}]"#,
        )
        .unwrap();
        let all = store.get_all().unwrap();
        assert_eq!(all[0].category_id, Some(2));
        assert_eq!(store.add(Fragment::new("next", "")).unwrap().id, Some(FragmentId::new(5)));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.get_all(), Err(Error::OperationFailed { .. })));
    }
}
