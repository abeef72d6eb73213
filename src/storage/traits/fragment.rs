//! Fragment store trait.

use crate::{Error, Result};
use crate::models::{Fragment, FragmentId};

/// Trait for fragment sources.
///
/// Stores are the authoritative owner of fragments. The graph builder and
/// the dialogue orchestrator only read snapshots returned by
/// [`get_all`](Self::get_all).
pub trait FragmentStore: Send + Sync {
    /// Returns every fragment in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get_all(&self) -> Result<Vec<Fragment>>;

    /// Retrieves a fragment by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, id: FragmentId) -> Result<Option<Fragment>>;

    /// Adds a fragment, assigning the next free id when it has none.
    ///
    /// Returns the stored fragment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`](crate::Error::InvalidInput) if the id
    /// is already taken, or an error if storage cannot be written.
    fn add(&self, fragment: Fragment) -> Result<Fragment>;

    /// Replaces a stored fragment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`](crate::Error::InvalidInput) when the
    /// fragment has no id and [`Error::NotFound`](crate::Error::NotFound)
    /// when the id is unknown.
    fn update(&self, fragment: Fragment) -> Result<Fragment>;

    /// Deletes a fragment. Returns false if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    fn delete(&self, id: FragmentId) -> Result<bool>;

    /// Returns the number of stored fragments.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn count(&self) -> Result<usize> {
        Ok(self.get_all()?.len())
    }

    /// Returns fragments carrying `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn fragments_with_tag(&self, tag: &str) -> Result<Vec<Fragment>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|fragment| fragment.has_tag(tag))
            .collect())
    }

    /// Case-insensitive search over title, content, tags and category.
    ///
    /// A blank query matches everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn search_fragments(&self, query: &str) -> Result<Vec<Fragment>> {
        let needle = query.trim().to_lowercase();
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|fragment| needle.is_empty() || matches_query(fragment, &needle))
            .collect())
    }
}

fn matches_query(fragment: &Fragment, needle: &str) -> bool {
    fragment.title.to_lowercase().contains(needle)
        || fragment.content.to_lowercase().contains(needle)
        || fragment
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
        || fragment
            .category
            .as_ref()
            .is_some_and(|category| category.to_lowercase().contains(needle))
}

/// Stamps a fragment for insertion: assigns the next free id if unsaved
/// and fills missing timestamps.
///
/// Fails with [`Error::InvalidInput`] when `existing` already uses
/// `u64::MAX`, since no larger id remains.
pub(crate) fn prepare_insert<'a>(
    mut fragment: Fragment,
    existing: impl IntoIterator<Item = &'a Fragment>,
) -> Result<Fragment> {
    if fragment.id.is_none() {
        fragment.id = Some(FragmentId::new(next_id(existing)?));
    }
    let now = chrono::Utc::now();
    fragment.created_at.get_or_insert(now);
    fragment.updated_at = Some(now);
    Ok(fragment)
}

/// Next id after the highest one in `fragments`.
fn next_id<'a>(fragments: impl IntoIterator<Item = &'a Fragment>) -> Result<u64> {
    let Some(max) = fragments
        .into_iter()
        .filter_map(|fragment| fragment.id)
        .map(FragmentId::value)
        .max()
    else {
        return Ok(1);
    };
    max.checked_add(1)
        .ok_or_else(|| Error::InvalidInput(format!("no fragment id left after {max}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_id_follows_highest() {
        assert_eq!(next_id(std::iter::empty()).unwrap(), 1);
        let fragments = [Fragment::new("a", "").with_id(3), Fragment::new("b", "")];
        assert_eq!(next_id(&fragments).unwrap(), 4);
    }

    #[test]
    fn test_next_id_exhausted_is_an_error() {
        let fragments = [Fragment::new("a", "").with_id(u64::MAX)];
        assert!(matches!(next_id(&fragments), Err(Error::InvalidInput(_))));
        assert!(prepare_insert(Fragment::new("b", ""), &fragments).is_err());
        assert!(prepare_insert(Fragment::new("c", "").with_id(7), &fragments).is_ok());
    }
}
