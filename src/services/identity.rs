//! Fragment identity resolution.
//!
//! The resolved identity is the single key used to deduplicate fragments in
//! both the graph and dialogue contexts. Saved fragments resolve to their
//! numeric id; unsaved ones fall back to a positional `temp-<index>` id that
//! is only meaningful within the list it was computed from.

use crate::models::Fragment;

/// Prefix of positional identities given to unsaved fragments.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Resolves the identity of `fragment` at `index` in the current list.
///
/// Never fails: a missing id is an expected input, not an error.
///
/// # Examples
///
/// ```
/// use fragmind::models::Fragment;
/// use fragmind::services::resolve_identity;
///
/// assert_eq!(resolve_identity(&Fragment::new("a", "").with_id(42), 0), "42");
/// assert_eq!(resolve_identity(&Fragment::new("b", ""), 3), "temp-3");
/// ```
#[must_use]
pub fn resolve_identity(fragment: &Fragment, index: usize) -> String {
    fragment
        .id
        .map_or_else(|| format!("{TEMP_ID_PREFIX}{index}"), |id| id.to_string())
}

/// Returns true if `identity` is a positional fallback.
#[must_use]
pub fn is_temporary(identity: &str) -> bool {
    identity.starts_with(TEMP_ID_PREFIX)
}
