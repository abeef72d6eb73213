//! Context session store.
//!
//! Holds the fragments attached to one dialogue session. Every entry is
//! keyed by the fragment's resolved identity and the store never holds two
//! entries with the same key.
//!
//! Saved fragments are keyed by their numeric id. Unsaved fragments have no
//! stable id, so they are matched by value: the store issues their
//! `temp-<n>` keys itself (never reusing one) and [`ContextStore::reconcile`]
//! re-keys them to their position in the list it is given.

use super::identity::{TEMP_ID_PREFIX, is_temporary, resolve_identity};
use crate::models::{ContextEntry, Fragment, Point};
use chrono::{DateTime, Duration, Utc};

/// Offset between cascaded default positions of new entries.
const CASCADE_STEP: f64 = 20.0;

/// Changes applied by [`ContextStore::reconcile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    /// Entries inserted for fragments new to the store.
    pub added: usize,
    /// Entries dropped because the external list no longer holds them.
    pub removed: usize,
}

impl ReconcileReport {
    /// Returns true if reconciliation changed nothing.
    #[must_use]
    pub const fn is_unchanged(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Ordered, identity-unique set of [`ContextEntry`] values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextStore {
    entries: Vec<ContextEntry>,
    last_added_at: Option<DateTime<Utc>>,
    next_temp: usize,
}

impl ContextStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            last_added_at: None,
            next_temp: 0,
        }
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if an entry with `identity` exists.
    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.entries.iter().any(|e| e.identity == identity)
    }

    /// Identity of the entry holding `fragment`, if any.
    ///
    /// Saved fragments are looked up by id, unsaved ones by value.
    #[must_use]
    pub fn identity_of(&self, fragment: &Fragment) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| holds(e, fragment))
            .map(|e| e.identity.as_str())
    }

    /// Clones the attached fragments in insertion order.
    #[must_use]
    pub fn fragments(&self) -> Vec<Fragment> {
        self.entries.iter().map(|e| e.fragment.clone()).collect()
    }

    /// Default position for the next entry, cascading diagonally.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn next_position(&self) -> Point {
        let offset = self.entries.len() as f64 * CASCADE_STEP;
        Point::new(offset, offset)
    }

    /// Adds `fragment` at `position`.
    ///
    /// Saved fragments are keyed by id. Unsaved fragments get a fresh
    /// `temp-<n>` key unless an equal unsaved fragment is already present.
    /// Returns false (and changes nothing) for a duplicate.
    pub fn add(&mut self, fragment: Fragment, position: Point) -> bool {
        match fragment.id {
            Some(id) => self.add_resolved(id.to_string(), fragment, position),
            None => {
                if self.identity_of(&fragment).is_some() {
                    tracing::debug!(title = %fragment.title, "Unsaved fragment already in context");
                    return false;
                }
                let identity = self.fresh_temp_identity();
                self.push(identity, fragment, position);
                true
            },
        }
    }

    /// Adds `fragment` under an identity resolved by the caller.
    ///
    /// Used when the identity comes from another list, such as a graph node
    /// carried by a drag payload. A positional identity is only a hint: an
    /// equal unsaved fragment already present makes this a duplicate, and a
    /// hint held by a different fragment is replaced with a fresh key.
    pub fn add_resolved(&mut self, identity: String, fragment: Fragment, position: Point) -> bool {
        if !is_temporary(&identity) {
            if self.contains(&identity) {
                tracing::debug!(identity = %identity, "Fragment already in context");
                return false;
            }
            self.push(identity, fragment, position);
            return true;
        }

        if let Some(existing) = self.identity_of(&fragment) {
            tracing::debug!(identity = %existing, "Unsaved fragment already in context");
            return false;
        }
        let identity = if self.contains(&identity) {
            self.fresh_temp_identity()
        } else {
            identity
        };
        self.push(identity, fragment, position);
        true
    }

    /// Removes the entry with `identity`. Missing entries are not an error.
    pub fn remove(&mut self, identity: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.identity != identity);
        before != self.entries.len()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Synchronizes the store with an authoritative fragment list.
    ///
    /// Afterwards the store holds exactly the list's fragments. Entries that
    /// match a list item keep their position and timestamp and take that
    /// item's identity; the rest are dropped. Fragments new to the store are
    /// appended in list order. Calling this twice with the same list changes
    /// nothing the second time.
    pub fn reconcile(&mut self, external: &[Fragment]) -> ReconcileReport {
        let resolved: Vec<String> = external
            .iter()
            .enumerate()
            .map(|(index, fragment)| resolve_identity(fragment, index))
            .collect();
        let mut claimed = vec![false; external.len()];

        let before = self.entries.len();
        let mut kept = Vec::with_capacity(before);
        for mut entry in std::mem::take(&mut self.entries) {
            let slot = external
                .iter()
                .enumerate()
                .position(|(index, fragment)| !claimed[index] && holds(&entry, fragment));
            let Some(index) = slot else {
                continue;
            };
            claimed[index] = true;
            entry.identity.clone_from(&resolved[index]);
            entry.fragment.clone_from(&external[index]);
            kept.push(entry);
        }
        let removed = before - kept.len();
        self.entries = kept;

        let base = Utc::now();
        let mut added = 0;
        for (index, fragment) in external.iter().enumerate() {
            // Repeated saved ids in the list collapse into one entry.
            if claimed[index] || self.contains(&resolved[index]) {
                continue;
            }
            let position = self.next_position();
            let added_at = self.next_timestamp(base);
            self.entries.push(ContextEntry {
                identity: resolved[index].clone(),
                fragment: fragment.clone(),
                added_at,
                position,
            });
            added += 1;
        }

        let report = ReconcileReport { added, removed };
        if !report.is_unchanged() {
            tracing::debug!(
                added = report.added,
                removed = report.removed,
                size = self.entries.len(),
                "Reconciled context"
            );
        }
        report
    }

    fn push(&mut self, identity: String, fragment: Fragment, position: Point) {
        let added_at = self.next_timestamp(Utc::now());
        self.entries.push(ContextEntry {
            identity,
            fragment,
            added_at,
            position,
        });
    }

    /// Issues a `temp-<n>` key no entry holds; `n` only ever grows.
    fn fresh_temp_identity(&mut self) -> String {
        loop {
            let identity = format!("{TEMP_ID_PREFIX}{}", self.next_temp);
            self.next_temp += 1;
            if !self.contains(&identity) {
                return identity;
            }
        }
    }

    /// Returns a timestamp strictly later than every earlier one.
    fn next_timestamp(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let stamp = match self.last_added_at {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        };
        self.last_added_at = Some(stamp);
        stamp
    }
}

/// Whether `entry` stands for `fragment`: same id when saved, same value when not.
fn holds(entry: &ContextEntry, fragment: &Fragment) -> bool {
    if is_temporary(&entry.identity) {
        fragment.id.is_none() && entry.fragment == *fragment
    } else {
        fragment.id.is_some_and(|id| entry.identity == id.to_string())
    }
}
