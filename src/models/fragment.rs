//! Fragment types and identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Persisted numeric identifier of a fragment.
///
/// Assigned by the fragment store on insert. Fragments that have not been
/// saved yet carry no id at all rather than a sentinel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentId(u64);

impl FragmentId {
    /// Creates a fragment ID from its numeric value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for FragmentId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Fragment priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Medium priority.
    #[default]
    Medium,
    /// High priority.
    High,
}

impl Priority {
    /// Returns the priority as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fragment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentStatus {
    /// Work in progress.
    Draft,
    /// Live fragment.
    #[default]
    Active,
    /// Kept for reference only.
    Archived,
}

impl FragmentStatus {
    /// Returns the status as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for FragmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived statistics attached to a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentMetadata {
    /// Word count of the content.
    pub word_count: u32,
    /// Estimated reading time in minutes.
    pub reading_time: u32,
    /// Where the content came from (URL or free text).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Attachment URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,
}

/// A user-authored note with title, content, and tags.
///
/// Fragments are owned by the fragment store; the graph and dialogue
/// components only read them. The JSON form uses camelCase field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    /// Persisted identifier, absent for unsaved fragments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FragmentId>,
    /// Title.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub content: String,
    /// Tag names. Duplicates are tolerated and treated as a set for matching.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Category name (legacy association).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Category id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
    /// Priority.
    #[serde(default)]
    pub priority: Priority,
    /// Status.
    #[serde(default)]
    pub status: FragmentStatus,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Last time the fragment was opened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed_at: Option<DateTime<Utc>>,
    /// Derived statistics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FragmentMetadata>,
}

impl Fragment {
    /// Creates an unsaved fragment with default priority and status.
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            category: None,
            category_id: None,
            priority: Priority::default(),
            status: FragmentStatus::default(),
            created_at: None,
            updated_at: None,
            last_accessed_at: None,
            metadata: None,
        }
    }

    /// Sets the persisted id.
    #[must_use]
    pub const fn with_id(mut self, id: u64) -> Self {
        self.id = Some(FragmentId::new(id));
        self
    }

    /// Replaces the tag list.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the category name.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Returns the distinct tags in first-seen order.
    #[must_use]
    pub fn unique_tags(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.tags
            .iter()
            .map(String::as_str)
            .filter(|tag| seen.insert(*tag))
            .collect()
    }

    /// Counts the distinct tags this fragment shares with `other`.
    #[must_use]
    pub fn shared_tag_count(&self, other: &Self) -> usize {
        let theirs: HashSet<&str> = other.tags.iter().map(String::as_str).collect();
        self.unique_tags()
            .into_iter()
            .filter(|tag| theirs.contains(tag))
            .count()
    }

    /// Returns true if the fragment carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_tags_preserves_first_seen_order() {
        let fragment = Fragment::new("t", "c").with_tags(["b", "a", "b", "c", "a"]);
        assert_eq!(fragment.unique_tags(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_shared_tag_count_treats_tags_as_set() {
        let a = Fragment::new("a", "").with_tags(["x", "y", "x"]);
        let b = Fragment::new("b", "").with_tags(["y", "x", "y", "z"]);
        assert_eq!(a.shared_tag_count(&b), 2);
        assert_eq!(b.shared_tag_count(&a), 2);
    }

    #[test]
    fn test_deserialize_minimal_payload() {
        let json = r#"{"title": "Hooks", "tags": ["react"]}"#;
        let fragment: Fragment = serde_json::from_str(json).unwrap();
        assert_eq!(fragment.id, None);
        assert_eq!(fragment.content, "");
        assert_eq!(fragment.priority, Priority::Medium);
        assert_eq!(fragment.status, FragmentStatus::Active);
    }

    #[test]
    fn test_deserialize_camel_case_fields() {
        let json = r#"{
            "id": 4,
            "title": "CSS Grid",
            "content": "two-dimensional layout",
            "tags": ["css", "layout"],
            "categoryId": 2,
            "priority": "high",
            "status": "archived",
            "createdAt": "2024-01-05T09:20:00Z",
            "metadata": {"wordCount": 140, "readingTime": 1}
        }"#;
        let fragment: Fragment = serde_json::from_str(json).unwrap();
        assert_eq!(fragment.id, Some(FragmentId::new(4)));
        assert_eq!(fragment.category_id, Some(2));
        assert_eq!(fragment.priority, Priority::High);
        assert_eq!(fragment.status, FragmentStatus::Archived);
        assert!(fragment.created_at.is_some());
        assert_eq!(fragment.metadata.map(|m| m.word_count), Some(140));
    }

    #[test]
    fn test_serialize_omits_missing_id() {
        let json = serde_json::to_string(&Fragment::new("t", "c")).unwrap();
        assert!(!json.contains("\"id\""));
        let json = serde_json::to_string(&Fragment::new("t", "c").with_id(9)).unwrap();
        assert!(json.contains("\"id\":9"));
    }
}
