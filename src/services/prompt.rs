//! Prompt construction from a session's context entries.
//!
//! Produces two artifacts: a tag-grouped textual preamble and a
//! deduplicated tag list sent as structured metadata. The user's literal
//! message is never rewritten here; [`PromptBuilder::compose_content`]
//! decides whether the preamble travels with it.
//!
//! # Preamble Layout
//!
//! ```text
//! Related knowledge fragments (grouped by tag):
//!
//! [rust]
//! • Ownership: Each value has one owner
//! • Borrowing: References never outlive data
//!
//! [memory]
//! • Ownership: Each value has one owner
//!
//! ---
//!
//! Please answer the user's question based on the knowledge fragments above:
//! ```

use crate::models::ContextEntry;
use std::collections::{HashMap, HashSet};

/// First line of a tag-grouped preamble.
pub const PREAMBLE_HEADER: &str = "Related knowledge fragments (grouped by tag):";

/// Closing instruction appended to every non-empty preamble.
pub const PREAMBLE_INSTRUCTION: &str =
    "Please answer the user's question based on the knowledge fragments above:";

/// Separator between fragment blocks in the untagged listing.
const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Derived prompt material for one send.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromptContext {
    /// Textual preamble, empty when there is no context.
    pub context_text: String,
    /// Union of all context tags in first-seen order.
    pub tags: Vec<String>,
}

impl PromptContext {
    /// Returns true if there is neither preamble nor tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.context_text.is_empty() && self.tags.is_empty()
    }
}

/// Builds [`PromptContext`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    /// Builds the preamble and tag list for `entries`.
    ///
    /// Entries without tags are left out of the grouped text when any other
    /// entry has tags. When no entry has tags, every entry is listed with
    /// its title, content and priority instead.
    #[must_use]
    pub fn build_context(entries: &[ContextEntry]) -> PromptContext {
        if entries.is_empty() {
            return PromptContext::default();
        }

        let tags = collect_tags(entries);
        let body = if tags.is_empty() {
            untagged_listing(entries)
        } else {
            tag_sections(entries, &tags)
        };

        PromptContext {
            context_text: format!("{body}{BLOCK_SEPARATOR}{PREAMBLE_INSTRUCTION}\n\n"),
            tags,
        }
    }

    /// Returns the outgoing message content.
    ///
    /// With `include_preamble` set and a non-empty preamble, the preamble is
    /// placed before the literal message; otherwise the message is sent as is.
    #[must_use]
    pub fn compose_content(message: &str, context: &PromptContext, include_preamble: bool) -> String {
        if include_preamble && !context.context_text.is_empty() {
            format!("{}{message}", context.context_text)
        } else {
            message.to_string()
        }
    }
}

fn collect_tags(entries: &[ContextEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .flat_map(|e| e.fragment.tags.iter())
        .filter(|tag| seen.insert(tag.as_str()))
        .cloned()
        .collect()
}

fn tag_sections(entries: &[ContextEntry], tags: &[String]) -> String {
    let mut groups: HashMap<&str, Vec<&ContextEntry>> = HashMap::new();
    for entry in entries {
        for tag in entry.fragment.unique_tags() {
            groups.entry(tag).or_default().push(entry);
        }
    }

    let sections: Vec<String> = tags
        .iter()
        .filter_map(|tag| {
            let members = groups.get(tag.as_str())?;
            let lines: String = members
                .iter()
                .map(|entry| format!("\n• {}: {}", entry.fragment.title, entry.fragment.content))
                .collect();
            Some(format!("[{tag}]{lines}"))
        })
        .collect();

    format!("{PREAMBLE_HEADER}\n\n{}", sections.join("\n\n"))
}

fn untagged_listing(entries: &[ContextEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                "Title: {}\nContent: {}\nPriority: {}",
                e.fragment.title, e.fragment.content, e.fragment.priority
            )
        })
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fragment, Point};
    use crate::services::ContextStore;

    fn entries(fragments: Vec<Fragment>) -> Vec<ContextEntry> {
        let mut store = ContextStore::new();
        store.reconcile(&fragments);
        store.entries().to_vec()
    }

    #[test]
    fn test_empty_context_has_no_preamble() {
        let context = PromptBuilder::build_context(&[]);
        assert!(context.is_empty());
        assert_eq!(PromptBuilder::compose_content("hi", &context, true), "hi");
    }

    #[test]
    fn test_groups_by_tag_in_first_seen_order() {
        let context = PromptBuilder::build_context(&entries(vec![
            Fragment::new("Ownership", "one owner").with_id(1).with_tags(["rust", "memory"]),
            Fragment::new("Borrowing", "no dangling").with_id(2).with_tags(["rust"]),
        ]));
        assert_eq!(context.tags, vec!["rust", "memory"]);
        let expected = format!(
            "{PREAMBLE_HEADER}\n\n[rust]\n• Ownership: one owner\n• Borrowing: no dangling\n\n\
             [memory]\n• Ownership: one owner\n\n---\n\n{PREAMBLE_INSTRUCTION}\n\n"
        );
        assert_eq!(context.context_text, expected);
    }

    #[test]
    fn test_untagged_entries_are_omitted_when_others_have_tags() {
        let context = PromptBuilder::build_context(&entries(vec![
            Fragment::new("Tagged", "a").with_id(1).with_tags(["x"]),
            Fragment::new("Loose", "b").with_id(2),
        ]));
        assert!(context.context_text.contains("Tagged"));
        assert!(!context.context_text.contains("Loose"));
        assert_eq!(context.tags, vec!["x"]);
    }

    #[test]
    fn test_all_untagged_falls_back_to_listing() {
        let context = PromptBuilder::build_context(&entries(vec![
            Fragment::new("One", "a").with_id(1),
            Fragment::new("Two", "b").with_id(2),
        ]));
        assert!(context.tags.is_empty());
        assert!(context.context_text.starts_with("Title: One\nContent: a\nPriority: medium"));
        assert!(context.context_text.contains("---\n\nTitle: Two"));
        assert!(context.context_text.ends_with(&format!("{PREAMBLE_INSTRUCTION}\n\n")));
    }

    #[test]
    fn test_duplicate_tags_list_fragment_once_per_group() {
        let context = PromptBuilder::build_context(&entries(vec![
            Fragment::new("Dup", "c").with_id(1).with_tags(["x", "x"]),
        ]));
        assert_eq!(context.context_text.matches("• Dup").count(), 1);
        assert_eq!(context.tags, vec!["x"]);
    }

    #[test]
    fn test_compose_content_respects_flag() {
        let mut store = ContextStore::new();
        store.add(Fragment::new("t", "c").with_id(1).with_tags(["x"]), Point::default());
        let context = PromptBuilder::build_context(store.entries());
        assert_eq!(PromptBuilder::compose_content("why?", &context, false), "why?");
        let combined = PromptBuilder::compose_content("why?", &context, true);
        assert!(combined.starts_with(PREAMBLE_HEADER));
        assert!(combined.ends_with("why?"));
    }
}
