//! Context preview command.

use crate::models::Fragment;
use crate::services::{ContextStore, PromptBuilder, PromptContext};
use anyhow::Result;
use std::io::Write;

/// Builds the prompt context a session seeded with `fragments` would send.
#[must_use]
pub fn preview_context(fragments: &[Fragment]) -> PromptContext {
    let mut store = ContextStore::new();
    store.reconcile(fragments);
    PromptBuilder::build_context(store.entries())
}

/// Writes the preamble followed by the tag list.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_context<W: Write>(writer: &mut W, context: &PromptContext) -> Result<()> {
    if context.is_empty() {
        writeln!(writer, "(no fragments in context)")?;
        return Ok(());
    }
    write!(writer, "{}", context.context_text)?;
    writeln!(writer, "Tags: {}", context.tags.join(", "))?;
    Ok(())
}
