//! CLI command implementations.
//!
//! Each submodule implements one `fragmind` command. Commands write to any
//! [`std::io::Write`] so they can be exercised without a terminal.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `graph` | Build the fragment graph and print it |
//! | `stats` | Print fragment, connection and tag counts |
//! | `context` | Print the preamble and tags a session would send |
//! | `chat` | Send one message with selected fragments as context |
//! | `config` | Show the resolved configuration |
//!
//! # Example Usage
//!
//! ```bash
//! # Summarize the graph of the stored fragments
//! fragmind graph
//!
//! # Graph of an exported list as JSON, with reproducible layout
//! fragmind graph --input fragments.json --format json --seed 7
//!
//! # Ask a question with fragments 1 and 3 in context, no network
//! fragmind chat --ids 1,3 --offline --message "How do these relate?"
//! ```

mod chat;
mod config;
mod context;
mod graph;
mod input;

pub use chat::{build_endpoint, run_chat, write_transcript};
pub use config::write_config;
pub use context::{preview_context, write_context};
pub use graph::{GraphOutputFormat, graph_builder, write_graph, write_stats};
pub use input::{load_fragments, parse_fragments, parse_ids, select_fragments};
