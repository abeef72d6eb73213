//! One-shot chat command.

use crate::config::FragmindConfig;
use crate::llm::{
    ChatApiClient, DialogueEndpoint, EndpointResilienceConfig, MockEndpoint, ResilientEndpoint,
};
use crate::models::{ChatSession, Fragment};
use crate::services::DialogueOrchestrator;
use anyhow::Result;
use std::io::Write;

/// Builds the dialogue endpoint described by the configuration.
///
/// `offline` selects the canned [`MockEndpoint`]. The HTTP client is
/// blocking, so call this outside async worker threads.
#[must_use]
pub fn build_endpoint(config: &FragmindConfig, offline: bool) -> Box<dyn DialogueEndpoint> {
    if offline {
        return Box::new(MockEndpoint::new());
    }
    let client = ChatApiClient::from_config(&config.endpoint, config.resolved_token());
    Box::new(ResilientEndpoint::new(
        client,
        EndpointResilienceConfig::from_config(&config.endpoint),
    ))
}

/// Opens a panel session over `fragments`, sends `message` and returns the session.
///
/// # Errors
///
/// Returns an error if the message is blank.
pub fn run_chat(
    config: &FragmindConfig,
    endpoint: &dyn DialogueEndpoint,
    fragments: &[Fragment],
    message: &str,
) -> Result<ChatSession> {
    let mut dialogue = DialogueOrchestrator::from_config(config);
    dialogue.open(fragments, crate::services::DialogueMode::Panel);
    dialogue.send_message(endpoint, message)?;
    let session = dialogue
        .session()
        .cloned()
        .ok_or(crate::Error::NoActiveSession)?;
    dialogue.close();
    Ok(session)
}

/// Writes a session transcript.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_transcript<W: Write>(writer: &mut W, session: &ChatSession) -> Result<()> {
    writeln!(writer, "{}", session.title)?;
    writeln!(writer, "Context: {} fragments", session.context.len())?;
    for message in &session.transcript {
        writeln!(writer)?;
        writeln!(writer, "[{}] {}", message.role, message.content)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_FALLBACK_REPLY;

    fn fragments() -> Vec<Fragment> {
        vec![Fragment::new("Ownership", "one owner").with_id(1).with_tags(["rust"])]
    }

    #[test]
    fn test_offline_chat_prints_transcript() {
        let config = FragmindConfig::default();
        let endpoint = build_endpoint(&config, true);
        let session = run_chat(&config, endpoint.as_ref(), &fragments(), "What is a move?").unwrap();
        assert_eq!(session.transcript.len(), 2);

        let mut out = Vec::new();
        write_transcript(&mut out, &session).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Conversation about Ownership\nContext: 1 fragments\n"));
        assert!(text.contains("[user] What is a move?"));
        assert!(text.contains("[assistant] "));
    }

    #[test]
    fn test_failing_endpoint_yields_fallback() {
        let config = FragmindConfig::default();
        let endpoint = MockEndpoint::failing("connection refused");
        let session = run_chat(&config, &endpoint, &fragments(), "hi").unwrap();
        assert_eq!(session.transcript[1].content, DEFAULT_FALLBACK_REPLY);
    }

    #[test]
    fn test_blank_message_is_rejected() {
        let config = FragmindConfig::default();
        let endpoint = MockEndpoint::new();
        assert!(run_chat(&config, &endpoint, &fragments(), "   ").is_err());
        assert_eq!(endpoint.call_count(), 0);
    }
}
