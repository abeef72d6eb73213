//! Dialogue endpoint abstraction.
//!
//! The orchestrator talks to the language model through the
//! [`DialogueEndpoint`] trait. Implementations:
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`ChatApiClient`] | Blocking HTTP client for the chat API |
//! | [`MockEndpoint`] | Canned offline replies and scripted failures |
//! | [`ResilientEndpoint`] | Retry and circuit-breaker wrapper around any endpoint |
//!
//! # Wire Format
//!
//! Request (camelCase JSON):
//!
//! ```json
//! {"chatId": "…", "content": "…", "stream": false, "detail": false,
//!  "responseChatItemId": "response_…", "variables": {"tags": ["rust"]}}
//! ```
//!
//! Response:
//!
//! ```json
//! {"success": true, "data": {"choices": [{"message": {"content": "…"}}]}}
//! ```

mod chat_api;
mod mock;
mod resilience;

pub use chat_api::ChatApiClient;
pub use mock::{MockEndpoint, MockReply};
pub use resilience::{EndpointResilienceConfig, ResilientEndpoint};

use crate::Result;
use crate::config::EndpointConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Trait for dialogue endpoints.
///
/// Calls block; async callers go through
/// [`PendingSend::resolve_async`](crate::services::PendingSend::resolve_async).
pub trait DialogueEndpoint: Send + Sync {
    /// The endpoint name, used as a metric label.
    fn name(&self) -> &'static str;

    /// Sends one request and returns the decoded response.
    ///
    /// A response with `success = false` is returned as `Ok`; only
    /// transport and decoding problems are errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is unreachable or its body cannot
    /// be decoded.
    fn send(&self, request: &DialogueRequest) -> Result<DialogueResponse>;
}

impl<T: DialogueEndpoint + ?Sized> DialogueEndpoint for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn send(&self, request: &DialogueRequest) -> Result<DialogueResponse> {
        (**self).send(request)
    }
}

impl<T: DialogueEndpoint + ?Sized> DialogueEndpoint for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn send(&self, request: &DialogueRequest) -> Result<DialogueResponse> {
        (**self).send(request)
    }
}

/// Structured metadata sent alongside the message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DialogueVariables {
    /// Deduplicated context tags in first-seen order.
    pub tags: Vec<String>,
}

/// Outgoing chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueRequest {
    /// Conversation id (the session id).
    pub chat_id: String,
    /// Message content.
    pub content: String,
    /// Streaming is never requested.
    pub stream: bool,
    /// Detailed responses are never requested.
    pub detail: bool,
    /// Id the server assigns to its reply.
    pub response_chat_item_id: String,
    /// Structured metadata.
    pub variables: DialogueVariables,
    /// Number of context fragments behind this request; not sent.
    #[serde(skip)]
    pub context_size: usize,
}

impl DialogueRequest {
    /// Creates a non-streaming request.
    #[must_use]
    pub fn new(chat_id: impl Into<String>, content: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            content: content.into(),
            stream: false,
            detail: false,
            response_chat_item_id: format!("response_{}", uuid::Uuid::new_v4().simple()),
            variables: DialogueVariables { tags },
            context_size: 0,
        }
    }

    /// Records how many context fragments the request was built from.
    #[must_use]
    pub const fn with_context_size(mut self, context_size: usize) -> Self {
        self.context_size = context_size;
        self
    }
}

/// Message inside a response choice.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChoiceMessage {
    /// Reply text.
    #[serde(default)]
    pub content: String,
}

/// One response choice.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DialogueChoice {
    /// The reply.
    #[serde(default)]
    pub message: ChoiceMessage,
}

/// Response payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DialogueData {
    /// Reply candidates; only the first is used.
    #[serde(default)]
    pub choices: Vec<DialogueChoice>,
}

/// Decoded chat response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DialogueResponse {
    /// Whether the server handled the request.
    #[serde(default)]
    pub success: bool,
    /// Payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DialogueData>,
    /// Server error description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DialogueResponse {
    /// Successful response carrying `content` as its only choice.
    #[must_use]
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(DialogueData {
                choices: vec![DialogueChoice {
                    message: ChoiceMessage {
                        content: content.into(),
                    },
                }],
            }),
            error: None,
        }
    }

    /// Failed response with an error description.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Returns the reply text when the response is usable.
    ///
    /// `None` for `success = false`, a missing or empty choice list, or a
    /// blank first choice.
    #[must_use]
    pub fn reply(&self) -> Option<&str> {
        if !self.success {
            return None;
        }
        self.data
            .as_ref()?
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .filter(|content| !content.trim().is_empty())
    }
}

/// HTTP client configuration for dialogue endpoints.
#[derive(Debug, Clone, Copy)]
pub struct EndpointHttpConfig {
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for EndpointHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            connect_timeout_ms: 3_000,
        }
    }
}

impl EndpointHttpConfig {
    /// Loads HTTP configuration from endpoint settings.
    #[must_use]
    pub const fn from_config(config: &EndpointConfig) -> Self {
        Self {
            timeout_ms: config.timeout_ms,
            connect_timeout_ms: config.connect_timeout_ms,
        }
    }
}

/// Builds a blocking HTTP client with configured timeouts.
#[must_use]
pub fn build_http_client(config: EndpointHttpConfig) -> reqwest::blocking::Client {
    let mut builder = reqwest::blocking::Client::builder();
    if config.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(config.timeout_ms));
    }
    if config.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build dialogue HTTP client: {err}");
        reqwest::blocking::Client::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_camel_case() {
        let request = DialogueRequest::new("chat-1", "hello", vec!["rust".to_string()])
            .with_context_size(2);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["chatId"], "chat-1");
        assert_eq!(json["content"], "hello");
        assert_eq!(json["stream"], false);
        assert_eq!(json["detail"], false);
        assert_eq!(json["variables"]["tags"][0], "rust");
        assert!(
            json["responseChatItemId"]
                .as_str()
                .unwrap()
                .starts_with("response_")
        );
        assert!(json.get("contextSize").is_none());
    }

    #[test]
    fn test_reply_from_success() {
        let json = r#"{"success": true, "data": {"choices": [{"message": {"content": "Hi"}}]}}"#;
        let response: DialogueResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.reply(), Some("Hi"));
    }

    #[test]
    fn test_reply_absent_for_unusable_responses() {
        for json in [
            r#"{"success": false, "error": "quota"}"#,
            r#"{"success": true}"#,
            r#"{"success": true, "data": {"choices": []}}"#,
            r#"{"success": true, "data": {"choices": [{"message": {"content": "  "}}]}}"#,
            r#"{"success": true, "data": {"choices": [{}]}}"#,
            "{}",
        ] {
            let response: DialogueResponse = serde_json::from_str(json).unwrap();
            assert_eq!(response.reply(), None, "{json}");
        }
    }

    #[test]
    fn test_http_config_from_endpoint_config() {
        let config = EndpointConfig {
            timeout_ms: 5,
            connect_timeout_ms: 0,
            ..EndpointConfig::default()
        };
        let http = EndpointHttpConfig::from_config(&config);
        assert_eq!(http.timeout_ms, 5);
        assert_eq!(http.connect_timeout_ms, 0);
    }
}
