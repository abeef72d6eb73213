//! HTTP chat API client.

use super::{DialogueEndpoint, DialogueRequest, DialogueResponse, EndpointHttpConfig, build_http_client};
use crate::config::EndpointConfig;
use crate::{Error, Result};

/// Blocking client for the chat completion endpoint.
pub struct ChatApiClient {
    /// Endpoint URL.
    url: String,
    /// Bearer token.
    token: Option<String>,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl ChatApiClient {
    /// Default endpoint URL.
    pub const DEFAULT_URL: &'static str = "http://localhost:3000/api/chat";

    /// Creates a client for `url` with default timeouts.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            client: build_http_client(EndpointHttpConfig::default()),
        }
    }

    /// Creates a client from endpoint settings.
    ///
    /// `token` should already have `${VAR}` references expanded.
    #[must_use]
    pub fn from_config(config: &EndpointConfig, token: Option<String>) -> Self {
        Self {
            url: config.url.clone(),
            token,
            client: build_http_client(EndpointHttpConfig::from_config(config)),
        }
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Replaces the HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: reqwest::blocking::Client) -> Self {
        self.client = client;
        self
    }

    /// Endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for ChatApiClient {
    fn default() -> Self {
        Self::new(Self::DEFAULT_URL)
    }
}

impl DialogueEndpoint for ChatApiClient {
    fn name(&self) -> &'static str {
        "chat_api"
    }

    fn send(&self, request: &DialogueRequest) -> Result<DialogueResponse> {
        let mut builder = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(request);
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let response = builder.send().map_err(|e| Error::OperationFailed {
            operation: "dialogue_request".to_string(),
            cause: e.to_string(),
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::OperationFailed {
                operation: "dialogue_request".to_string(),
                cause: format!("API returned status: {status} - {body}"),
            });
        }

        response.json().map_err(|e| Error::OperationFailed {
            operation: "dialogue_response".to_string(),
            cause: e.to_string(),
        })
    }
}
