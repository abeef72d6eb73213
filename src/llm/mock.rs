//! Offline endpoint with canned replies.

use super::{DialogueEndpoint, DialogueRequest, DialogueResponse};
use crate::{Error, Result};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One scripted outcome for [`MockEndpoint`].
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Generate the canned reply.
    Canned,
    /// Return this response.
    Respond(DialogueResponse),
    /// Fail with a transport error carrying this cause.
    Fail(String),
}

/// Endpoint that answers locally.
///
/// Scripted replies are consumed first; afterwards every call gets a canned
/// reply that quotes the message and mentions the context size. All
/// requests are recorded.
#[derive(Debug, Default)]
pub struct MockEndpoint {
    script: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<DialogueRequest>>,
    fail_all: Option<String>,
    delay: Option<Duration>,
}

impl MockEndpoint {
    /// Creates an endpoint that always returns canned replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an endpoint that plays `replies` in order, then canned ones.
    #[must_use]
    pub fn scripted(replies: impl IntoIterator<Item = MockReply>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Creates an endpoint whose every call fails.
    #[must_use]
    pub fn failing(cause: impl Into<String>) -> Self {
        Self {
            fail_all: Some(cause.into()),
            ..Self::default()
        }
    }

    /// Sleeps for `delay` before answering.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<DialogueRequest> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Number of calls received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    fn next_reply(&self) -> MockReply {
        self.script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front()
            .unwrap_or(MockReply::Canned)
    }
}

/// Builds the canned reply, rotating through a few phrasings.
fn canned_reply(request: &DialogueRequest, call_index: usize) -> String {
    let message = &request.content;
    let context = if request.context_size > 0 {
        format!(" Based on the {} fragments you provided,", request.context_size)
    } else {
        String::new()
    };
    match call_index % 4 {
        0 => format!("I understand your question: \"{message}\".{context} let me explain in detail..."),
        1 => format!(
            "About \"{message}\",{context} I can look at it from a few angles:\n1. First...\n2. Then...\n3. Finally..."
        ),
        2 => format!("\"{message}\" is an important topic.{context} I would suggest..."),
        _ => format!("On the question \"{message}\",{context} I think it can be understood like this..."),
    }
}

impl DialogueEndpoint for MockEndpoint {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn send(&self, request: &DialogueRequest) -> Result<DialogueResponse> {
        let call_index = {
            let mut requests = self
                .requests
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            requests.push(request.clone());
            requests.len() - 1
        };

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if let Some(cause) = &self.fail_all {
            return Err(Error::OperationFailed {
                operation: "dialogue_request".to_string(),
                cause: cause.clone(),
            });
        }

        match self.next_reply() {
            MockReply::Canned => Ok(DialogueResponse::success(canned_reply(request, call_index))),
            MockReply::Respond(response) => Ok(response),
            MockReply::Fail(cause) => Err(Error::OperationFailed {
                operation: "dialogue_request".to_string(),
                cause,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canned_reply_mentions_context_size() {
        let endpoint = MockEndpoint::new();
        let request = DialogueRequest::new("c", "What is a borrow?", Vec::new()).with_context_size(3);
        let response = endpoint.send(&request).unwrap();
        let reply = response.reply().unwrap();
        assert!(reply.contains("What is a borrow?"));
        assert!(reply.contains("3 fragments"));
        assert_eq!(endpoint.call_count(), 1);
    }

    #[test]
    fn test_script_then_canned() {
        let endpoint = MockEndpoint::scripted([
            MockReply::Fail("boom".to_string()),
            MockReply::Respond(DialogueResponse::failure("quota")),
        ]);
        let request = DialogueRequest::new("c", "hi", Vec::new());
        assert!(endpoint.send(&request).is_err());
        assert_eq!(endpoint.send(&request).unwrap().reply(), None);
        assert!(endpoint.send(&request).unwrap().reply().is_some());
        assert_eq!(endpoint.requests().len(), 3);
    }

    #[test]
    fn test_failing_endpoint() {
        let endpoint = MockEndpoint::failing("connection refused");
        let request = DialogueRequest::new("c", "hi", Vec::new());
        let err = endpoint.send(&request).unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
