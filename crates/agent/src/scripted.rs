//! A model client that replays a fixed script.
//!
//! Drives the loop deterministically in tests.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use actionstage_core::error::ProviderError;
use actionstage_core::message::{Message, MessageToolCall};
use actionstage_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Replays queued responses in order. Once the queue is empty the
/// `fallback` response is repeated; without one, calls fail.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    fallback: Option<ProviderResponse>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(Ok).collect()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call with the same response.
    pub fn repeating(response: ProviderResponse) -> Self {
        Self {
            fallback: Some(response),
            ..Self::new(Vec::new())
        }
    }

    /// A provider that only ever answers with text.
    pub fn text_only(text: &str) -> Self {
        Self::repeating(text_response(text))
    }

    /// Queue a failure after the responses queued so far.
    pub fn then_fail(self, error: ProviderError) -> Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        lock(&self.requests).push(request);

        if let Some(next) = lock(&self.script).pop_front() {
            return next;
        }
        self.fallback
            .clone()
            .ok_or_else(|| ProviderError::MalformedResponse("script exhausted".into()))
    }
}

fn usage() -> Option<Usage> {
    Some(Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    })
}

/// A response with text and no tool calls.
pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: usage(),
        model: "scripted-model".into(),
    }
}

/// A response requesting the given tool calls.
pub fn tool_call_response(tool_calls: Vec<MessageToolCall>) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_with_calls("", tool_calls),
        usage: usage(),
        model: "scripted-model".into(),
    }
}

pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}
