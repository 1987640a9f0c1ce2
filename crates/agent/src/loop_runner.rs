//! The bounded extraction loop.
//!
//! One run per attention index, each with a fresh conversation:
//!
//! ```text
//! AwaitingModel ──(tool calls)──▶ ToolCallsPending ──(under cap)──▶ ExecutingTools
//!       ▲                               │                                 │
//!       └───────────────────────────────┼─────────────────────────────────┘
//!                    (no tool calls / cap reached)
//!                               ▼
//!                              Done
//! ```
//!
//! A turn is one model round-trip. Tool calls in a batch run sequentially in
//! the order received, and their results go back to the model as one batch.

use std::sync::Arc;
use std::time::Instant;

use actionstage_config::AppConfig;
use actionstage_core::action::Action;
use actionstage_core::error::ProviderError;
use actionstage_core::event::{DomainEvent, EventBus};
use actionstage_core::message::{Conversation, Message, MessageToolCall};
use actionstage_core::provider::{Provider, ProviderRequest, ToolDefinition};
use actionstage_core::tool::{ToolCall, ToolClass, ToolRegistry};
use actionstage_core::transcript::Transcript;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::prompt;

pub const DEFAULT_MAX_TURNS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("attention index {index} is out of range for a transcript of {len} messages")]
    IndexOutOfRange { index: usize, len: usize },

    /// The model call failed. Actions staged earlier in the run stay in the
    /// store and are carried here.
    #[error("model call failed at attention index {attention_index}: {source}")]
    Model {
        attention_index: usize,
        #[source]
        source: ProviderError,
        staged: Vec<Action>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model answered without tool calls.
    Completed,
    /// The turn cap was reached with tool calls still outstanding.
    TurnCapReached,
}

/// Result of one attention index's run.
#[derive(Debug, Clone)]
pub struct IndexRun {
    pub attention_index: usize,
    /// Actions staged during this run, in staging order.
    pub actions: Vec<Action>,
    pub turns: usize,
    pub stop: StopReason,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexFailure {
    pub attention_index: usize,
    pub error: String,
}

/// Concatenated result of every attention index.
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    pub actions: Vec<Action>,
    pub completed: usize,
    pub failures: Vec<IndexFailure>,
}

impl ExtractionOutcome {
    /// True when nothing completed and nothing was staged.
    pub fn is_total_failure(&self) -> bool {
        self.completed == 0 && self.actions.is_empty() && !self.failures.is_empty()
    }
}

enum LoopState {
    AwaitingModel,
    ToolCallsPending(Vec<MessageToolCall>),
    ExecutingTools(Vec<MessageToolCall>),
    Done(StopReason),
}

pub struct ExtractionLoop {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    event_bus: Arc<EventBus>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_turns: usize,
    time_zone: String,
}

impl ExtractionLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            tools,
            event_bus,
            model: model.into(),
            temperature: 0.2,
            max_tokens: None,
            max_turns: DEFAULT_MAX_TURNS,
            time_zone: "UTC".into(),
        }
    }

    /// Model settings, turn cap and time zone from config.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self::new(provider, config.default_model.clone(), tools, event_bus)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_max_turns(config.agent.max_turns)
            .with_time_zone(config.agent.time_zone.clone())
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Hard ceiling on model round-trips per attention index (minimum 1).
    pub fn with_max_turns(mut self, max: usize) -> Self {
        self.max_turns = max.max(1);
        self
    }

    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = time_zone.into();
        self
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Run every index independently, in the order given.
    pub async fn run_all(
        &self,
        transcript: &Transcript,
        attention_indices: &[usize],
        now: DateTime<Utc>,
    ) -> ExtractionOutcome {
        let mut outcome = ExtractionOutcome::default();

        for &index in attention_indices {
            match self.run(transcript, index, now).await {
                Ok(run) => {
                    outcome.completed += 1;
                    outcome.actions.extend(run.actions);
                }
                Err(err) => {
                    warn!(attention_index = index, error = %err, "Extraction run failed");
                    outcome.failures.push(IndexFailure {
                        attention_index: index,
                        error: err.to_string(),
                    });
                    if let ExtractionError::Model { staged, .. } = err {
                        outcome.actions.extend(staged);
                    }
                }
            }
        }

        info!(
            session_id = %transcript.session_id,
            actions = outcome.actions.len(),
            failures = outcome.failures.len(),
            "Extraction finished"
        );
        outcome
    }

    /// Drive one attention index to completion or to the turn cap.
    pub async fn run(
        &self,
        transcript: &Transcript,
        attention_index: usize,
        now: DateTime<Utc>,
    ) -> Result<IndexRun, ExtractionError> {
        let user_prompt = prompt::user_prompt(transcript, attention_index, now, &self.time_zone).ok_or(
            ExtractionError::IndexOutOfRange {
                index: attention_index,
                len: transcript.len(),
            },
        )?;

        let mut conversation = Conversation::seeded(prompt::SYSTEM_PROMPT, user_prompt);

        let definitions = self.tools.definitions();
        let mut staged = Vec::new();
        let mut turns = 0;
        let mut state = LoopState::AwaitingModel;

        let stop = loop {
            state = match state {
                LoopState::AwaitingModel => {
                    turns += 1;
                    debug!(attention_index, turn = turns, "Calling model");

                    match self.call_model(&conversation, &definitions).await {
                        Ok(message) => {
                            let calls = message.tool_calls.clone();
                            conversation.push(message);
                            if calls.is_empty() {
                                LoopState::Done(StopReason::Completed)
                            } else {
                                LoopState::ToolCallsPending(calls)
                            }
                        }
                        Err(source) => {
                            return Err(ExtractionError::Model {
                                attention_index,
                                source,
                                staged,
                            });
                        }
                    }
                }

                LoopState::ToolCallsPending(calls) => {
                    if turns >= self.max_turns {
                        warn!(
                            attention_index,
                            turns,
                            dropped_calls = calls.len(),
                            "Turn cap reached; remaining tool calls not executed"
                        );
                        LoopState::Done(StopReason::TurnCapReached)
                    } else {
                        LoopState::ExecutingTools(calls)
                    }
                }

                LoopState::ExecutingTools(calls) => {
                    for call in &calls {
                        let (content, action) = self.execute_call(call).await;
                        conversation.push(Message::tool_result(&call.id, &call.name, content));
                        staged.extend(action);
                    }
                    LoopState::AwaitingModel
                }

                LoopState::Done(reason) => break reason,
            };
        };

        info!(
            attention_index,
            turns,
            actions = staged.len(),
            stop = ?stop,
            "Extraction run finished"
        );

        Ok(IndexRun {
            attention_index,
            actions: staged,
            turns,
            stop,
        })
    }

    async fn call_model(
        &self,
        conversation: &Conversation,
        definitions: &[ToolDefinition],
    ) -> Result<Message, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: conversation.messages.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: definitions.to_vec(),
        };

        let response = self.provider.complete(request).await?;

        if let Some(usage) = &response.usage {
            self.event_bus.publish(DomainEvent::ResponseGenerated {
                conversation_id: conversation.id.to_string(),
                model: response.model.clone(),
                tokens_used: usage.total_tokens,
                timestamp: Utc::now(),
            });
        }

        Ok(response.message)
    }

    /// Run one tool call. Returns the text fed back to the model and, for a
    /// successful propose tool, the Action it staged.
    ///
    /// Failures never escape; they become an `Error: ...` payload.
    async fn execute_call(&self, call: &MessageToolCall) -> (String, Option<Action>) {
        let start = Instant::now();

        let result = match call.parse_arguments() {
            Ok(arguments) => {
                self.tools
                    .execute(&ToolCall {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        arguments,
                    })
                    .await
            }
            Err(err) => Err(err),
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        self.event_bus.publish(DomainEvent::ToolExecuted {
            tool_name: call.name.clone(),
            success: result.as_ref().is_ok_and(|r| r.success),
            duration_ms,
            timestamp: Utc::now(),
        });

        match result {
            Ok(result) => {
                debug!(tool = %call.name, duration_ms, "Tool call succeeded");
                let action = match self.tools.class_of(&call.name) {
                    Some(ToolClass::Propose) if result.success => staged_action(&call.name, result.data),
                    _ => None,
                };
                (result.output, action)
            }
            Err(err) => {
                warn!(tool = %call.name, error = %err, "Tool call failed");
                (format!("Error: {err}"), None)
            }
        }
    }
}

fn staged_action(tool_name: &str, data: Option<serde_json::Value>) -> Option<Action> {
    let data = data?;
    match serde_json::from_value(data) {
        Ok(action) => Some(action),
        Err(err) => {
            warn!(tool = tool_name, error = %err, "Propose tool returned data that is not an Action");
            None
        }
    }
}
