//! `POST /GetTodos` — run the extraction loop over a transcript.
//!
//! Errors are reported in the body (`{"Status": 400, "Error": ...}`); the
//! HTTP status is always 200.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use actionstage_core::action::Action;
use actionstage_core::transcript::{Transcript, TranscriptMessage};

use crate::SharedState;

pub const MISSING_FIELDS: &str =
    "Improperly formatted request, attention_indices or messages is not included in JSON payload";
pub const INVALID_CONTENT: &str = "Messages or indices contain invalid content";

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TodosResponse {
    Ok {
        #[serde(rename = "Status")]
        status: u16,
        #[serde(rename = "Todos")]
        todos: Vec<Action>,
    },
    Failed {
        #[serde(rename = "Status")]
        status: u16,
        #[serde(rename = "Error")]
        error: String,
    },
}

impl TodosResponse {
    fn ok(todos: Vec<Action>) -> Self {
        TodosResponse::Ok { status: 200, todos }
    }

    fn failed(error: impl Into<String>) -> Self {
        TodosResponse::Failed {
            status: 400,
            error: error.into(),
        }
    }
}

/// A validated `/GetTodos` request.
#[derive(Debug)]
pub struct TodosRequest {
    pub transcript: Transcript,
    pub attention_indices: Vec<usize>,
}

/// Validate a raw body. The error is the message for the `Error` field.
pub fn parse_request(body: &[u8]) -> Result<TodosRequest, &'static str> {
    let value: Value = serde_json::from_slice(body).map_err(|_| MISSING_FIELDS)?;
    let (Some(indices), Some(messages)) = (value.get("attention_indices"), value.get("messages")) else {
        return Err(MISSING_FIELDS);
    };

    let attention_indices: Vec<usize> = serde_json::from_value(indices.clone()).map_err(|_| INVALID_CONTENT)?;
    let messages: Vec<TranscriptMessage> = serde_json::from_value(messages.clone()).map_err(|_| INVALID_CONTENT)?;
    if attention_indices.is_empty() || attention_indices.iter().any(|&i| i >= messages.len()) {
        return Err(INVALID_CONTENT);
    }

    let session_id = value.get("session_id").and_then(Value::as_str).unwrap_or_default();
    Ok(TodosRequest {
        transcript: Transcript::new(session_id, messages),
        attention_indices,
    })
}

pub async fn get_todos(State(state): State<SharedState>, body: Bytes) -> Json<TodosResponse> {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(message) => {
            warn!(error = message, "Rejected /GetTodos request");
            return Json(TodosResponse::failed(message));
        }
    };

    info!(
        session_id = %request.transcript.session_id,
        messages = request.transcript.len(),
        indices = ?request.attention_indices,
        "Extracting actions"
    );

    let outcome = state
        .extractor
        .run_all(&request.transcript, &request.attention_indices, Utc::now())
        .await;

    if outcome.is_total_failure() {
        let errors: Vec<String> = outcome.failures.into_iter().map(|f| f.error).collect();
        return Json(TodosResponse::failed(errors.join("; ")));
    }
    Json(TodosResponse::ok(outcome.actions))
}
