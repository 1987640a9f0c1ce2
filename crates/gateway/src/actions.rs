//! `/actions` — review, edit, dismiss and execute staged Actions.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use actionstage_core::action::{Action, ActionId, ActionPayload};
use actionstage_core::event::DomainEvent;

use crate::SharedState;
use crate::error::ApiError;

fn parse_payload(value: Value) -> Result<ActionPayload, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::bad_request(format!("Invalid action payload: {e}")))
}

/// `POST /actions` — stage a raw payload.
pub async fn propose(State(state): State<SharedState>, body: Bytes) -> Result<(StatusCode, Json<Value>), ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::bad_request("Request body is empty"));
    }
    let value: Value =
        serde_json::from_slice(&body).map_err(|e| ApiError::bad_request(format!("Body is not valid JSON: {e}")))?;
    if value.as_object().is_some_and(|o| o.is_empty()) {
        return Err(ApiError::bad_request("Request body is empty"));
    }
    let payload = parse_payload(value)?;

    let original = state.dispatcher.capabilities().snapshot_for(&payload).await;
    let action = state.store.propose(payload, original).await?;
    info!(action_id = %action.id(), kind = %action.kind(), "Action proposed over HTTP");

    state.event_bus.publish(DomainEvent::ActionProposed {
        action_id: action.id().to_string(),
        kind: action.kind(),
        timestamp: action.created_at(),
    });

    Ok((
        StatusCode::CREATED,
        Json(json!({ "uuid": action.id(), "status": "created" })),
    ))
}

/// `GET /actions`
pub async fn list(State(state): State<SharedState>) -> Result<Json<Vec<Action>>, ApiError> {
    Ok(Json(state.store.list().await?))
}

#[derive(Deserialize)]
struct EditRequest {
    #[serde(default)]
    data: Option<Value>,
}

/// `PUT /actions/{id}` — replace the payload with `{"data": <payload>}`.
pub async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let id = ActionId(id);
    state.store.get(&id).await?;

    let edit: EditRequest = serde_json::from_slice(&body).unwrap_or(EditRequest { data: None });
    let data = edit
        .data
        .filter(|d| !d.is_null())
        .ok_or_else(|| ApiError::bad_request("Missing 'data' in request body"))?;
    let payload = parse_payload(data)?;

    let action = state.store.update_payload(&id, payload).await?;
    info!(action_id = %id, kind = %action.kind(), "Action payload replaced");

    state.event_bus.publish(DomainEvent::ActionUpdated {
        action_id: id.to_string(),
        kind: action.kind(),
        timestamp: Utc::now(),
    });

    Ok(Json(json!({ "status": "updated" })))
}

/// `DELETE /actions/{id}` — dismiss.
pub async fn dismiss(State(state): State<SharedState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let action = state.store.remove(&ActionId(id)).await?;
    info!(action_id = %action.id(), kind = %action.kind(), "Action dismissed");

    state.event_bus.publish(DomainEvent::ActionDismissed {
        action_id: action.id().to_string(),
        kind: action.kind(),
        timestamp: Utc::now(),
    });

    Ok(Json(json!({ "status": "deleted" })))
}

/// `POST /actions/{id}/execute` — take the Action and run it.
pub async fn execute(State(state): State<SharedState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let id = ActionId(id);

    match state.dispatcher.execute_by_id(state.store.as_ref(), &id).await {
        Ok((action, result)) => {
            state.event_bus.publish(DomainEvent::ActionExecuted {
                action_id: id.to_string(),
                kind: action.kind(),
                success: true,
                timestamp: Utc::now(),
            });
            Ok(Json(json!({ "status": "success", "result": result })))
        }
        Err(actionstage_adapters::DispatchError::Execution(err)) => {
            state.event_bus.publish(DomainEvent::ActionExecuted {
                action_id: id.to_string(),
                kind: err.kind,
                success: false,
                timestamp: Utc::now(),
            });
            Err(actionstage_adapters::DispatchError::Execution(err).into())
        }
        Err(err) => Err(err.into()),
    }
}
