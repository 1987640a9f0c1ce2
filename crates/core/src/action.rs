//! Action domain types — the unit of staged work.
//!
//! An Action is a side effect the agent *wants* to perform (create a calendar
//! event, send an email, file an issue, post a chat message) that has not
//! happened yet. It lives in a [`ProposalStore`](crate::proposal::ProposalStore)
//! until a human executes or dismisses it.
//!
//! Wire format (flat JSON):
//!
//! ```json
//! { "uuid": "…", "action": "update", "id": "evt_1", "body": { "summary": "…" },
//!   "original": { "id": "evt_1", … }, "status": "pending", "created_at": "…" }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::adapter::CalendarEvent;
use crate::error::StoreError;

/// Unique identifier of a staged Action. Never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub String);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ActionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of things an Action can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
    SendEmail,
    CreateIssue,
    SendChatMessage,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Create,
        ActionKind::Update,
        ActionKind::Delete,
        ActionKind::SendEmail,
        ActionKind::CreateIssue,
        ActionKind::SendChatMessage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
            ActionKind::SendEmail => "send_email",
            ActionKind::CreateIssue => "create_issue",
            ActionKind::SendChatMessage => "send_chat_message",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Executed,
    Dismissed,
}

/// Draft of an outgoing email. Fields may hold placeholders until reviewed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailDraft {
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// Draft of an issue to file in the tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueDraft {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
}

/// Draft of a chat message. `channel` overrides the configured default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatDraft {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

/// Kind-specific payload, tagged by the `action` field.
///
/// Calendar kinds carry the event resource as free-form JSON; shape checks
/// are the adapter's job at execution time, not at proposal time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionPayload {
    Create {
        #[serde(default)]
        body: serde_json::Value,
    },
    Update {
        id: String,
        #[serde(default)]
        body: serde_json::Value,
    },
    Delete {
        id: String,
    },
    SendEmail {
        #[serde(default)]
        body: EmailDraft,
    },
    #[serde(alias = "create_jira_issue")]
    CreateIssue {
        #[serde(default)]
        body: IssueDraft,
    },
    #[serde(alias = "send_slack_message")]
    SendChatMessage {
        #[serde(default)]
        body: ChatDraft,
    },
}

impl ActionPayload {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionPayload::Create { .. } => ActionKind::Create,
            ActionPayload::Update { .. } => ActionKind::Update,
            ActionPayload::Delete { .. } => ActionKind::Delete,
            ActionPayload::SendEmail { .. } => ActionKind::SendEmail,
            ActionPayload::CreateIssue { .. } => ActionKind::CreateIssue,
            ActionPayload::SendChatMessage { .. } => ActionKind::SendChatMessage,
        }
    }

    /// The external entity an update/delete refers to.
    pub fn target_id(&self) -> Option<&str> {
        match self {
            ActionPayload::Update { id, .. } | ActionPayload::Delete { id } => Some(id),
            _ => None,
        }
    }

    /// One-line human-readable description, used in tool results and logs.
    pub fn summary(&self) -> String {
        fn event_title(body: &serde_json::Value) -> &str {
            body.get("summary").and_then(|s| s.as_str()).unwrap_or("untitled event")
        }

        match self {
            ActionPayload::Create { body } => format!("Create event '{}'", event_title(body)),
            ActionPayload::Update { id, body } => {
                format!("Update event {id} to '{}'", event_title(body))
            }
            ActionPayload::Delete { id } => format!("Delete event {id}"),
            ActionPayload::SendEmail { body } => {
                format!("Email {} about '{}'", body.recipient, body.subject)
            }
            ActionPayload::CreateIssue { body } => format!("File issue '{}'", body.summary),
            ActionPayload::SendChatMessage { body } => format!("Post chat message '{}'", body.message),
        }
    }
}

/// A staged, not-yet-applied side effect.
///
/// `kind` (via the payload tag) and `original` are fixed at creation; only the
/// payload body may be replaced, and only with a payload of the same kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    uuid: ActionId,

    #[serde(flatten)]
    payload: ActionPayload,

    /// State of the external entity when the proposal was made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original: Option<serde_json::Value>,

    status: ActionStatus,

    created_at: DateTime<Utc>,
}

impl Action {
    /// Build a freshly proposed Action with a new id.
    pub fn pending(
        payload: ActionPayload,
        original: Option<serde_json::Value>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            uuid: ActionId::new(),
            payload,
            original,
            status: ActionStatus::Pending,
            created_at,
        }
    }

    pub fn id(&self) -> &ActionId {
        &self.uuid
    }

    pub fn kind(&self) -> ActionKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &ActionPayload {
        &self.payload
    }

    pub fn original(&self) -> Option<&serde_json::Value> {
        self.original.as_ref()
    }

    pub fn status(&self) -> ActionStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == ActionStatus::Pending
    }

    /// Replace the payload wholesale. The kind must not change.
    pub fn replace_payload(&mut self, payload: ActionPayload) -> Result<(), StoreError> {
        if !self.is_pending() {
            return Err(StoreError::NotFound(self.uuid.to_string()));
        }
        if payload.kind() != self.kind() {
            return Err(StoreError::KindMismatch {
                expected: self.kind(),
                found: payload.kind(),
            });
        }
        self.payload = payload;
        Ok(())
    }

    /// Terminal transition taken when the Action leaves the store for dispatch.
    pub fn into_executed(mut self) -> Self {
        self.status = ActionStatus::Executed;
        self
    }

    /// Terminal transition taken on explicit rejection.
    pub fn into_dismissed(mut self) -> Self {
        self.status = ActionStatus::Dismissed;
        self
    }
}

/// The semantic operation implied by comparing an entity's existing and
/// desired states.
#[derive(Debug, Clone, PartialEq)]
pub enum Alternation {
    Create { desired: serde_json::Value },
    Update { id: String, desired: serde_json::Value },
    Delete { id: String },
    NoOp,
}

impl Alternation {
    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            Alternation::Create { .. } => Some(ActionKind::Create),
            Alternation::Update { .. } => Some(ActionKind::Update),
            Alternation::Delete { .. } => Some(ActionKind::Delete),
            Alternation::NoOp => None,
        }
    }

    /// The payload to stage, or `None` for a no-op.
    pub fn into_payload(self) -> Option<ActionPayload> {
        match self {
            Alternation::Create { desired } => Some(ActionPayload::Create { body: desired }),
            Alternation::Update { id, desired } => Some(ActionPayload::Update { id, body: desired }),
            Alternation::Delete { id } => Some(ActionPayload::Delete { id }),
            Alternation::NoOp => None,
        }
    }
}

/// Classify the change from `existing` to `desired`.
///
/// | existing | desired | result |
/// |---|---|---|
/// | absent | present | create |
/// | present | present | update |
/// | present | absent | delete |
/// | absent | absent | no-op |
pub fn define_alternation(
    existing: Option<&CalendarEvent>,
    desired: Option<serde_json::Value>,
) -> Alternation {
    match (existing, desired) {
        (None, Some(desired)) => Alternation::Create { desired },
        (Some(existing), Some(desired)) => Alternation::Update {
            id: existing.id.clone(),
            desired,
        },
        (Some(existing), None) => Alternation::Delete {
            id: existing.id.clone(),
        },
        (None, None) => Alternation::NoOp,
    }
}
