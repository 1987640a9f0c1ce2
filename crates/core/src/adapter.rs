//! Capability adapter traits — one per external backend.
//!
//! Adapters own no state beyond the remote service itself. The dispatcher
//! calls their write primitives; the read tools call their list/read
//! primitives directly. Implementations: Google Calendar, Gmail, Google
//! People, Jira, Slack (HTTP) and in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::{ChatDraft, EmailDraft, IssueDraft};
use crate::error::AdapterError;

/// A calendar event as returned by the calendar backend.
///
/// Only `id` is interpreted; every other field is carried verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,

    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl CalendarEvent {
    /// An event known only by its id (no fetched state).
    pub fn reference(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: serde_json::Map::new(),
        }
    }

    pub fn summary(&self) -> Option<&str> {
        self.fields.get("summary").and_then(|v| v.as_str())
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Parameters for listing calendar events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventQuery {
    /// Lower bound (inclusive). Defaults to "now" when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_min: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_max: Option<DateTime<Utc>>,

    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Free-text search across event fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

pub fn default_max_results() -> u32 {
    10
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            time_min: None,
            time_max: None,
            max_results: default_max_results(),
            query: None,
        }
    }
}

/// A message header summary from the mailbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSummary {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    /// Saved in the user's address book.
    Contact,
    /// Frequently contacted but not saved.
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub contact_type: ContactType,
}

impl Contact {
    /// Case-insensitive substring match on name or email.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query) || self.email.to_lowercase().contains(&query)
    }
}

#[async_trait]
pub trait Calendar: Send + Sync {
    fn name(&self) -> &str;

    async fn list_events(&self, query: EventQuery) -> Result<Vec<CalendarEvent>, AdapterError>;

    /// Fetch one event; `Ok(None)` when the backend reports it missing.
    async fn get_event(&self, id: &str) -> Result<Option<CalendarEvent>, AdapterError>;

    async fn create_event(&self, body: &serde_json::Value) -> Result<serde_json::Value, AdapterError>;

    /// Patch semantics: only the supplied fields change.
    async fn update_event(
        &self,
        id: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, AdapterError>;

    async fn delete_event(&self, id: &str) -> Result<serde_json::Value, AdapterError>;
}

#[async_trait]
pub trait Mail: Send + Sync {
    fn name(&self) -> &str;

    async fn read_emails(
        &self,
        query: Option<&str>,
        max_results: u32,
    ) -> Result<Vec<EmailSummary>, AdapterError>;

    async fn send_email(&self, draft: &EmailDraft) -> Result<serde_json::Value, AdapterError>;
}

#[async_trait]
pub trait Contacts: Send + Sync {
    fn name(&self) -> &str;

    async fn get_contacts(&self, query: Option<&str>) -> Result<Vec<Contact>, AdapterError>;
}

#[async_trait]
pub trait IssueTracker: Send + Sync {
    fn name(&self) -> &str;

    async fn create_issue(&self, draft: &IssueDraft) -> Result<serde_json::Value, AdapterError>;
}

#[async_trait]
pub trait Chat: Send + Sync {
    fn name(&self) -> &str;

    async fn send_message(&self, draft: &ChatDraft) -> Result<serde_json::Value, AdapterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_event_keeps_unknown_fields() {
        let event: CalendarEvent = serde_json::from_value(serde_json::json!({
            "id": "evt_1",
            "summary": "Standup",
            "start": {"dateTime": "2026-04-01T10:00:00-04:00"}
        }))
        .unwrap();
        assert_eq!(event.id, "evt_1");
        assert_eq!(event.summary(), Some("Standup"));
        assert_eq!(event.to_value()["start"]["dateTime"], "2026-04-01T10:00:00-04:00");
    }

    #[test]
    fn contact_matching_is_case_insensitive() {
        let contact = Contact {
            name: "John Doe".into(),
            email: "jdoe@example.com".into(),
            contact_type: ContactType::Contact,
        };
        assert!(contact.matches("john"));
        assert!(contact.matches("EXAMPLE"));
        assert!(!contact.matches("jane"));
    }

    #[test]
    fn event_query_defaults() {
        let query: EventQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.max_results, 10);
        assert!(query.time_min.is_none());
    }
}
