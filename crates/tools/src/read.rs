//! Read tools. They query a capability and return the data to the model;
//! nothing here touches the ProposalStore.

use std::sync::Arc;

use actionstage_core::adapter::{Calendar, Contacts, EventQuery, Mail, default_max_results};
use actionstage_core::error::{AdapterError, ToolError};
use actionstage_core::tool::{Tool, ToolClass, ToolResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

fn adapter_failure(tool_name: &str, err: AdapterError) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: tool_name.to_string(),
        reason: err.to_string(),
    }
}

fn json_result<T: serde::Serialize>(value: &T) -> ToolResult {
    let data = serde_json::to_value(value).unwrap_or_default();
    ToolResult::ok(String::new(), data.to_string()).with_data(data)
}

fn optional_str<'a>(arguments: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    arguments[key].as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn max_results(arguments: &serde_json::Value) -> u32 {
    arguments["max_results"]
        .as_u64()
        .map(|n| n.clamp(1, 50) as u32)
        .unwrap_or_else(default_max_results)
}

fn parse_bound(arguments: &serde_json::Value, key: &str) -> Result<Option<DateTime<Utc>>, ToolError> {
    optional_str(arguments, key)
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| ToolError::InvalidArguments(format!("'{key}' is not RFC 3339: {e}")))
        })
        .transpose()
}

pub struct ListCalendarEventsTool {
    calendar: Arc<dyn Calendar>,
}

impl ListCalendarEventsTool {
    pub fn new(calendar: Arc<dyn Calendar>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for ListCalendarEventsTool {
    fn name(&self) -> &str {
        "list_calendar_events"
    }

    fn description(&self) -> &str {
        "List upcoming calendar events, ordered by start time. Use this to find the id of an event before updating or deleting it."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "time_min": {
                    "type": "string",
                    "description": "Earliest start time, RFC 3339 (defaults to now)"
                },
                "time_max": {
                    "type": "string",
                    "description": "Latest start time, RFC 3339"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of events to return (default 10)"
                },
                "query": {
                    "type": "string",
                    "description": "Free-text search over event fields"
                }
            }
        })
    }

    fn class(&self) -> ToolClass {
        ToolClass::Read
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = EventQuery {
            time_min: parse_bound(&arguments, "time_min")?,
            time_max: parse_bound(&arguments, "time_max")?,
            max_results: max_results(&arguments),
            query: optional_str(&arguments, "query").map(String::from),
        };

        let events = self
            .calendar
            .list_events(query)
            .await
            .map_err(|e| adapter_failure(self.name(), e))?;
        debug!(count = events.len(), "Listed calendar events");

        Ok(json_result(&events))
    }
}

pub struct ReadEmailsTool {
    mail: Arc<dyn Mail>,
}

impl ReadEmailsTool {
    pub fn new(mail: Arc<dyn Mail>) -> Self {
        Self { mail }
    }
}

#[async_trait]
impl Tool for ReadEmailsTool {
    fn name(&self) -> &str {
        "read_emails"
    }

    fn description(&self) -> &str {
        "Read recent emails from the inbox. Returns id, subject, sender and a snippet for each message."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Mailbox search query, e.g. 'from:jdoe@example.com'"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of emails to return (default 10)"
                }
            }
        })
    }

    fn class(&self) -> ToolClass {
        ToolClass::Read
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let emails = self
            .mail
            .read_emails(optional_str(&arguments, "query"), max_results(&arguments))
            .await
            .map_err(|e| adapter_failure(self.name(), e))?;

        Ok(json_result(&emails))
    }
}

pub struct GetContactsTool {
    contacts: Arc<dyn Contacts>,
}

impl GetContactsTool {
    pub fn new(contacts: Arc<dyn Contacts>) -> Self {
        Self { contacts }
    }
}

#[async_trait]
impl Tool for GetContactsTool {
    fn name(&self) -> &str {
        "get_contacts"
    }

    fn description(&self) -> &str {
        "Look up contacts by name or email. Use this to resolve a person's email address before drafting an email or inviting them."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Case-insensitive substring of a name or email"
                }
            }
        })
    }

    fn class(&self) -> ToolClass {
        ToolClass::Read
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let contacts = self
            .contacts
            .get_contacts(optional_str(&arguments, "query"))
            .await
            .map_err(|e| adapter_failure(self.name(), e))?;

        Ok(json_result(&contacts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actionstage_adapters::memory::{InMemoryCalendar, InMemoryContacts, InMemoryMail};
    use actionstage_core::adapter::{CalendarEvent, Contact, ContactType, EmailSummary};
    use serde_json::json;

    fn event(id: &str, summary: &str, start: &str) -> CalendarEvent {
        serde_json::from_value(json!({"id": id, "summary": summary, "start": {"dateTime": start}})).unwrap()
    }

    #[tokio::test]
    async fn lists_events_as_json() {
        let calendar = Arc::new(InMemoryCalendar::with_events(vec![
            event("evt_1", "Standup", "2026-04-01T09:00:00-04:00"),
            event("evt_2", "Retro", "2026-04-02T15:00:00-04:00"),
        ]));
        let tool = ListCalendarEventsTool::new(calendar);

        let result = tool.execute(json!({"query": "retro"})).await.unwrap();
        assert!(result.success);
        let events = result.data.unwrap();
        assert_eq!(events.as_array().unwrap().len(), 1);
        assert_eq!(events[0]["id"], "evt_2");
    }

    #[tokio::test]
    async fn bad_time_bound_is_invalid_arguments() {
        let tool = ListCalendarEventsTool::new(Arc::new(InMemoryCalendar::new()));
        let err = tool.execute(json!({"time_min": "next tuesday"})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(msg) if msg.contains("time_min")));
    }

    #[tokio::test]
    async fn adapter_failure_becomes_execution_failed() {
        let calendar = Arc::new(InMemoryCalendar::new());
        calendar.fail_with(Some(AdapterError::network("calendar", "connection reset")));
        let tool = ListCalendarEventsTool::new(calendar);

        let err = tool.execute(json!({})).await.unwrap_err();
        match err {
            ToolError::ExecutionFailed { tool_name, reason } => {
                assert_eq!(tool_name, "list_calendar_events");
                assert!(reason.contains("connection reset"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn reads_inbox() {
        let mail = Arc::new(InMemoryMail::with_inbox(vec![EmailSummary {
            id: "m1".into(),
            subject: "Quarterly planning".into(),
            sender: "jdoe@example.com".into(),
            snippet: "Can we meet on the 1st?".into(),
        }]));
        let tool = ReadEmailsTool::new(mail);

        let result = tool.execute(json!({"max_results": 5})).await.unwrap();
        assert_eq!(result.data.unwrap()[0]["subject"], "Quarterly planning");
    }

    #[tokio::test]
    async fn finds_contact_by_name() {
        let contacts = Arc::new(InMemoryContacts::new(vec![
            Contact { name: "John Doe".into(), email: "jdoe@example.com".into(), contact_type: ContactType::Contact },
            Contact { name: "Ann Lee".into(), email: "ann@example.com".into(), contact_type: ContactType::Other },
        ]));
        let tool = GetContactsTool::new(contacts);

        let result = tool.execute(json!({"query": "john"})).await.unwrap();
        let found = result.data.unwrap();
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["email"], "jdoe@example.com");
        assert_eq!(found[0]["type"], "contact");
    }
}
