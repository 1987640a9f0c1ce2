//! Calendar propose tools: create, update and delete an event.
//!
//! Each tool turns its arguments into an event resource, classifies the
//! change with `define_alternation`, and stages the result. Update and
//! delete capture the target event as `original` when it can be fetched.

use actionstage_core::action::{ActionPayload, define_alternation};
use actionstage_core::adapter::CalendarEvent;
use actionstage_core::error::ToolError;
use actionstage_core::tool::{Tool, ToolClass, ToolResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime};
use serde_json::{Map, Value, json};

use crate::stage::Stager;

const DEFAULT_DURATION_MINUTES: i64 = 60;

fn event_properties() -> Value {
    json!({
        "summary": {
            "type": "string",
            "description": "Event title, e.g. 'Meeting with John Doe'"
        },
        "description": {
            "type": "string",
            "description": "Event notes"
        },
        "location": {
            "type": "string",
            "description": "Where the event takes place"
        },
        "start_time": {
            "type": "string",
            "description": "Start as ISO 8601 local time (2026-04-01T10:00:00) or RFC 3339"
        },
        "end_time": {
            "type": "string",
            "description": "End time in the same format; defaults to one hour after start"
        },
        "time_zone": {
            "type": "string",
            "description": "IANA time zone for start and end, e.g. 'America/New_York'"
        },
        "attendees": {
            "type": "array",
            "items": { "type": "string" },
            "description": "Attendee email addresses; use a placeholder like '<unknown email for John Doe>' when unknown"
        }
    })
}

enum Stamp {
    Zoned(DateTime<chrono::FixedOffset>),
    Local(NaiveDateTime),
}

fn parse_stamp(raw: &str) -> Option<Stamp> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(Stamp::Zoned(t));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(Stamp::Local)
}

/// One hour after `start`, in the same notation.
fn default_end(start: &str) -> Option<String> {
    let duration = Duration::minutes(DEFAULT_DURATION_MINUTES);
    match parse_stamp(start)? {
        Stamp::Zoned(t) => Some((t + duration).to_rfc3339()),
        Stamp::Local(t) => Some((t + duration).format("%Y-%m-%dT%H:%M:%S").to_string()),
    }
}

fn text_arg(arguments: &Value, key: &str) -> Option<String> {
    arguments[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Build a Google Calendar event resource from flat tool arguments.
///
/// Only fields present in the arguments appear in the result, so the same
/// builder serves as a patch for updates.
pub(crate) fn event_body(arguments: &Value, default_time_zone: &str) -> Result<Map<String, Value>, ToolError> {
    let mut body = Map::new();

    for key in ["summary", "description", "location"] {
        if let Some(value) = text_arg(arguments, key) {
            body.insert(key.into(), Value::String(value));
        }
    }

    let time_zone = text_arg(arguments, "time_zone").unwrap_or_else(|| default_time_zone.to_string());
    let start = text_arg(arguments, "start_time");
    if let Some(raw) = start.as_deref() {
        if parse_stamp(raw).is_none() {
            return Err(ToolError::InvalidArguments(format!(
                "'start_time' is not an ISO 8601 date-time: {raw}"
            )));
        }
    }
    let end = text_arg(arguments, "end_time").or_else(|| start.as_deref().and_then(default_end));

    if let Some(start) = start {
        body.insert("start".into(), json!({ "dateTime": start, "timeZone": time_zone }));
    }
    if let Some(end) = end {
        body.insert("end".into(), json!({ "dateTime": end, "timeZone": time_zone }));
    }

    match &arguments["attendees"] {
        Value::Null => {}
        Value::Array(items) => {
            let attendees: Vec<Value> = items
                .iter()
                .filter_map(|item| item.as_str().or_else(|| item["email"].as_str()))
                .map(|email| json!({ "email": email }))
                .collect();
            body.insert("attendees".into(), Value::Array(attendees));
        }
        _ => {
            return Err(ToolError::InvalidArguments(
                "'attendees' must be an array of email addresses".into(),
            ));
        }
    }

    Ok(body)
}

fn required_event_id(arguments: &Value) -> Result<String, ToolError> {
    text_arg(arguments, "event_id")
        .ok_or_else(|| ToolError::InvalidArguments("Missing 'event_id' argument".into()))
}

/// Fetch the target event; fall back to a bare reference when it cannot
/// be fetched. The snapshot is `None` in that case.
async fn resolve_target(stager: &Stager, id: &str) -> (CalendarEvent, Option<Value>) {
    match stager.capabilities().fetch_target(id).await {
        Some(event) => {
            let snapshot = event.to_value();
            (event, Some(snapshot))
        }
        None => (CalendarEvent::reference(id), None),
    }
}

fn staged_payload(tool_name: &str, payload: Option<ActionPayload>) -> Result<ActionPayload, ToolError> {
    payload.ok_or_else(|| ToolError::ExecutionFailed {
        tool_name: tool_name.to_string(),
        reason: "nothing to change".into(),
    })
}

pub struct CreateCalendarEventTool {
    stager: Stager,
    time_zone: String,
}

impl CreateCalendarEventTool {
    pub fn new(stager: Stager, time_zone: impl Into<String>) -> Self {
        Self { stager, time_zone: time_zone.into() }
    }
}

#[async_trait]
impl Tool for CreateCalendarEventTool {
    fn name(&self) -> &str {
        "create_calendar_event"
    }

    fn description(&self) -> &str {
        "Propose a new calendar event. The event is staged for human review, not created."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": event_properties(),
            "required": ["summary", "start_time"]
        })
    }

    fn class(&self) -> ToolClass {
        ToolClass::Propose
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        if text_arg(&arguments, "summary").is_none() {
            return Err(ToolError::InvalidArguments("Missing 'summary' argument".into()));
        }
        if text_arg(&arguments, "start_time").is_none() {
            return Err(ToolError::InvalidArguments("Missing 'start_time' argument".into()));
        }

        let desired = Value::Object(event_body(&arguments, &self.time_zone)?);
        let payload = staged_payload(self.name(), define_alternation(None, Some(desired)).into_payload())?;
        self.stager.stage(self.name(), payload, None).await
    }
}

pub struct UpdateCalendarEventTool {
    stager: Stager,
    time_zone: String,
}

impl UpdateCalendarEventTool {
    pub fn new(stager: Stager, time_zone: impl Into<String>) -> Self {
        Self { stager, time_zone: time_zone.into() }
    }
}

#[async_trait]
impl Tool for UpdateCalendarEventTool {
    fn name(&self) -> &str {
        "update_calendar_event"
    }

    fn description(&self) -> &str {
        "Propose changes to an existing calendar event. Only the fields given are changed. Staged for human review."
    }

    fn parameters_schema(&self) -> Value {
        let mut properties = event_properties();
        properties["event_id"] = json!({
            "type": "string",
            "description": "Id of the event to change (from list_calendar_events)"
        });
        json!({
            "type": "object",
            "properties": properties,
            "required": ["event_id"]
        })
    }

    fn class(&self) -> ToolClass {
        ToolClass::Propose
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let id = required_event_id(&arguments)?;
        let patch = event_body(&arguments, &self.time_zone)?;
        if patch.is_empty() {
            return Err(ToolError::InvalidArguments("No event fields to update".into()));
        }

        let (existing, snapshot) = resolve_target(&self.stager, &id).await;
        let alternation = define_alternation(Some(&existing), Some(Value::Object(patch)));
        let payload = staged_payload(self.name(), alternation.into_payload())?;
        self.stager.stage(self.name(), payload, snapshot).await
    }
}

pub struct DeleteCalendarEventTool {
    stager: Stager,
}

impl DeleteCalendarEventTool {
    pub fn new(stager: Stager) -> Self {
        Self { stager }
    }
}

#[async_trait]
impl Tool for DeleteCalendarEventTool {
    fn name(&self) -> &str {
        "delete_calendar_event"
    }

    fn description(&self) -> &str {
        "Propose cancelling a calendar event. Staged for human review, not deleted."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "event_id": {
                    "type": "string",
                    "description": "Id of the event to cancel (from list_calendar_events)"
                }
            },
            "required": ["event_id"]
        })
    }

    fn class(&self) -> ToolClass {
        ToolClass::Propose
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let id = required_event_id(&arguments)?;
        let (existing, snapshot) = resolve_target(&self.stager, &id).await;
        let payload = staged_payload(self.name(), define_alternation(Some(&existing), None).into_payload())?;
        self.stager.stage(self.name(), payload, snapshot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actionstage_adapters::Capabilities;
    use actionstage_adapters::memory::InMemoryCalendar;
    use actionstage_core::error::AdapterError;
    use actionstage_core::proposal::ProposalStore;
    use actionstage_store::InMemoryProposalStore;
    use std::sync::Arc;

    const TZ: &str = "America/New_York";

    fn stager_with(calendar: Arc<InMemoryCalendar>) -> (Arc<InMemoryProposalStore>, Stager) {
        let store = Arc::new(InMemoryProposalStore::new());
        let mut caps = Capabilities::in_memory();
        caps.calendar = calendar;
        (store.clone(), Stager::new(store, caps))
    }

    fn standup() -> CalendarEvent {
        serde_json::from_value(json!({"id": "evt_9", "summary": "Standup"})).unwrap()
    }

    #[test]
    fn body_defaults_end_and_zone() {
        let body = event_body(
            &json!({"summary": "Meeting with John Doe", "start_time": "2026-04-01T10:00:00"}),
            TZ,
        )
        .unwrap();
        assert_eq!(body["start"], json!({"dateTime": "2026-04-01T10:00:00", "timeZone": TZ}));
        assert_eq!(body["end"]["dateTime"], "2026-04-01T11:00:00");
        assert!(!body.contains_key("attendees"));
    }

    #[test]
    fn body_keeps_offset_notation() {
        let body = event_body(&json!({"start_time": "2026-04-01T10:00:00-04:00"}), TZ).unwrap();
        assert_eq!(body["end"]["dateTime"], "2026-04-01T11:00:00-04:00");
    }

    #[test]
    fn body_rejects_unparseable_start() {
        let err = event_body(&json!({"start_time": "April 1st"}), TZ).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn attendees_accept_strings_or_objects() {
        let body = event_body(
            &json!({"attendees": ["jdoe@example.com", {"email": "<unknown email for Ann>"}]}),
            TZ,
        )
        .unwrap();
        assert_eq!(
            body["attendees"],
            json!([{"email": "jdoe@example.com"}, {"email": "<unknown email for Ann>"}])
        );
    }

    #[tokio::test]
    async fn create_stages_without_snapshot() {
        let calendar = Arc::new(InMemoryCalendar::new());
        let (store, stager) = stager_with(calendar.clone());
        let tool = CreateCalendarEventTool::new(stager, TZ);

        let result = tool
            .execute(json!({
                "summary": "Meeting with John Doe",
                "start_time": "2026-04-01T10:00:00",
                "attendees": ["<unknown email for John Doe>"]
            }))
            .await
            .unwrap();

        let data = result.data.unwrap();
        assert_eq!(data["action"], "create");
        assert_eq!(data["body"]["summary"], "Meeting with John Doe");
        assert!(data.get("original").is_none());
        assert_eq!(store.count().await.unwrap(), 1);
        // staged, not executed
        assert!(calendar.events().is_empty());
    }

    #[tokio::test]
    async fn create_requires_summary() {
        let (store, stager) = stager_with(Arc::new(InMemoryCalendar::new()));
        let tool = CreateCalendarEventTool::new(stager, TZ);
        let err = tool.execute(json!({"start_time": "2026-04-01T10:00:00"})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_captures_snapshot() {
        let (store, stager) = stager_with(Arc::new(InMemoryCalendar::with_events(vec![standup()])));
        let tool = UpdateCalendarEventTool::new(stager, TZ);

        let result = tool
            .execute(json!({"event_id": "evt_9", "location": "Room 4"}))
            .await
            .unwrap();
        let data = result.data.unwrap();
        assert_eq!(data["action"], "update");
        assert_eq!(data["id"], "evt_9");
        assert_eq!(data["body"], json!({"location": "Room 4"}));
        assert_eq!(data["original"]["summary"], "Standup");

        let staged = store.list().await.unwrap();
        assert_eq!(staged[0].original().unwrap()["id"], "evt_9");
    }

    #[tokio::test]
    async fn update_unknown_event_still_stages() {
        let (store, stager) = stager_with(Arc::new(InMemoryCalendar::new()));
        let tool = UpdateCalendarEventTool::new(stager, TZ);

        let result = tool.execute(json!({"event_id": "evt_404", "summary": "Moved"})).await.unwrap();
        let data = result.data.unwrap();
        assert_eq!(data["id"], "evt_404");
        assert!(data.get("original").is_none());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_without_fields_is_rejected() {
        let (_, stager) = stager_with(Arc::new(InMemoryCalendar::new()));
        let tool = UpdateCalendarEventTool::new(stager, TZ);
        let err = tool.execute(json!({"event_id": "evt_9"})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn delete_stages_whether_or_not_fetch_succeeds() {
        let calendar = Arc::new(InMemoryCalendar::with_events(vec![standup()]));
        let (store, stager) = stager_with(calendar.clone());
        let tool = DeleteCalendarEventTool::new(stager);

        let first = tool.execute(json!({"event_id": "evt_9"})).await.unwrap().data.unwrap();
        assert_eq!(first["action"], "delete");
        assert_eq!(first["original"]["summary"], "Standup");

        calendar.fail_with(Some(AdapterError::network("calendar", "timeout")));
        let second = tool.execute(json!({"event_id": "evt_9"})).await.unwrap().data.unwrap();
        assert!(second.get("original").is_none());
        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(calendar.events().len(), 1);
    }

    #[tokio::test]
    async fn delete_requires_event_id() {
        let (_, stager) = stager_with(Arc::new(InMemoryCalendar::new()));
        let err = DeleteCalendarEventTool::new(stager).execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(msg) if msg.contains("event_id")));
    }
}
