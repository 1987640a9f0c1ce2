//! In-memory capability adapters.
//!
//! Used when a backend has no credentials ("offline" mode) and as test
//! doubles. Each one can be switched into a failing state with
//! `fail_with` to exercise error paths.

use std::sync::{Mutex, MutexGuard};

use actionstage_core::action::{ChatDraft, EmailDraft, IssueDraft};
use actionstage_core::adapter::{
    Calendar, CalendarEvent, Chat, Contact, Contacts, EmailSummary, EventQuery, IssueTracker, Mail,
};
use actionstage_core::error::AdapterError;
use async_trait::async_trait;
use tracing::info;

use crate::{gcal, gmail, gpeople, jira, slack};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// An error to return from every call until cleared.
#[derive(Default)]
struct FailureSwitch(Mutex<Option<AdapterError>>);

impl FailureSwitch {
    fn set(&self, error: Option<AdapterError>) {
        *lock(&self.0) = error;
    }

    fn check(&self) -> Result<(), AdapterError> {
        match lock(&self.0).as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn not_found(service: &str, id: &str) -> AdapterError {
    AdapterError::Api {
        service: service.into(),
        status: 404,
        message: format!("{id} not found"),
    }
}

// --- Calendar ---

#[derive(Default)]
pub struct InMemoryCalendar {
    events: Mutex<Vec<CalendarEvent>>,
    next_id: Mutex<u64>,
    failure: FailureSwitch,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        let calendar = Self::new();
        *lock(&calendar.events) = events;
        calendar
    }

    pub fn fail_with(&self, error: Option<AdapterError>) {
        self.failure.set(error);
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        lock(&self.events).clone()
    }
}

fn event_text(event: &CalendarEvent) -> String {
    ["summary", "description", "location"]
        .iter()
        .filter_map(|k| event.fields.get(*k).and_then(|v| v.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn event_start(event: &CalendarEvent) -> String {
    event
        .fields
        .get("start")
        .and_then(|s| s.get("dateTime").or_else(|| s.get("date")))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl Calendar for InMemoryCalendar {
    fn name(&self) -> &str {
        "in_memory_calendar"
    }

    /// Time bounds are not applied; results are ordered by start.
    async fn list_events(&self, query: EventQuery) -> Result<Vec<CalendarEvent>, AdapterError> {
        self.failure.check()?;
        let needle = query.query.as_deref().map(str::to_lowercase);
        let mut events: Vec<CalendarEvent> = lock(&self.events)
            .iter()
            .filter(|e| needle.as_deref().is_none_or(|n| event_text(e).contains(n)))
            .cloned()
            .collect();
        events.sort_by_key(event_start);
        events.truncate(query.max_results as usize);
        Ok(events)
    }

    async fn get_event(&self, id: &str) -> Result<Option<CalendarEvent>, AdapterError> {
        self.failure.check()?;
        Ok(lock(&self.events).iter().find(|e| e.id == id).cloned())
    }

    async fn create_event(&self, body: &serde_json::Value) -> Result<serde_json::Value, AdapterError> {
        self.failure.check()?;
        gcal::require_object(body)?;

        let id = {
            let mut next = lock(&self.next_id);
            *next += 1;
            format!("evt_local_{next}")
        };
        let mut fields = body.as_object().cloned().unwrap_or_default();
        fields.remove("id");
        let event = CalendarEvent { id, fields };
        info!(event_id = %event.id, "Created in-memory event");

        let value = event.to_value();
        lock(&self.events).push(event);
        Ok(value)
    }

    async fn update_event(
        &self,
        id: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, AdapterError> {
        self.failure.check()?;
        gcal::require_object(body)?;

        let mut events = lock(&self.events);
        let event = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| not_found("calendar", id))?;
        if let Some(patch) = body.as_object() {
            for (key, value) in patch {
                if key != "id" {
                    event.fields.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(event.to_value())
    }

    async fn delete_event(&self, id: &str) -> Result<serde_json::Value, AdapterError> {
        self.failure.check()?;
        let mut events = lock(&self.events);
        let before = events.len();
        events.retain(|e| e.id != id);
        if events.len() == before {
            return Err(not_found("calendar", id));
        }
        Ok(serde_json::json!({ "id": id, "status": "deleted" }))
    }
}

// --- Mail ---

#[derive(Default)]
pub struct InMemoryMail {
    inbox: Mutex<Vec<EmailSummary>>,
    sent: Mutex<Vec<EmailDraft>>,
    failure: FailureSwitch,
}

impl InMemoryMail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inbox(inbox: Vec<EmailSummary>) -> Self {
        let mail = Self::new();
        *lock(&mail.inbox) = inbox;
        mail
    }

    pub fn fail_with(&self, error: Option<AdapterError>) {
        self.failure.set(error);
    }

    pub fn sent(&self) -> Vec<EmailDraft> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl Mail for InMemoryMail {
    fn name(&self) -> &str {
        "in_memory_mail"
    }

    async fn read_emails(
        &self,
        query: Option<&str>,
        max_results: u32,
    ) -> Result<Vec<EmailSummary>, AdapterError> {
        self.failure.check()?;
        let needle = query.filter(|q| !q.is_empty()).map(str::to_lowercase);
        Ok(lock(&self.inbox)
            .iter()
            .filter(|m| {
                needle.as_deref().is_none_or(|n| {
                    format!("{} {} {}", m.subject, m.sender, m.snippet).to_lowercase().contains(n)
                })
            })
            .take(max_results as usize)
            .cloned()
            .collect())
    }

    async fn send_email(&self, draft: &EmailDraft) -> Result<serde_json::Value, AdapterError> {
        self.failure.check()?;
        gmail::validate_draft(draft)?;
        let mut sent = lock(&self.sent);
        sent.push(draft.clone());
        info!(recipient = %draft.recipient, "Recorded in-memory email");
        Ok(serde_json::json!({ "id": format!("msg_local_{}", sent.len()), "labelIds": ["SENT"] }))
    }
}

// --- Contacts ---

#[derive(Default)]
pub struct InMemoryContacts {
    contacts: Vec<Contact>,
    failure: FailureSwitch,
}

impl InMemoryContacts {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self {
            contacts,
            failure: FailureSwitch::default(),
        }
    }

    pub fn fail_with(&self, error: Option<AdapterError>) {
        self.failure.set(error);
    }
}

#[async_trait]
impl Contacts for InMemoryContacts {
    fn name(&self) -> &str {
        "in_memory_contacts"
    }

    async fn get_contacts(&self, query: Option<&str>) -> Result<Vec<Contact>, AdapterError> {
        self.failure.check()?;
        Ok(gpeople::filter_contacts(self.contacts.clone(), query))
    }
}

// --- Issue tracker ---

pub struct InMemoryIssueTracker {
    project: String,
    issues: Mutex<Vec<IssueDraft>>,
    failure: FailureSwitch,
}

impl InMemoryIssueTracker {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            issues: Mutex::new(Vec::new()),
            failure: FailureSwitch::default(),
        }
    }

    pub fn fail_with(&self, error: Option<AdapterError>) {
        self.failure.set(error);
    }

    pub fn issues(&self) -> Vec<IssueDraft> {
        lock(&self.issues).clone()
    }
}

impl Default for InMemoryIssueTracker {
    fn default() -> Self {
        Self::new("SCRUM")
    }
}

#[async_trait]
impl IssueTracker for InMemoryIssueTracker {
    fn name(&self) -> &str {
        "in_memory_issue_tracker"
    }

    async fn create_issue(&self, draft: &IssueDraft) -> Result<serde_json::Value, AdapterError> {
        self.failure.check()?;
        jira::validate_draft(draft)?;
        let mut issues = lock(&self.issues);
        issues.push(draft.clone());
        let n = issues.len();
        Ok(serde_json::json!({
            "status": "success",
            "key": format!("{}-{n}", self.project),
            "id": (10000 + n).to_string(),
        }))
    }
}

// --- Chat ---

pub struct InMemoryChat {
    channel: String,
    posted: Mutex<Vec<(String, String)>>,
    failure: FailureSwitch,
}

impl InMemoryChat {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            posted: Mutex::new(Vec::new()),
            failure: FailureSwitch::default(),
        }
    }

    pub fn fail_with(&self, error: Option<AdapterError>) {
        self.failure.set(error);
    }

    /// `(channel, text)` pairs in posting order.
    pub fn posted(&self) -> Vec<(String, String)> {
        lock(&self.posted).clone()
    }
}

impl Default for InMemoryChat {
    fn default() -> Self {
        Self::new("#all-hackathon")
    }
}

#[async_trait]
impl Chat for InMemoryChat {
    fn name(&self) -> &str {
        "in_memory_chat"
    }

    async fn send_message(&self, draft: &ChatDraft) -> Result<serde_json::Value, AdapterError> {
        self.failure.check()?;
        slack::validate_draft(draft)?;
        let channel = slack::target_channel(draft, &self.channel).to_string();
        let mut posted = lock(&self.posted);
        posted.push((channel, draft.message.clone()));
        Ok(serde_json::json!({ "status": "success", "ts": format!("{}.000000", posted.len()) }))
    }
}
