//! Capability adapters for actionstage.
//!
//! - `gcal`, `gmail`, `gpeople` — Google Calendar, Gmail and People over REST
//! - `jira` — issue tracker
//! - `slack` — chat
//! - `memory` — in-memory stand-ins for every capability
//! - `dispatcher` — routes a staged Action to its adapter call

pub mod dispatcher;
pub mod gcal;
pub mod gmail;
pub mod gpeople;
mod http;
pub mod jira;
pub mod memory;
pub mod slack;

use std::sync::Arc;

use actionstage_config::AdaptersConfig;
use actionstage_core::action::ActionPayload;
use actionstage_core::adapter::{Calendar, CalendarEvent, Chat, Contacts, IssueTracker, Mail};
use tracing::{info, warn};

pub use dispatcher::{DispatchError, Dispatcher};

/// One handle per backend, shared by the read tools, snapshot capture and
/// the dispatcher.
#[derive(Clone)]
pub struct Capabilities {
    pub calendar: Arc<dyn Calendar>,
    pub mail: Arc<dyn Mail>,
    pub contacts: Arc<dyn Contacts>,
    pub issues: Arc<dyn IssueTracker>,
    pub chat: Arc<dyn Chat>,
}

impl Capabilities {
    pub fn new(
        calendar: Arc<dyn Calendar>,
        mail: Arc<dyn Mail>,
        contacts: Arc<dyn Contacts>,
        issues: Arc<dyn IssueTracker>,
        chat: Arc<dyn Chat>,
    ) -> Self {
        Self {
            calendar,
            mail,
            contacts,
            issues,
            chat,
        }
    }

    /// Every capability backed by an in-memory adapter.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(memory::InMemoryCalendar::new()),
            Arc::new(memory::InMemoryMail::new()),
            Arc::new(memory::InMemoryContacts::default()),
            Arc::new(memory::InMemoryIssueTracker::default()),
            Arc::new(memory::InMemoryChat::default()),
        )
    }

    /// Build adapters from config. A backend without credentials falls back
    /// to its in-memory adapter ("offline") with a warning.
    pub fn from_config(config: &AdaptersConfig) -> Self {
        let google = &config.google;
        let (calendar, mail, contacts): (Arc<dyn Calendar>, Arc<dyn Mail>, Arc<dyn Contacts>) =
            match google.access_token.as_deref().filter(|t| !t.is_empty()) {
                Some(token) => {
                    info!(calendar_id = %google.calendar_id, "Google adapters online");
                    (
                        Arc::new(gcal::GoogleCalendar::new(google, token)),
                        Arc::new(gmail::Gmail::new(google, token)),
                        Arc::new(gpeople::GooglePeople::new(google, token)),
                    )
                }
                None => {
                    warn!("No Google access token; calendar, mail and contacts are offline");
                    (
                        Arc::new(memory::InMemoryCalendar::new()),
                        Arc::new(memory::InMemoryMail::new()),
                        Arc::new(memory::InMemoryContacts::default()),
                    )
                }
            };

        let issues: Arc<dyn IssueTracker> = match jira::JiraTracker::from_config(&config.jira) {
            Some(tracker) => Arc::new(tracker),
            None => {
                warn!("Jira server, user or token missing; issue tracker is offline");
                Arc::new(memory::InMemoryIssueTracker::new(config.jira.project.clone()))
            }
        };

        let chat: Arc<dyn Chat> = match config.slack.bot_token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => Arc::new(slack::SlackChat::new(&config.slack, token)),
            None => {
                warn!("No Slack bot token; chat is offline");
                Arc::new(memory::InMemoryChat::new(config.slack.channel.clone()))
            }
        };

        Self::new(calendar, mail, contacts, issues, chat)
    }

    /// Fetch the event an update/delete targets.
    ///
    /// A missing event or a failed fetch yields `None` with a warning; the
    /// caller stages the proposal anyway.
    pub async fn fetch_target(&self, id: &str) -> Option<CalendarEvent> {
        match self.calendar.get_event(id).await {
            Ok(Some(event)) => Some(event),
            Ok(None) => {
                warn!(event_id = %id, "Target event not found; no snapshot captured");
                None
            }
            Err(err) => {
                warn!(event_id = %id, error = %err, "Snapshot fetch failed");
                None
            }
        }
    }

    /// Snapshot for `original`, captured at proposal time.
    pub async fn snapshot_for(&self, payload: &ActionPayload) -> Option<serde_json::Value> {
        let id = payload.target_id()?;
        self.fetch_target(id).await.map(|event| event.to_value())
    }

    pub fn describe(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("calendar", self.calendar.name()),
            ("mail", self.mail.name()),
            ("contacts", self.contacts.name()),
            ("issues", self.issues.name()),
            ("chat", self.chat.name()),
        ]
    }
}
