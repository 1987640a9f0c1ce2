//! Google Calendar adapter (Calendar API v3 over REST).

use actionstage_config::GoogleConfig;
use actionstage_core::adapter::{Calendar, CalendarEvent, EventQuery};
use actionstage_core::error::AdapterError;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};

use crate::http;

const SERVICE: &str = "calendar";

pub struct GoogleCalendar {
    base_url: String,
    calendar_id: String,
    access_token: String,
    client: reqwest::Client,
}

impl GoogleCalendar {
    pub fn new(config: &GoogleConfig, access_token: impl Into<String>) -> Self {
        Self {
            base_url: http::trim_base(&config.calendar_url),
            calendar_id: config.calendar_id.clone(),
            access_token: access_token.into(),
            client: http::client(),
        }
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/{}/events", self.base_url, self.calendar_id)
    }

    fn event_url(&self, id: &str) -> Result<reqwest::Url, AdapterError> {
        http::with_segment(SERVICE, &self.events_url(), id)
    }

    /// Query string for `events.list`: single events ordered by start time.
    fn list_params(query: &EventQuery) -> Vec<(&'static str, String)> {
        let time_min = query.time_min.unwrap_or_else(Utc::now);
        let mut params = vec![
            ("timeMin", time_min.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("maxResults", query.max_results.to_string()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];
        if let Some(time_max) = query.time_max {
            params.push(("timeMax", time_max.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(q) = query.query.as_deref().filter(|q| !q.is_empty()) {
            params.push(("q", q.to_string()));
        }
        params
    }
}

/// Event bodies must be JSON objects; everything else is the service's call.
pub(crate) fn require_object(body: &serde_json::Value) -> Result<(), AdapterError> {
    if body.is_object() {
        Ok(())
    } else {
        Err(AdapterError::invalid_payload(SERVICE, "event body must be a JSON object"))
    }
}

#[async_trait]
impl Calendar for GoogleCalendar {
    fn name(&self) -> &str {
        "google_calendar"
    }

    async fn list_events(&self, query: EventQuery) -> Result<Vec<CalendarEvent>, AdapterError> {
        let params = Self::list_params(&query);
        debug!(?params, "Listing calendar events");

        let value = http::send_json(
            SERVICE,
            self.client
                .get(self.events_url())
                .bearer_auth(&self.access_token)
                .query(&params),
        )
        .await?;

        let items = value.get("items").cloned().unwrap_or_else(|| serde_json::json!([]));
        serde_json::from_value(items)
            .map_err(|e| AdapterError::invalid_payload(SERVICE, format!("unexpected events list: {e}")))
    }

    async fn get_event(&self, id: &str) -> Result<Option<CalendarEvent>, AdapterError> {
        let result = http::send_json(
            SERVICE,
            self.client.get(self.event_url(id)?).bearer_auth(&self.access_token),
        )
        .await;

        match result {
            Ok(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| AdapterError::invalid_payload(SERVICE, format!("unexpected event: {e}"))),
            Err(err) if err.status() == Some(404) => Ok(None),
            Err(err) => {
                warn!(event_id = %id, error = %err, "Failed to fetch event");
                Err(err)
            }
        }
    }

    async fn create_event(&self, body: &serde_json::Value) -> Result<serde_json::Value, AdapterError> {
        require_object(body)?;
        let summary = body.get("summary").and_then(|s| s.as_str()).unwrap_or("Unknown");
        info!(summary, "Creating calendar event");
        http::send_json(
            SERVICE,
            self.client
                .post(self.events_url())
                .bearer_auth(&self.access_token)
                .json(body),
        )
        .await
    }

    async fn update_event(
        &self,
        id: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, AdapterError> {
        require_object(body)?;
        info!(event_id = %id, "Updating calendar event");
        http::send_json(
            SERVICE,
            self.client
                .patch(self.event_url(id)?)
                .bearer_auth(&self.access_token)
                .json(body),
        )
        .await
    }

    async fn delete_event(&self, id: &str) -> Result<serde_json::Value, AdapterError> {
        info!(event_id = %id, "Deleting calendar event");
        http::send_json(
            SERVICE,
            self.client.delete(self.event_url(id)?).bearer_auth(&self.access_token),
        )
        .await?;
        Ok(serde_json::json!({ "id": id, "status": "deleted" }))
    }
}
