//! End-to-end tests for actionstage.
//!
//! These drive the full pipeline over HTTP: transcript in, staged actions
//! reviewed and edited, then executed against in-memory backends.

use std::sync::Arc;

use actionstage_adapters::Capabilities;
use actionstage_adapters::memory::{InMemoryCalendar, InMemoryContacts, InMemoryMail};
use actionstage_agent::ExtractionLoop;
use actionstage_agent::scripted::{ScriptedProvider, text_response, tool_call, tool_call_response};
use actionstage_core::adapter::{Contact, ContactType};
use actionstage_core::event::{DomainEvent, EventBus};
use actionstage_core::proposal::ProposalStore;
use actionstage_gateway::{GatewayState, SharedState, build_router};
use actionstage_store::InMemoryProposalStore;
use actionstage_tools::Stager;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

struct Harness {
    state: SharedState,
    provider: Arc<ScriptedProvider>,
    calendar: Arc<InMemoryCalendar>,
    mail: Arc<InMemoryMail>,
    event_bus: Arc<EventBus>,
}

impl Harness {
    fn new(provider: ScriptedProvider) -> Self {
        let provider = Arc::new(provider);
        let calendar = Arc::new(InMemoryCalendar::new());
        let mail = Arc::new(InMemoryMail::new());
        let mut caps = Capabilities::in_memory();
        caps.calendar = calendar.clone();
        caps.mail = mail.clone();
        caps.contacts = Arc::new(InMemoryContacts::new(vec![Contact {
            name: "John Doe".into(),
            email: "john.doe@example.com".into(),
            contact_type: ContactType::Contact,
        }]));

        let event_bus = Arc::new(EventBus::default());
        let store: Arc<dyn ProposalStore> = Arc::new(InMemoryProposalStore::new());
        let stager = Stager::new(store.clone(), caps.clone()).with_events(event_bus.clone());
        let tools = Arc::new(actionstage_tools::default_registry(stager, "America/New_York"));
        let extractor = ExtractionLoop::new(provider.clone(), "scripted-model", tools, event_bus.clone());

        Self {
            state: Arc::new(GatewayState::new(store, caps, extractor, event_bus.clone())),
            provider,
            calendar,
            mail,
            event_bus,
        }
    }

    async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |v| Body::from(v.to_string())))
            .unwrap();
        let response = build_router(self.state.clone()).oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }
}

fn transcript(lines: &[(&str, u32)], indices: Value) -> Value {
    let messages: Vec<Value> = lines
        .iter()
        .map(|(content, speaker)| json!({"content": content, "speaker": speaker}))
        .collect();
    json!({"session_id": "standup-42", "attention_indices": indices, "messages": messages})
}

// ── Meeting → review → edit → execute ───────────────────────────────────

#[tokio::test]
async fn e2e_meeting_request_staged_edited_and_executed() {
    let h = Harness::new(ScriptedProvider::new(vec![
        tool_call_response(vec![tool_call(
            "call_1",
            "create_calendar_event",
            json!({
                "summary": "Meeting with John Doe",
                "start_time": "2026-04-01T10:00:00",
                "attendees": ["<unknown email for John Doe>"]
            }),
        )]),
        text_response("I staged a meeting with John Doe."),
    ]));
    let mut events = h.event_bus.subscribe();

    let (status, body) = h
        .call(
            "POST",
            "/GetTodos",
            Some(transcript(
                &[
                    ("Make a calendar event for a meeting with John Doe on April 1st at 10:00 AM", 1),
                    ("Attention", 0),
                ],
                json!([1]),
            )),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Status"], 200);
    let uuid = body["Todos"][0]["uuid"].as_str().unwrap().to_string();
    assert_eq!(body["Todos"][0]["body"]["start"]["timeZone"], "America/New_York");

    // Nothing ran yet
    assert!(h.calendar.events().is_empty());
    assert_eq!(h.provider.call_count(), 2);

    // The user fills in the placeholder before confirming
    let (status, _) = h
        .call(
            "PUT",
            &format!("/actions/{uuid}"),
            Some(json!({"data": {
                "action": "create",
                "body": {
                    "summary": "Meeting with John Doe",
                    "start": {"dateTime": "2026-04-01T10:00:00", "timeZone": "America/New_York"},
                    "end": {"dateTime": "2026-04-01T11:00:00", "timeZone": "America/New_York"},
                    "attendees": [{"email": "john.doe@example.com"}]
                }
            }})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = h.call("POST", &format!("/actions/{uuid}/execute"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    let created = h.calendar.events();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].fields["attendees"][0]["email"], "john.doe@example.com");

    let (_, list) = h.call("GET", "/actions", None).await;
    assert_eq!(list, json!([]));

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(match event.as_ref() {
            DomainEvent::ActionProposed { .. } => "proposed",
            DomainEvent::ActionUpdated { .. } => "updated",
            DomainEvent::ActionExecuted { success: true, .. } => "executed",
            _ => continue,
        });
    }
    assert_eq!(seen, vec!["proposed", "updated", "executed"]);
}

// ── Read lookup feeds a proposal ─────────────────────────────────────────

#[tokio::test]
async fn e2e_contact_lookup_then_email() {
    let h = Harness::new(ScriptedProvider::new(vec![
        tool_call_response(vec![tool_call("call_1", "get_contacts", json!({"query": "john"}))]),
        tool_call_response(vec![tool_call(
            "call_2",
            "send_email",
            json!({
                "recipient": "john.doe@example.com",
                "subject": "Slides",
                "body": "Here are the slides from today."
            }),
        )]),
        text_response("Drafted the email."),
    ]));

    let (_, body) = h
        .call(
            "POST",
            "/GetTodos",
            Some(transcript(&[("Send John the slides", 1), ("Attention", 0)], json!([1]))),
        )
        .await;
    let todos = body["Todos"].as_array().unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0]["action"], "send_email");

    // The contact lookup result reached the model before it proposed
    let requests = h.provider.requests();
    assert!(requests[1].messages.iter().any(|m| m.content.contains("john.doe@example.com")));

    let uuid = todos[0]["uuid"].as_str().unwrap();
    let (status, _) = h.call("POST", &format!("/actions/{uuid}/execute"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.mail.sent()[0].recipient, "john.doe@example.com");
}

// ── Dismissed proposals never run ────────────────────────────────────────

#[tokio::test]
async fn e2e_dismissed_action_cannot_execute() {
    let h = Harness::new(ScriptedProvider::new(vec![
        tool_call_response(vec![tool_call(
            "call_1",
            "send_chat_message",
            json!({"message": "Release is delayed"}),
        )]),
        text_response("Staged."),
    ]));

    let (_, body) = h
        .call(
            "POST",
            "/GetTodos",
            Some(transcript(&[("Tell the channel the release slips", 2), ("Attention", 0)], json!([1]))),
        )
        .await;
    let uuid = body["Todos"][0]["uuid"].as_str().unwrap().to_string();

    let (status, _) = h.call("DELETE", &format!("/actions/{uuid}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = h.call("POST", &format!("/actions/{uuid}/execute"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Several attention points in one request ──────────────────────────────

#[tokio::test]
async fn e2e_two_attention_points_in_index_order() {
    let h = Harness::new(ScriptedProvider::new(vec![
        tool_call_response(vec![tool_call("a", "create_issue", json!({"summary": "Fix flaky login test"}))]),
        text_response("Filed."),
        tool_call_response(vec![tool_call("b", "send_chat_message", json!({"message": "Standup moved to 9:30"}))]),
        text_response("Posted."),
    ]));

    let (_, body) = h
        .call(
            "POST",
            "/GetTodos",
            Some(transcript(
                &[
                    ("The login test keeps failing", 1),
                    ("Attention", 0),
                    ("Let everyone know standup moves to 9:30", 2),
                    ("Attention", 0),
                ],
                json!([1, 3]),
            )),
        )
        .await;
    let kinds: Vec<&str> = body["Todos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["action"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["create_issue", "send_chat_message"]);

    let (_, list) = h.call("GET", "/actions", None).await;
    assert_eq!(list.as_array().unwrap().len(), 2);
}

// ── Config-driven wiring ─────────────────────────────────────────────────

#[test]
fn e2e_gateway_state_builds_from_default_config() {
    let config = actionstage_config::AppConfig::default();
    let state = GatewayState::from_config(&config, Arc::new(EventBus::default())).unwrap();
    assert_eq!(state.extractor.max_turns(), 10);
}
