//! Execution dispatcher — routes an Action to exactly one adapter call.

use actionstage_core::action::{Action, ActionId, ActionPayload};
use actionstage_core::error::{ExecutionError, StoreError};
use actionstage_core::proposal::ProposalStore;
use tracing::{info, warn};

use crate::Capabilities;

/// Why `execute_by_id` did not produce a result.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The id is unknown, or another caller already took the Action.
    #[error(transparent)]
    NotFound(StoreError),

    /// The Action left the store but the adapter call failed.
    #[error(transparent)]
    Execution(ExecutionError),
}

#[derive(Clone)]
pub struct Dispatcher {
    capabilities: Capabilities,
}

impl Dispatcher {
    pub fn new(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Run the adapter primitive for this Action's kind.
    ///
    /// The adapter's reply is returned verbatim.
    pub async fn execute(&self, action: &Action) -> Result<serde_json::Value, ExecutionError> {
        let caps = &self.capabilities;
        let result = match action.payload() {
            ActionPayload::Create { body } => caps.calendar.create_event(body).await,
            ActionPayload::Update { id, body } => caps.calendar.update_event(id, body).await,
            ActionPayload::Delete { id } => caps.calendar.delete_event(id).await,
            ActionPayload::SendEmail { body } => caps.mail.send_email(body).await,
            ActionPayload::CreateIssue { body } => caps.issues.create_issue(body).await,
            ActionPayload::SendChatMessage { body } => caps.chat.send_message(body).await,
        };

        result.map_err(|err| ExecutionError {
            kind: action.kind(),
            message: err.to_string(),
        })
    }

    /// Take the Action out of the store, then execute it.
    ///
    /// The Action is removed before the remote call, so it runs at most once;
    /// if the adapter fails it is gone and must be proposed again.
    pub async fn execute_by_id(
        &self,
        store: &dyn ProposalStore,
        id: &ActionId,
    ) -> Result<(Action, serde_json::Value), DispatchError> {
        let action = store.take_for_execution(id).await.map_err(DispatchError::NotFound)?;

        match self.execute(&action).await {
            Ok(result) => {
                info!(action_id = %id, kind = %action.kind(), "Action executed");
                Ok((action, result))
            }
            Err(err) => {
                warn!(action_id = %id, kind = %action.kind(), error = %err, "Action execution failed; proposal dropped");
                Err(DispatchError::Execution(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::*;
    use actionstage_core::action::{ActionKind, ChatDraft, EmailDraft, IssueDraft};
    use actionstage_core::error::AdapterError;
    use actionstage_store::InMemoryProposalStore;
    use serde_json::json;
    use std::sync::Arc;

    struct Fixture {
        calendar: Arc<InMemoryCalendar>,
        mail: Arc<InMemoryMail>,
        issues: Arc<InMemoryIssueTracker>,
        chat: Arc<InMemoryChat>,
        dispatcher: Dispatcher,
    }

    fn fixture() -> Fixture {
        let calendar = Arc::new(InMemoryCalendar::new());
        let mail = Arc::new(InMemoryMail::new());
        let issues = Arc::new(InMemoryIssueTracker::default());
        let chat = Arc::new(InMemoryChat::default());
        let caps = Capabilities::new(
            calendar.clone(),
            mail.clone(),
            Arc::new(InMemoryContacts::default()),
            issues.clone(),
            chat.clone(),
        );
        Fixture { calendar, mail, issues, chat, dispatcher: Dispatcher::new(caps) }
    }

    fn pending(payload: ActionPayload) -> Action {
        Action::pending(payload, None, chrono::Utc::now())
    }

    #[tokio::test]
    async fn routes_each_kind() {
        let fx = fixture();

        let created = fx
            .dispatcher
            .execute(&pending(ActionPayload::Create { body: json!({"summary": "Sync"}) }))
            .await
            .unwrap();
        let event_id = created["id"].as_str().unwrap().to_string();

        fx.dispatcher
            .execute(&pending(ActionPayload::Update { id: event_id.clone(), body: json!({"summary": "Sync 2"}) }))
            .await
            .unwrap();
        assert_eq!(fx.calendar.events()[0].summary(), Some("Sync 2"));

        let deleted = fx
            .dispatcher
            .execute(&pending(ActionPayload::Delete { id: event_id.clone() }))
            .await
            .unwrap();
        assert_eq!(deleted, json!({"id": event_id, "status": "deleted"}));

        fx.dispatcher
            .execute(&pending(ActionPayload::SendEmail {
                body: EmailDraft { recipient: "jdoe@example.com".into(), subject: "Hi".into(), body: "Hello".into() },
            }))
            .await
            .unwrap();
        assert_eq!(fx.mail.sent().len(), 1);

        let issue = fx
            .dispatcher
            .execute(&pending(ActionPayload::CreateIssue {
                body: IssueDraft { summary: "Fix login".into(), description: "".into() },
            }))
            .await
            .unwrap();
        assert_eq!(issue["key"], "SCRUM-1");
        assert_eq!(fx.issues.issues().len(), 1);

        let posted = fx
            .dispatcher
            .execute(&pending(ActionPayload::SendChatMessage {
                body: ChatDraft { message: "Shipped".into(), channel: None },
            }))
            .await
            .unwrap();
        assert_eq!(posted["status"], "success");
        assert_eq!(fx.chat.posted().len(), 1);
    }

    #[tokio::test]
    async fn adapter_failure_names_kind() {
        let fx = fixture();
        let err = fx
            .dispatcher
            .execute(&pending(ActionPayload::Delete { id: "missing".into() }))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ActionKind::Delete);
        assert!(err.message.contains("404"));
    }

    #[tokio::test]
    async fn execute_by_id_unknown_is_not_found_every_time() {
        let fx = fixture();
        let store = InMemoryProposalStore::new();
        for _ in 0..2 {
            let err = fx.dispatcher.execute_by_id(&store, &ActionId::from("nope")).await.unwrap_err();
            assert!(matches!(err, DispatchError::NotFound(StoreError::NotFound(_))));
        }
    }

    #[tokio::test]
    async fn failed_execution_still_removes() {
        let fx = fixture();
        fx.chat.fail_with(Some(AdapterError::network("chat", "timed out")));
        let store = InMemoryProposalStore::new();
        let action = store
            .propose(ActionPayload::SendChatMessage { body: ChatDraft { message: "x".into(), channel: None } }, None)
            .await
            .unwrap();

        let err = fx.dispatcher.execute_by_id(&store, action.id()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Execution(_)));
        assert_eq!(store.count().await.unwrap(), 0);

        let again = fx.dispatcher.execute_by_id(&store, action.id()).await.unwrap_err();
        assert!(matches!(again, DispatchError::NotFound(_)));
    }

    #[tokio::test]
    async fn successful_execution_returns_executed_action() {
        let fx = fixture();
        let store = InMemoryProposalStore::new();
        let action = store
            .propose(ActionPayload::Create { body: json!({"summary": "Meeting with John Doe"}) }, None)
            .await
            .unwrap();

        let (taken, result) = fx.dispatcher.execute_by_id(&store, action.id()).await.unwrap();
        assert_eq!(taken.status(), actionstage_core::action::ActionStatus::Executed);
        assert_eq!(result["summary"], "Meeting with John Doe");
        assert_eq!(fx.calendar.events().len(), 1);
    }
}
