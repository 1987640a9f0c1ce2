//! Shared staging path for every propose tool.

use std::sync::Arc;

use actionstage_adapters::Capabilities;
use actionstage_core::action::ActionPayload;
use actionstage_core::error::ToolError;
use actionstage_core::event::{DomainEvent, EventBus};
use actionstage_core::proposal::ProposalStore;
use actionstage_core::tool::ToolResult;
use tracing::info;

/// Puts Actions into the ProposalStore on behalf of propose tools.
#[derive(Clone)]
pub struct Stager {
    store: Arc<dyn ProposalStore>,
    capabilities: Capabilities,
    events: Option<Arc<EventBus>>,
}

impl Stager {
    pub fn new(store: Arc<dyn ProposalStore>, capabilities: Capabilities) -> Self {
        Self {
            store,
            capabilities,
            events: None,
        }
    }

    /// Publish `ActionProposed` on this bus for every staged Action.
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn store(&self) -> &Arc<dyn ProposalStore> {
        &self.store
    }

    /// Stage `payload` and describe the result for the model.
    ///
    /// The returned `data` is the staged Action in its wire form.
    pub async fn stage(
        &self,
        tool_name: &str,
        payload: ActionPayload,
        original: Option<serde_json::Value>,
    ) -> Result<ToolResult, ToolError> {
        let summary = payload.summary();
        let action = self
            .store
            .propose(payload, original)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: tool_name.to_string(),
                reason: e.to_string(),
            })?;

        info!(action_id = %action.id(), kind = %action.kind(), tool = tool_name, "Action staged");

        if let Some(events) = &self.events {
            events.publish(DomainEvent::ActionProposed {
                action_id: action.id().to_string(),
                kind: action.kind(),
                timestamp: action.created_at(),
            });
        }

        let data = serde_json::to_value(&action).map_err(|e| ToolError::ExecutionFailed {
            tool_name: tool_name.to_string(),
            reason: e.to_string(),
        })?;

        Ok(ToolResult::ok(
            String::new(),
            format!(
                "Staged for review as {}: {summary}. It has NOT been executed.",
                action.id()
            ),
        )
        .with_data(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actionstage_core::action::ChatDraft;
    use actionstage_store::InMemoryProposalStore;

    #[tokio::test]
    async fn stage_inserts_and_reports() {
        let store = Arc::new(InMemoryProposalStore::new());
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let stager = Stager::new(store.clone(), Capabilities::in_memory()).with_events(bus);

        let result = stager
            .stage(
                "send_chat_message",
                ActionPayload::SendChatMessage {
                    body: ChatDraft { message: "Demo at 3".into(), channel: None },
                },
                None,
            )
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.output.contains("NOT been executed"));
        let data = result.data.unwrap();
        assert_eq!(data["action"], "send_chat_message");
        assert_eq!(data["status"], "pending");
        assert_eq!(store.count().await.unwrap(), 1);

        let event = rx.recv().await.unwrap();
        assert!(matches!(&*event, DomainEvent::ActionProposed { action_id, .. } if *action_id == data["uuid"]));
    }
}
