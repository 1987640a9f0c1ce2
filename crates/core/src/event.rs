//! Domain event system — lets observers follow the proposal lifecycle
//! without coupling to the store, the dispatcher or the loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::action::ActionKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A propose tool or the HTTP surface staged an Action
    ActionProposed {
        action_id: String,
        kind: ActionKind,
        timestamp: DateTime<Utc>,
    },

    /// A pending Action's payload was replaced
    ActionUpdated {
        action_id: String,
        kind: ActionKind,
        timestamp: DateTime<Utc>,
    },

    ActionDismissed {
        action_id: String,
        kind: ActionKind,
        timestamp: DateTime<Utc>,
    },

    /// An Action was removed from the store and dispatched
    ActionExecuted {
        action_id: String,
        kind: ActionKind,
        success: bool,
        timestamp: DateTime<Utc>,
    },

    ToolExecuted {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// One model round-trip completed
    ResponseGenerated {
        conversation_id: String,
        model: String,
        tokens_used: u32,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
