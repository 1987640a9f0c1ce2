//! In-memory proposal store.

use actionstage_core::action::{Action, ActionId, ActionPayload};
use actionstage_core::error::StoreError;
use actionstage_core::proposal::ProposalStore;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

struct Inner {
    /// Pending Actions keyed by id.
    actions: HashMap<ActionId, Action>,
    /// Last `created_at` handed out; keeps timestamps strictly increasing.
    last_created: Option<DateTime<Utc>>,
}

/// Stores pending Actions in a keyed map behind one lock.
///
/// Every operation takes the lock once and never awaits while holding it,
/// so `take_for_execution` is a single critical section. `created_at` is
/// strictly increasing per store, so it doubles as the insertion order.
#[derive(Clone)]
pub struct InMemoryProposalStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryProposalStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                actions: HashMap::new(),
                last_created: None,
            })),
        }
    }
}

impl Default for InMemoryProposalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_created {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created = Some(stamp);
        stamp
    }

    fn take(&mut self, id: &ActionId) -> Result<Action, StoreError> {
        self.actions.remove(id).ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl ProposalStore for InMemoryProposalStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn propose(
        &self,
        payload: ActionPayload,
        original: Option<serde_json::Value>,
    ) -> Result<Action, StoreError> {
        let mut inner = self.inner.write().await;
        let created_at = inner.next_timestamp();
        let action = Action::pending(payload, original, created_at);
        debug!(action_id = %action.id(), kind = %action.kind(), "Action proposed");
        inner.actions.insert(action.id().clone(), action.clone());
        Ok(action)
    }

    async fn list(&self) -> Result<Vec<Action>, StoreError> {
        let mut actions: Vec<Action> = self.inner.read().await.actions.values().cloned().collect();
        actions.sort_by_key(|a| a.created_at());
        Ok(actions)
    }

    async fn get(&self, id: &ActionId) -> Result<Action, StoreError> {
        self.inner
            .read()
            .await
            .actions
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn update_payload(&self, id: &ActionId, payload: ActionPayload) -> Result<Action, StoreError> {
        let mut inner = self.inner.write().await;
        let action = inner
            .actions
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        action.replace_payload(payload)?;
        debug!(action_id = %id, kind = %action.kind(), "Action payload replaced");
        Ok(action.clone())
    }

    async fn remove(&self, id: &ActionId) -> Result<Action, StoreError> {
        let mut inner = self.inner.write().await;
        let action = inner.take(id)?.into_dismissed();
        debug!(action_id = %id, "Action dismissed");
        Ok(action)
    }

    async fn take_for_execution(&self, id: &ActionId) -> Result<Action, StoreError> {
        let mut inner = self.inner.write().await;
        let action = inner.take(id)?.into_executed();
        debug!(action_id = %id, kind = %action.kind(), "Action taken for execution");
        Ok(action)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.read().await.actions.len())
    }
}
