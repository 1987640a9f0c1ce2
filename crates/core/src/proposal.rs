//! ProposalStore trait — the registry of pending Actions.
//!
//! The store exclusively owns every live Action. Both terminal transitions
//! (`executed`, `dismissed`) remove the Action; no history is retained.
//!
//! Implementations: `InMemoryProposalStore` (actionstage-store). A persistent
//! backend can be substituted without touching callers.

use async_trait::async_trait;

use crate::action::{Action, ActionId, ActionPayload};
use crate::error::StoreError;

#[async_trait]
pub trait ProposalStore: Send + Sync {
    /// A human-readable name for this backend.
    fn name(&self) -> &str;

    /// Stage a new Action: fresh id, `status = pending`, `created_at = now`.
    async fn propose(
        &self,
        payload: ActionPayload,
        original: Option<serde_json::Value>,
    ) -> Result<Action, StoreError>;

    /// Snapshot of every pending Action, in insertion order.
    async fn list(&self) -> Result<Vec<Action>, StoreError>;

    async fn get(&self, id: &ActionId) -> Result<Action, StoreError>;

    /// Replace the payload of a pending Action. The kind must not change.
    async fn update_payload(&self, id: &ActionId, payload: ActionPayload) -> Result<Action, StoreError>;

    /// Dismiss and delete. Returns the dismissed Action.
    async fn remove(&self, id: &ActionId) -> Result<Action, StoreError>;

    /// Atomically retrieve and delete, so an Action is dispatched at most
    /// once. Concurrent callers on the same id: exactly one wins, the rest
    /// observe `NotFound`.
    async fn take_for_execution(&self, id: &ActionId) -> Result<Action, StoreError>;

    /// Number of pending Actions.
    async fn count(&self) -> Result<usize, StoreError>;
}
