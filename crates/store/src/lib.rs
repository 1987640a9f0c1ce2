//! Proposal store backends for actionstage.
//!
//! - `in_memory` — process-local registry; everything is lost on restart

pub mod in_memory;

pub use in_memory::InMemoryProposalStore;
