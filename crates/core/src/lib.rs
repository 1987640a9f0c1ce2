//! # actionstage core
//!
//! Domain types, traits, and error definitions for the actionstage runtime.
//! This crate has **no framework dependencies** — it defines the domain model
//! that every other crate implements against.
//!
//! ## Layout
//!
//! - [`action`]: the staged side effect (`Action`) and the alternation rule
//! - [`proposal`]: the `ProposalStore` seam that owns live Actions
//! - [`adapter`]: one capability trait per external backend
//! - [`provider`] / [`message`] / [`tool`]: the model client and its tool protocol
//! - [`transcript`]: the inbound conversation that proposals are extracted from
//! - [`event`]: domain events for observers

pub mod action;
pub mod adapter;
pub mod error;
pub mod event;
pub mod message;
pub mod proposal;
pub mod provider;
pub mod tool;
pub mod transcript;

// Re-export key types at crate root for ergonomics
pub use action::{Action, ActionId, ActionKind, ActionPayload, ActionStatus, Alternation, define_alternation};
pub use adapter::{Calendar, Chat, Contacts, IssueTracker, Mail};
pub use error::{AdapterError, Error, ExecutionError, ProviderError, Result, StoreError, ToolError};
pub use event::{DomainEvent, EventBus};
pub use message::{Conversation, ConversationId, Message, MessageToolCall, Role};
pub use proposal::ProposalStore;
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
pub use tool::{Tool, ToolCall, ToolClass, ToolRegistry, ToolResult};
pub use transcript::{Transcript, TranscriptMessage};
