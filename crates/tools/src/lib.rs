//! The tools the extraction model may call.
//!
//! Two classes:
//! - read tools (`list_calendar_events`, `read_emails`, `get_contacts`) query
//!   a capability and return data
//! - propose tools (`create/update/delete_calendar_event`, `send_email`,
//!   `create_issue`, `send_chat_message`) stage an Action for review
//!
//! Nothing here executes a side effect; that is the dispatcher's job.

pub mod calendar;
pub mod messaging;
pub mod read;
pub mod stage;

use actionstage_core::tool::ToolRegistry;

pub use stage::Stager;

/// Build the full tool manifest.
///
/// Read tools use the stager's capabilities; propose tools stage through it.
/// `time_zone` is applied to event times that carry no zone of their own.
pub fn default_registry(stager: Stager, time_zone: &str) -> ToolRegistry {
    let caps = stager.capabilities().clone();
    let mut registry = ToolRegistry::new();

    registry.register(Box::new(read::ListCalendarEventsTool::new(caps.calendar)));
    registry.register(Box::new(read::ReadEmailsTool::new(caps.mail)));
    registry.register(Box::new(read::GetContactsTool::new(caps.contacts)));

    registry.register(Box::new(calendar::CreateCalendarEventTool::new(stager.clone(), time_zone)));
    registry.register(Box::new(calendar::UpdateCalendarEventTool::new(stager.clone(), time_zone)));
    registry.register(Box::new(calendar::DeleteCalendarEventTool::new(stager.clone())));
    registry.register(Box::new(messaging::SendEmailTool::new(stager.clone())));
    registry.register(Box::new(messaging::CreateIssueTool::new(stager.clone())));
    registry.register(Box::new(messaging::SendChatMessageTool::new(stager)));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use actionstage_adapters::Capabilities;
    use actionstage_core::tool::ToolClass;
    use actionstage_store::InMemoryProposalStore;
    use std::sync::Arc;

    fn registry() -> ToolRegistry {
        let stager = Stager::new(Arc::new(InMemoryProposalStore::new()), Capabilities::in_memory());
        default_registry(stager, "America/New_York")
    }

    #[test]
    fn registry_splits_read_and_propose() {
        let registry = registry();
        assert_eq!(registry.len(), 9);

        for name in ["list_calendar_events", "read_emails", "get_contacts"] {
            assert_eq!(registry.class_of(name), Some(ToolClass::Read), "{name}");
        }
        for name in [
            "create_calendar_event",
            "update_calendar_event",
            "delete_calendar_event",
            "send_email",
            "create_issue",
            "send_chat_message",
        ] {
            assert_eq!(registry.class_of(name), Some(ToolClass::Propose), "{name}");
        }
    }

    #[test]
    fn every_schema_declares_properties() {
        for def in registry().definitions() {
            assert_eq!(def.parameters["type"], "object", "{}", def.name);
            let props = def.parameters["properties"].as_object().unwrap();
            assert!(!props.is_empty(), "{} has no properties", def.name);
        }
    }
}
