//! Propose tools for outbound messages: email, issues, chat.

use actionstage_core::action::{ActionPayload, ChatDraft, EmailDraft, IssueDraft};
use actionstage_core::error::ToolError;
use actionstage_core::tool::{Tool, ToolClass, ToolResult};
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::stage::Stager;

fn required(arguments: &Value, key: &str) -> Result<String, ToolError> {
    arguments[key]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(String::from)
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

fn optional(arguments: &Value, key: &str) -> Option<String> {
    arguments[key]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(String::from)
}

pub struct SendEmailTool {
    stager: Stager,
}

impl SendEmailTool {
    pub fn new(stager: Stager) -> Self {
        Self { stager }
    }
}

#[async_trait]
impl Tool for SendEmailTool {
    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Propose an email. The draft is staged for human review, not sent. Resolve the recipient with get_contacts first; if it cannot be resolved use a placeholder like '<unknown email for John Doe>'."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "recipient": {
                    "type": "string",
                    "description": "Recipient email address or placeholder"
                },
                "subject": {
                    "type": "string",
                    "description": "Subject line"
                },
                "body": {
                    "type": "string",
                    "description": "Plain-text message body"
                }
            },
            "required": ["recipient", "subject", "body"]
        })
    }

    fn class(&self) -> ToolClass {
        ToolClass::Propose
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let draft = EmailDraft {
            recipient: required(&arguments, "recipient")?,
            subject: optional(&arguments, "subject").unwrap_or_default(),
            body: required(&arguments, "body")?,
        };
        self.stager
            .stage(self.name(), ActionPayload::SendEmail { body: draft }, None)
            .await
    }
}

pub struct CreateIssueTool {
    stager: Stager,
}

impl CreateIssueTool {
    pub fn new(stager: Stager) -> Self {
        Self { stager }
    }
}

#[async_trait]
impl Tool for CreateIssueTool {
    fn name(&self) -> &str {
        "create_issue"
    }

    fn description(&self) -> &str {
        "Propose a new issue in the team's tracker for a bug or task raised in the conversation. Staged for human review."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "summary": {
                    "type": "string",
                    "description": "One-line issue title"
                },
                "description": {
                    "type": "string",
                    "description": "Details, steps or acceptance criteria"
                }
            },
            "required": ["summary"]
        })
    }

    fn class(&self) -> ToolClass {
        ToolClass::Propose
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let draft = IssueDraft {
            summary: required(&arguments, "summary")?,
            description: optional(&arguments, "description").unwrap_or_default(),
        };
        self.stager
            .stage(self.name(), ActionPayload::CreateIssue { body: draft }, None)
            .await
    }
}

pub struct SendChatMessageTool {
    stager: Stager,
}

impl SendChatMessageTool {
    pub fn new(stager: Stager) -> Self {
        Self { stager }
    }
}

#[async_trait]
impl Tool for SendChatMessageTool {
    fn name(&self) -> &str {
        "send_chat_message"
    }

    fn description(&self) -> &str {
        "Propose a message to the team chat. Staged for human review, not posted."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "Message text"
                },
                "channel": {
                    "type": "string",
                    "description": "Target channel; defaults to the team channel"
                }
            },
            "required": ["message"]
        })
    }

    fn class(&self) -> ToolClass {
        ToolClass::Propose
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let draft = ChatDraft {
            message: required(&arguments, "message")?,
            channel: optional(&arguments, "channel"),
        };
        self.stager
            .stage(self.name(), ActionPayload::SendChatMessage { body: draft }, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actionstage_adapters::Capabilities;
    use actionstage_core::proposal::ProposalStore;
    use actionstage_store::InMemoryProposalStore;
    use std::sync::Arc;

    fn stager() -> (Arc<InMemoryProposalStore>, Stager) {
        let store = Arc::new(InMemoryProposalStore::new());
        (store.clone(), Stager::new(store, Capabilities::in_memory()))
    }

    #[tokio::test]
    async fn email_accepts_placeholder_recipient() {
        let (store, stager) = stager();
        let result = SendEmailTool::new(stager)
            .execute(json!({
                "recipient": "<unknown email for John Doe>",
                "subject": "April 1st meeting",
                "body": "Confirming 10:00 AM."
            }))
            .await
            .unwrap();

        let data = result.data.unwrap();
        assert_eq!(data["action"], "send_email");
        assert_eq!(data["body"]["recipient"], "<unknown email for John Doe>");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn email_missing_body_is_invalid() {
        let (store, stager) = stager();
        let err = SendEmailTool::new(stager)
            .execute(json!({"recipient": "jdoe@example.com", "subject": "Hi"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(msg) if msg.contains("body")));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn issue_description_is_optional() {
        let (_, stager) = stager();
        let data = CreateIssueTool::new(stager)
            .execute(json!({"summary": "Login page times out"}))
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(data["action"], "create_issue");
        assert_eq!(data["body"], json!({"summary": "Login page times out", "description": ""}));
    }

    #[tokio::test]
    async fn chat_channel_carried_when_given() {
        let (store, stager) = stager();
        let tool = SendChatMessageTool::new(stager);

        tool.execute(json!({"message": "Demo moved to 3pm", "channel": "#eng"})).await.unwrap();
        tool.execute(json!({"message": "Standup cancelled"})).await.unwrap();

        let staged = store.list().await.unwrap();
        match (staged[0].payload(), staged[1].payload()) {
            (ActionPayload::SendChatMessage { body: a }, ActionPayload::SendChatMessage { body: b }) => {
                assert_eq!(a.channel.as_deref(), Some("#eng"));
                assert!(b.channel.is_none());
            }
            other => panic!("unexpected payloads: {other:?}"),
        }
    }
}
