//! Slack adapter (Web API `chat.postMessage`).

use actionstage_config::SlackConfig;
use actionstage_core::action::ChatDraft;
use actionstage_core::adapter::Chat;
use actionstage_core::error::AdapterError;
use async_trait::async_trait;
use tracing::info;

use crate::http;

const SERVICE: &str = "chat";

pub struct SlackChat {
    api_url: String,
    bot_token: String,
    channel: String,
    client: reqwest::Client,
}

impl SlackChat {
    pub fn new(config: &SlackConfig, bot_token: impl Into<String>) -> Self {
        Self {
            api_url: http::trim_base(&config.api_url),
            bot_token: bot_token.into(),
            channel: config.channel.clone(),
            client: http::client(),
        }
    }
}

/// The draft's channel wins over the configured default.
pub(crate) fn target_channel<'a>(draft: &'a ChatDraft, default: &'a str) -> &'a str {
    draft
        .channel
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(default)
}

pub(crate) fn validate_draft(draft: &ChatDraft) -> Result<(), AdapterError> {
    if draft.message.trim().is_empty() {
        return Err(AdapterError::invalid_payload(SERVICE, "message text is empty"));
    }
    Ok(())
}

/// Slack reports failures as `200 {"ok": false, "error": "..."}`.
fn interpret_reply(reply: &serde_json::Value) -> Result<serde_json::Value, AdapterError> {
    if reply.get("ok").and_then(|ok| ok.as_bool()) == Some(true) {
        Ok(serde_json::json!({
            "status": "success",
            "ts": reply.get("ts").cloned().unwrap_or_default(),
        }))
    } else {
        Err(AdapterError::Api {
            service: SERVICE.into(),
            status: 200,
            message: reply
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unknown_error")
                .to_string(),
        })
    }
}

#[async_trait]
impl Chat for SlackChat {
    fn name(&self) -> &str {
        "slack"
    }

    async fn send_message(&self, draft: &ChatDraft) -> Result<serde_json::Value, AdapterError> {
        validate_draft(draft)?;
        let channel = target_channel(draft, &self.channel);
        info!(channel, "Posting chat message");

        let reply = http::send_json(
            SERVICE,
            self.client
                .post(format!("{}/chat.postMessage", self.api_url))
                .bearer_auth(&self.bot_token)
                .json(&serde_json::json!({ "channel": channel, "text": draft.message })),
        )
        .await?;

        interpret_reply(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_channel_overrides_default() {
        let mut draft = ChatDraft { message: "Standup moved".into(), channel: None };
        assert_eq!(target_channel(&draft, "#all-hackathon"), "#all-hackathon");
        draft.channel = Some("#eng".into());
        assert_eq!(target_channel(&draft, "#all-hackathon"), "#eng");
    }

    #[test]
    fn ok_false_is_an_error() {
        let ok = interpret_reply(&serde_json::json!({"ok": true, "ts": "1712.0001"})).unwrap();
        assert_eq!(ok["status"], "success");
        assert_eq!(ok["ts"], "1712.0001");

        let err = interpret_reply(&serde_json::json!({"ok": false, "error": "channel_not_found"})).unwrap_err();
        assert!(err.to_string().contains("channel_not_found"));
    }
}
