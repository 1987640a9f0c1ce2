//! Gmail adapter (Gmail API v1 over REST).

use actionstage_config::GoogleConfig;
use actionstage_core::action::EmailDraft;
use actionstage_core::adapter::{EmailSummary, Mail};
use actionstage_core::error::AdapterError;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use tracing::{debug, info};

use crate::http;

const SERVICE: &str = "mail";

pub struct Gmail {
    base_url: String,
    access_token: String,
    client: reqwest::Client,
}

impl Gmail {
    pub fn new(config: &GoogleConfig, access_token: impl Into<String>) -> Self {
        Self {
            base_url: http::trim_base(&config.gmail_url),
            access_token: access_token.into(),
            client: http::client(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/users/me/messages", self.base_url)
    }
}

/// Drafts may carry placeholders until reviewed; refuse to send those.
pub(crate) fn validate_draft(draft: &EmailDraft) -> Result<(), AdapterError> {
    let recipient = draft.recipient.trim();
    if recipient.contains(['\r', '\n']) {
        return Err(AdapterError::invalid_payload(
            SERVICE,
            "recipient must be a single address without line breaks",
        ));
    }
    if recipient.is_empty() || !recipient.contains('@') || recipient.starts_with('<') {
        return Err(AdapterError::invalid_payload(
            SERVICE,
            format!("recipient '{}' is not an email address", draft.recipient),
        ));
    }
    Ok(())
}

/// RFC 822 message, base64url-encoded for the `raw` field.
pub fn encode_raw_message(draft: &EmailDraft) -> String {
    let message = format!(
        "To: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=\"utf-8\"\r\n\r\n{}\r\n",
        draft.recipient.trim(),
        draft.subject.replace(['\r', '\n'], " "),
        draft.body
    );
    URL_SAFE.encode(message.as_bytes())
}

/// Build a summary from a `messages.get` response.
fn summarize(id: &str, detail: &serde_json::Value) -> EmailSummary {
    let header = |name: &str| -> Option<String> {
        detail
            .pointer("/payload/headers")
            .and_then(|h| h.as_array())
            .and_then(|headers| {
                headers
                    .iter()
                    .find(|h| h.get("name").and_then(|n| n.as_str()) == Some(name))
                    .and_then(|h| h.get("value").and_then(|v| v.as_str()))
                    .map(String::from)
            })
    };

    EmailSummary {
        id: id.to_string(),
        subject: header("Subject").unwrap_or_else(|| "No Subject".into()),
        sender: header("From").unwrap_or_else(|| "Unknown".into()),
        snippet: detail.get("snippet").and_then(|s| s.as_str()).unwrap_or_default().to_string(),
    }
}

#[async_trait]
impl Mail for Gmail {
    fn name(&self) -> &str {
        "gmail"
    }

    async fn read_emails(
        &self,
        query: Option<&str>,
        max_results: u32,
    ) -> Result<Vec<EmailSummary>, AdapterError> {
        let mut params = vec![("maxResults", max_results.to_string())];
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            params.push(("q", q.to_string()));
        }

        let listing = http::send_json(
            SERVICE,
            self.client
                .get(self.messages_url())
                .bearer_auth(&self.access_token)
                .query(&params),
        )
        .await?;

        let ids: Vec<String> = listing
            .get("messages")
            .and_then(|m| m.as_array())
            .map(|msgs| {
                msgs.iter()
                    .filter_map(|m| m.get("id").and_then(|id| id.as_str()).map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        debug!(count = ids.len(), "Fetching message headers");

        let mut summaries = Vec::with_capacity(ids.len());
        for id in ids {
            let detail = http::send_json(
                SERVICE,
                self.client
                    .get(http::with_segment(SERVICE, &self.messages_url(), &id)?)
                    .bearer_auth(&self.access_token)
                    .query(&[
                        ("format", "metadata"),
                        ("metadataHeaders", "Subject"),
                        ("metadataHeaders", "From"),
                    ]),
            )
            .await?;
            summaries.push(summarize(&id, &detail));
        }

        Ok(summaries)
    }

    async fn send_email(&self, draft: &EmailDraft) -> Result<serde_json::Value, AdapterError> {
        validate_draft(draft)?;
        info!(recipient = %draft.recipient, subject = %draft.subject, "Sending email");

        http::send_json(
            SERVICE,
            self.client
                .post(format!("{}/send", self.messages_url()))
                .bearer_auth(&self.access_token)
                .json(&serde_json::json!({ "raw": encode_raw_message(draft) })),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(recipient: &str) -> EmailDraft {
        EmailDraft {
            recipient: recipient.into(),
            subject: "Agenda".into(),
            body: "See you at 10.".into(),
        }
    }

    #[test]
    fn raw_message_decodes_to_rfc822() {
        let raw = encode_raw_message(&draft("jdoe@example.com"));
        let decoded = String::from_utf8(URL_SAFE.decode(raw).unwrap()).unwrap();
        assert!(decoded.starts_with("To: jdoe@example.com\r\nSubject: Agenda\r\n"));
        assert!(decoded.ends_with("\r\n\r\nSee you at 10.\r\n"));
    }

    #[test]
    fn placeholder_recipient_rejected() {
        assert!(validate_draft(&draft("jdoe@example.com")).is_ok());
        assert!(validate_draft(&draft("<unknown email for John Doe>")).is_err());
        assert!(validate_draft(&draft("")).is_err());
    }

    #[test]
    fn recipient_with_line_break_rejected() {
        for recipient in [
            "jdoe@example.com\r\nBcc: attacker@evil.test",
            "jdoe@example.com\nBcc: attacker@evil.test",
            "jdoe@example.com\rX-Injected: 1",
        ] {
            let err = validate_draft(&draft(recipient)).unwrap_err();
            assert!(matches!(err, AdapterError::InvalidPayload { .. }), "{recipient:?}");
        }
    }

    #[tokio::test]
    async fn send_refuses_header_injection() {
        let gmail = Gmail::new(&GoogleConfig::default(), "ya29.token");
        let err = gmail
            .send_email(&draft("jdoe@example.com\r\nBcc: attacker@evil.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidPayload { .. }));
    }

    #[test]
    fn summary_defaults_for_missing_headers() {
        let detail = serde_json::json!({
            "snippet": "Quick question",
            "payload": { "headers": [ { "name": "From", "value": "Jane <jane@example.com>" } ] }
        });
        let summary = summarize("m1", &detail);
        assert_eq!(summary.subject, "No Subject");
        assert_eq!(summary.sender, "Jane <jane@example.com>");
        assert_eq!(summary.snippet, "Quick question");

        let bare = summarize("m2", &serde_json::json!({}));
        assert_eq!(bare.sender, "Unknown");
        assert_eq!(bare.snippet, "");
    }
}
