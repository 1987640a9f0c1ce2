//! Jira adapter (REST API v2, basic auth with an API token).

use actionstage_config::JiraConfig;
use actionstage_core::action::IssueDraft;
use actionstage_core::adapter::IssueTracker;
use actionstage_core::error::AdapterError;
use async_trait::async_trait;
use tracing::info;

use crate::http;

const SERVICE: &str = "issue_tracker";

pub struct JiraTracker {
    server: String,
    user: String,
    api_token: String,
    project: String,
    issue_type_id: String,
    client: reqwest::Client,
}

impl JiraTracker {
    /// Returns `None` unless server, user and token are all configured.
    pub fn from_config(config: &JiraConfig) -> Option<Self> {
        Some(Self {
            server: http::trim_base(config.server.as_deref()?),
            user: config.user.clone()?,
            api_token: config.api_token.clone()?,
            project: config.project.clone(),
            issue_type_id: config.issue_type_id.clone(),
            client: http::client(),
        })
    }

    fn issue_body(&self, draft: &IssueDraft) -> serde_json::Value {
        serde_json::json!({
            "fields": {
                "project": { "key": self.project },
                "summary": draft.summary,
                "description": draft.description,
                "issuetype": { "id": self.issue_type_id },
            }
        })
    }
}

pub(crate) fn validate_draft(draft: &IssueDraft) -> Result<(), AdapterError> {
    if draft.summary.trim().is_empty() {
        return Err(AdapterError::invalid_payload(SERVICE, "issue summary is empty"));
    }
    Ok(())
}

#[async_trait]
impl IssueTracker for JiraTracker {
    fn name(&self) -> &str {
        "jira"
    }

    async fn create_issue(&self, draft: &IssueDraft) -> Result<serde_json::Value, AdapterError> {
        validate_draft(draft)?;
        info!(project = %self.project, summary = %draft.summary, "Creating issue");

        let created = http::send_json(
            SERVICE,
            self.client
                .post(format!("{}/rest/api/2/issue", self.server))
                .basic_auth(&self.user, Some(&self.api_token))
                .json(&self.issue_body(draft)),
        )
        .await?;

        Ok(serde_json::json!({
            "status": "success",
            "key": created.get("key").cloned().unwrap_or_default(),
            "id": created.get("id").cloned().unwrap_or_default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JiraConfig {
        JiraConfig {
            server: Some("https://example.atlassian.net/".into()),
            user: Some("bot@example.com".into()),
            api_token: Some("token".into()),
            ..JiraConfig::default()
        }
    }

    #[test]
    fn incomplete_config_yields_none() {
        let mut partial = config();
        partial.api_token = None;
        assert!(JiraTracker::from_config(&partial).is_none());
        assert!(JiraTracker::from_config(&config()).is_some());
    }

    #[test]
    fn body_targets_configured_project() {
        let tracker = JiraTracker::from_config(&config()).unwrap();
        assert_eq!(tracker.server, "https://example.atlassian.net");
        let body = tracker.issue_body(&IssueDraft {
            summary: "Fix login".into(),
            description: "Users are logged out".into(),
        });
        assert_eq!(body["fields"]["project"]["key"], "SCRUM");
        assert_eq!(body["fields"]["issuetype"]["id"], "10001");
        assert_eq!(body["fields"]["summary"], "Fix login");
    }

    #[test]
    fn empty_summary_rejected() {
        assert!(validate_draft(&IssueDraft::default()).is_err());
    }
}
