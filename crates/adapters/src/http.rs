//! Request plumbing shared by the HTTP adapters.

use actionstage_core::error::AdapterError;
use reqwest::StatusCode;

pub(crate) fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// Send a prepared request and decode the JSON reply.
///
/// Non-2xx becomes `AdapterError::Api`; an empty body decodes to `Null`.
pub(crate) async fn send_json(
    service: &str,
    request: reqwest::RequestBuilder,
) -> Result<serde_json::Value, AdapterError> {
    let response = request.send().await.map_err(|e| AdapterError::network(service, e))?;
    let status = response.status();

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        tracing::warn!(service, status = status.as_u16(), body = %message, "Adapter call failed");
        return Err(AdapterError::Api {
            service: service.into(),
            status: status.as_u16(),
            message,
        });
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(serde_json::Value::Null);
    }

    let text = response.text().await.map_err(|e| AdapterError::network(service, e))?;
    if text.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }

    serde_json::from_str(&text).map_err(|e| AdapterError::Api {
        service: service.into(),
        status: status.as_u16(),
        message: format!("unparseable response: {e}"),
    })
}

/// Append one id as a single path segment. `/`, `?` and `#` are
/// percent-encoded; ids that would navigate (`.`, `..`, empty) are refused.
pub(crate) fn with_segment(service: &str, base: &str, id: &str) -> Result<reqwest::Url, AdapterError> {
    if matches!(id.trim(), "" | "." | "..") {
        return Err(AdapterError::invalid_payload(service, format!("'{id}' is not a valid id")));
    }
    let mut url = reqwest::Url::parse(base)
        .map_err(|e| AdapterError::invalid_payload(service, format!("bad base URL '{base}': {e}")))?;
    url.path_segments_mut()
        .map_err(|_| AdapterError::invalid_payload(service, format!("base URL '{base}' cannot carry a path")))?
        .pop_if_empty()
        .push(id);
    Ok(url)
}

pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_is_escaped_in_place() {
        let url = with_segment("calendar", "https://example.com/v3/events", "a/b?c#d").unwrap();
        assert_eq!(url.path(), "/v3/events/a%2Fb%3Fc%23d");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[test]
    fn navigating_ids_refused() {
        for id in ["", ".", "..", "  "] {
            let err = with_segment("calendar", "https://example.com/v3/events", id).unwrap_err();
            assert!(matches!(err, AdapterError::InvalidPayload { .. }), "{id:?}");
        }
    }
}
