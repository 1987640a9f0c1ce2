use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use actionstage_adapters::DispatchError;
use actionstage_core::error::StoreError;

/// Error type for the action endpoints. Renders as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            StoreError::KindMismatch { .. } => ApiError::BadRequest(err.to_string()),
            StoreError::Backend(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::NotFound(store) => store.into(),
            DispatchError::Execution(exec) => ApiError::Internal(exec.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actionstage_core::action::ActionKind;
    use actionstage_core::error::ExecutionError;

    #[test]
    fn store_errors_map_to_status() {
        assert_eq!(ApiError::from(StoreError::NotFound("x".into())).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(StoreError::KindMismatch {
                expected: ActionKind::Create,
                found: ActionKind::Delete
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn execution_failure_is_500() {
        let err = ApiError::from(DispatchError::Execution(ExecutionError {
            kind: ActionKind::SendEmail,
            message: "mail API returned 403: forbidden".into(),
        }));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("403"));
    }
}
