use axum::{
    extract::rejection::JsonRejection,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::store::StoreError;

/// A failed request, rendered as `{"message": ...}` with `status`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Note not found")
    }

    /// Validation errors are always 400; other store faults get the status
    /// the calling endpoint reports them with.
    pub fn from_store(err: StoreError, fault_status: StatusCode) -> Self {
        match err {
            StoreError::Validation(message) => Self::bad_request(message),
            StoreError::Database(e) => Self::new(fault_status, e.to_string()),
        }
    }
}

/// Unreadable or mistyped bodies are validation failures; only body-level
/// faults such as an oversized payload keep their own status.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match &rejection {
            JsonRejection::JsonDataError(_)
            | JsonRejection::JsonSyntaxError(_)
            | JsonRejection::MissingJsonContentType(_) => StatusCode::BAD_REQUEST,
            _ => rejection.status(),
        };
        Self::new(status, rejection.body_text())
    }
}

/// Replaces the router's empty 405 body with a `{message}` one, keeping `Allow`.
pub async fn json_method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }
    let mut rebuilt = ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
        .into_response();
    if let Some(allow) = response.headers().get(header::ALLOW) {
        rebuilt.headers_mut().insert(header::ALLOW, allow.clone());
    }
    rebuilt
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "message": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_endpoint_status() {
        let validation = ApiError::from_store(
            StoreError::Validation("bad".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        );
        assert_eq!(validation.status, StatusCode::BAD_REQUEST);

        let fault = ApiError::from_store(
            StoreError::Database(sqlx::Error::PoolTimedOut),
            StatusCode::INTERNAL_SERVER_ERROR,
        );
        assert_eq!(fault.status, StatusCode::INTERNAL_SERVER_ERROR);

        let write_fault = ApiError::from_store(
            StoreError::Database(sqlx::Error::PoolTimedOut),
            StatusCode::BAD_REQUEST,
        );
        assert_eq!(write_fault.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn other_statuses_pass_through_untouched() {
        let response = ApiError::not_found().into_response();
        let response = json_method_not_allowed(response).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
