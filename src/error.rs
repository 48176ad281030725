// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::{AuthError, PolicyError};
use crate::database::StoreError;
use crate::validator::FieldError;

const INTERNAL_MESSAGE: &str = "the server encountered a problem and could not process your request";

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Every variant renders as `{"error": <message or field list>}`.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    InvalidInput(Vec<FieldError>),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 405 Method Not Allowed
    MethodNotAllowed(String),

    // 409 Conflict
    EditConflict,

    // 413 Payload Too Large
    PayloadTooLarge,

    // 415 Unsupported Media Type
    UnsupportedMediaType,

    // 422 Unprocessable Entity
    FailedValidation(Vec<FieldError>),

    // 429 Too Many Requests
    TooManyRequests,

    // 500 Internal Server Error
    Internal,
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::InvalidInput(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::MethodNotAllowed(_) => 405,
            ApiError::EditConflict => 409,
            ApiError::PayloadTooLarge => 413,
            ApiError::UnsupportedMediaType => 415,
            ApiError::FailedValidation(_) => 422,
            ApiError::TooManyRequests => 429,
            ApiError::Internal => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::InvalidInput(_) => "invalid input",
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::MethodNotAllowed(msg) => msg,
            ApiError::EditConflict => "unable to update the record due to an edit conflict, please try again",
            ApiError::PayloadTooLarge => "request body too large",
            ApiError::UnsupportedMediaType => "Content-Type header must be application/json",
            ApiError::FailedValidation(_) => "failed validation",
            ApiError::TooManyRequests => "rate limit exceeded",
            ApiError::Internal => INTERNAL_MESSAGE,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::InvalidInput(errors) | ApiError::FailedValidation(errors) => {
                json!({ "error": errors })
            }
            _ => json!({ "error": self.message() }),
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found() -> Self {
        ApiError::NotFound("the requested resource could not be found".to_string())
    }

    /// Single `{field: "invalid value"}` decode failure
    pub fn invalid_field(field: &str) -> Self {
        ApiError::InvalidInput(vec![FieldError::invalid_value(field)])
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::not_found(),
            StoreError::EditConflict => ApiError::EditConflict,
            StoreError::Timeout { operation, after } => {
                tracing::error!("Store operation {} timed out after {:?}", operation, after);
                ApiError::Internal
            }
            StoreError::Unavailable(e) => {
                // Log the real error but return generic message
                tracing::error!("Store unavailable: {}", e);
                ApiError::Internal
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                tracing::warn!("Authentication failed: {}", err);
                ApiError::unauthorized(err.to_string())
            }
            AuthError::BackendUnavailable(detail) => {
                tracing::error!("Token authority unavailable: {}", detail);
                ApiError::Internal
            }
        }
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Unauthorized => ApiError::unauthorized(err.to_string()),
            PolicyError::Inactive | PolicyError::NotPermitted => ApiError::forbidden(err.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self.to_json())).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(axum::http::header::WWW_AUTHENTICATE, axum::http::HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn field_lists_render_under_error_key() {
        let err = ApiError::FailedValidation(vec![FieldError::new("page", "page must be greater than 0")]);
        assert_eq!(err.status_code(), 422);
        assert_eq!(
            err.to_json(),
            json!({"error": [{"field": "page", "message": "page must be greater than 0"}]})
        );
    }

    #[test]
    fn store_outcomes_map_to_statuses() {
        assert_eq!(ApiError::from(StoreError::NotFound).status_code(), 404);
        assert_eq!(ApiError::from(StoreError::EditConflict).status_code(), 409);

        let timeout = ApiError::from(StoreError::Timeout {
            operation: "get_movie",
            after: Duration::from_secs(3),
        });
        assert_eq!(timeout.status_code(), 500);
        assert_eq!(timeout.to_json(), json!({ "error": INTERNAL_MESSAGE }));
    }

    #[test]
    fn auth_outcomes_map_to_statuses() {
        assert_eq!(ApiError::from(AuthError::InvalidToken).status_code(), 401);
        assert_eq!(ApiError::from(AuthError::InvalidCredentials).status_code(), 401);
        let backend = ApiError::from(AuthError::BackendUnavailable("dial tcp: refused".into()));
        assert_eq!(backend.status_code(), 500);
        assert!(!backend.message().contains("refused"));

        assert_eq!(ApiError::from(PolicyError::Unauthorized).status_code(), 401);
        assert_eq!(ApiError::from(PolicyError::Inactive).status_code(), 403);
        assert_eq!(ApiError::from(PolicyError::NotPermitted).status_code(), 403);
    }
}
