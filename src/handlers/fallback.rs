// handlers/fallback.rs - unknown routes and unsupported methods

use axum::http::Method;

use crate::error::ApiError;

pub async fn not_found() -> ApiError {
    ApiError::not_found()
}

pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(format!("the {} method is not supported for this resource", method))
}
