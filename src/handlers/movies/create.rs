// handlers/movies/create.rs - POST /v1/movies handler

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::HeaderMap,
};
use serde_json::{json, Value};

use crate::api::{buffered, read_new_movie};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Authorized, MoviesWrite};
use crate::state::AppState;
use crate::validator::Validator;

pub async fn create_movie(
    State(state): State<AppState>,
    auth: Authorized<MoviesWrite>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Value> {
    let body = buffered(body)?;
    let movie = read_new_movie(&headers, &body)?;

    let mut v = Validator::new();
    movie.validate(&mut v);
    v.finish().map_err(ApiError::FailedValidation)?;

    let movie = state.store.create_movie(movie).await?;
    tracing::info!("User {} created movie {}", auth.user.id, movie.id);

    let location = super::location(movie.id);
    Ok(ApiResponse::success(json!({ "movie": movie })).with_location(location))
}
