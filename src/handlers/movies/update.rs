// handlers/movies/update.rs - PATCH /v1/movies/:id handler

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, State},
    http::HeaderMap,
};
use serde_json::{json, Value};

use crate::api::{buffered, read_movie_patch};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Authorized, MoviesWrite};
use crate::state::AppState;
use crate::validator::Validator;

/// Read-modify-write under the version check. A `version` in the body
/// replaces the version just read, so a client holding a stale copy gets 409.
pub async fn update_movie(
    State(state): State<AppState>,
    auth: Authorized<MoviesWrite>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Value> {
    let id = super::parse_id(&id)?;
    let body = buffered(body)?;
    let patch = read_movie_patch(&headers, &body)?;

    let mut movie = state.store.get_movie(id).await?;
    patch.apply(&mut movie);

    let mut v = Validator::new();
    movie.validate(&mut v);
    v.finish().map_err(ApiError::FailedValidation)?;

    let movie = state.store.update_movie(movie).await.map_err(|err| {
        if matches!(err, crate::database::StoreError::EditConflict) {
            tracing::warn!("Edit conflict updating movie {} for user {}", id, auth.user.id);
        }
        ApiError::from(err)
    })?;

    Ok(ApiResponse::success(json!({ "movie": movie })))
}
