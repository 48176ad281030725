// handlers/movies/list.rs - GET /v1/movies handler

use axum::extract::{rejection::QueryRejection, Query, State};
use serde_json::{json, Value};

use crate::api::ListQuery;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Authorized, MoviesRead};
use crate::state::AppState;

pub async fn list_movies(
    State(state): State<AppState>,
    _auth: Authorized<MoviesRead>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Value> {
    let Query(query) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let query = query.decode()?;

    let (movies, metadata) = state
        .store
        .get_all_movies(&query.title, &query.genres, &query.filters)
        .await?;

    Ok(ApiResponse::success(json!({
        "movies": movies,
        "metadata": metadata,
    })))
}
