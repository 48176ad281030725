// handlers/movies/show.rs - GET /v1/movies/:id handler

use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, Authorized, MoviesRead};
use crate::state::AppState;

pub async fn show_movie(
    State(state): State<AppState>,
    _auth: Authorized<MoviesRead>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = super::parse_id(&id)?;
    let movie = state.store.get_movie(id).await?;
    Ok(ApiResponse::success(json!({ "movie": movie })))
}
