// handlers/movies/delete.rs - DELETE /v1/movies/:id handler

use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, Authorized, MoviesWrite};
use crate::state::AppState;

pub async fn delete_movie(
    State(state): State<AppState>,
    auth: Authorized<MoviesWrite>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = super::parse_id(&id)?;
    state.store.delete_movie(id).await?;
    tracing::info!("User {} deleted movie {}", auth.user.id, id);

    Ok(ApiResponse::success(json!({ "message": "movie successfully deleted" })))
}
