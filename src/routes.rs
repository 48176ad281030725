use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{self, fallback::method_not_allowed, movies};
use crate::middleware::{authenticate, rate_limit};
use crate::state::AppState;

/// Full application router.
///
/// Request path, outermost first: trace, CORS, body limit, rate limit,
/// authentication, then the route's own `Authorized` permission check.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config.security);

    Router::new()
        .route(
            "/v1/healthcheck",
            get(handlers::healthcheck).fallback(method_not_allowed),
        )
        .merge(movie_routes())
        .fallback(handlers::fallback::not_found)
        // Global middleware
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(from_fn_with_state(state.clone(), rate_limit))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn movie_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/movies",
            get(movies::list_movies)
                .post(movies::create_movie)
                .fallback(method_not_allowed),
        )
        .route(
            "/v1/movies/:id",
            get(movies::show_movie)
                .patch(movies::update_movie)
                .delete(movies::delete_movie)
                .fallback(method_not_allowed),
        )
}

/// Trusted origins only; an empty list disables cross-origin access
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
