mod common;

use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use movies_api::auth::{AuthError, Authenticator, HttpTokenVerifier, Identity, TokenVerifier, VerifyError};
use movies_api::config::AppConfig;
use movies_api::middleware::RateLimiter;
use movies_api::testing::{init_tracing, MemoryMovieStore};
use movies_api::{app, AppState};

use common::{get, send};

async fn verify(Json(body): Json<Value>) -> Response {
    match body["token"].as_str() {
        Some("good") => Json(json!({"id": 9, "activated": true, "permissions": ["movies:read"]})).into_response(),
        Some("inactive") => Json(json!({"id": 10, "activated": false, "permissions": ["movies:read"]})).into_response(),
        Some("malformed") => (StatusCode::BAD_REQUEST, "token must be 26 bytes long").into_response(),
        Some("slow") => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            StatusCode::UNAUTHORIZED.into_response()
        }
        Some("crash") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

/// Serve a fake token authority on a free local port
async fn spawn_authority() -> Result<String> {
    init_tracing();
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    let authority = Router::new().route("/v1/tokens/verify", post(verify));
    tokio::spawn(async move { axum::serve(listener, authority).await });
    Ok(format!("http://127.0.0.1:{}", port))
}

#[tokio::test]
async fn authority_responses_map_to_outcomes() -> Result<()> {
    let base = spawn_authority().await?;
    let verifier = HttpTokenVerifier::new(&base, Duration::from_secs(2))?;

    let user = verifier.verify_token("good").await?;
    assert_eq!(user.id, 9);
    assert!(user.activated);
    assert!(user.has_permission("movies:read"));

    assert_eq!(verifier.verify_token("expired").await, Err(VerifyError::Unauthenticated));
    assert!(matches!(verifier.verify_token("malformed").await, Err(VerifyError::InvalidArgument(_))));
    assert!(matches!(verifier.verify_token("crash").await, Err(VerifyError::Other(_))));
    Ok(())
}

#[tokio::test]
async fn unreachable_or_slow_authority_is_backend_unavailable() -> Result<()> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let verifier = HttpTokenVerifier::new(&format!("http://127.0.0.1:{}", port), Duration::from_secs(1))?;
    let authenticator = Authenticator::new(Arc::new(verifier), Duration::from_secs(1));
    assert!(matches!(
        authenticator.authenticate(Some("Bearer good")).await,
        Err(AuthError::BackendUnavailable(_))
    ));

    let base = spawn_authority().await?;
    let verifier = HttpTokenVerifier::new(&base, Duration::from_secs(10))?;
    let authenticator = Authenticator::new(Arc::new(verifier), Duration::from_millis(200));
    assert!(matches!(
        authenticator.authenticate(Some("Bearer slow")).await,
        Err(AuthError::BackendUnavailable(_))
    ));

    let identity = authenticator.authenticate(Some("Bearer good")).await?;
    assert!(matches!(identity, Identity::User(ref user) if user.id == 9));
    Ok(())
}

#[tokio::test]
async fn full_pipeline_over_http_authority() -> Result<()> {
    let base = spawn_authority().await?;
    let config = AppConfig::development();
    let verifier = HttpTokenVerifier::new(&base, config.auth.timeout())?;
    let authenticator = Authenticator::new(Arc::new(verifier), config.auth.timeout());
    let router = app(AppState::new(
        config,
        Arc::new(MemoryMovieStore::new()),
        authenticator,
        RateLimiter::disabled(),
    ));

    let res = send(&router, get("/v1/movies", Some("good"))).await?;
    assert_eq!(res.status, StatusCode::OK);

    let res = send(&router, get("/v1/movies", Some("inactive"))).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = send(&router, get("/v1/movies", Some("expired"))).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = send(&router, get("/v1/movies", Some("malformed"))).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}
