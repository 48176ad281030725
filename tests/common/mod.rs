#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub use movies_api::testing::{TestContext, INACTIVE_TOKEN, READER_TOKEN, WRITER_TOKEN};

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Some `Vary` header lists `Authorization`
    pub fn varies_on_authorization(&self) -> bool {
        self.headers
            .get_all(header::VARY)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .any(|v| v.trim().eq_ignore_ascii_case("authorization"))
    }
}

/// Drive one request through the router without binding a socket
pub async fn send(router: &Router, request: Request<Body>) -> Result<TestResponse> {
    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let headers = response.headers().clone();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body with status {}", status))?
    };

    Ok(TestResponse { status, headers, body })
}

pub fn request(method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let built = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    };
    built.expect("valid test request")
}

pub fn get(path: &str, token: Option<&str>) -> Request<Body> {
    request(Method::GET, path, token, None)
}

pub fn casablanca() -> Value {
    json!({
        "title": "Casablanca",
        "year": 1942,
        "runtime": "102 mins",
        "genres": ["drama", "romance", "war"]
    })
}

/// POST a movie as the writer and return its body
pub async fn create(router: &Router, movie: Value) -> Result<Value> {
    let res = send(router, request(Method::POST, "/v1/movies", Some(WRITER_TOKEN), Some(movie))).await?;
    anyhow::ensure!(res.status == StatusCode::OK, "create failed: {} {}", res.status, res.body);
    Ok(res.body["movie"].clone())
}
