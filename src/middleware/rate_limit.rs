use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Mutex;
use std::time::Instant;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Tokens added per second
    pub rate: f64,
    /// Bucket capacity; `None` means `ceil(rate)`, never below 1
    pub burst: Option<u32>,
}

impl From<&ApiConfig> for RateLimitConfig {
    fn from(api: &ApiConfig) -> Self {
        Self {
            enabled: api.enable_rate_limiting,
            rate: api.rate_limit_rps,
            burst: api.rate_limit_burst,
        }
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Process-wide token bucket. One instance is shared by every request.
#[derive(Debug)]
pub struct RateLimiter {
    enabled: bool,
    rate: f64,
    capacity: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let rate = config.rate.max(0.0);
        let capacity = config
            .burst
            .map(f64::from)
            .unwrap_or_else(|| rate.ceil())
            .max(1.0);

        Self {
            enabled: config.enabled,
            rate,
            capacity,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn disabled() -> Self {
        Self::new(RateLimitConfig {
            enabled: false,
            rate: 0.0,
            burst: None,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Take one token if available
    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    pub fn allow_at(&self, now: Instant) -> bool {
        if !self.enabled {
            return true;
        }

        // nothing panics while the lock is held
        let mut bucket = self.bucket.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rate).min(self.capacity);
        if now > bucket.last_refill {
            bucket.last_refill = now;
        }

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Rejects with 429 before authentication runs when the bucket is empty.
///
/// The rejection never reaches `authenticate`, so it sets
/// `Vary: Authorization` itself.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.limiter.allow() {
        return next.run(request).await;
    }

    tracing::warn!("Rate limit exceeded for {} {}", request.method(), request.uri().path());
    let mut response = ApiError::TooManyRequests.into_response();
    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    response
}
