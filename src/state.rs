use std::sync::Arc;

use crate::auth::Authenticator;
use crate::config::AppConfig;
use crate::database::MovieStore;
use crate::middleware::RateLimiter;

/// Shared, immutable handles injected into every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn MovieStore>,
    pub authenticator: Arc<Authenticator>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn MovieStore>,
        authenticator: Authenticator,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            authenticator: Arc::new(authenticator),
            limiter: Arc::new(limiter),
        }
    }
}
