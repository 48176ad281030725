pub mod auth;
pub mod rate_limit;
pub mod response;

pub use auth::{authenticate, Authorized, MoviesRead, MoviesWrite, Permission};
pub use rate_limit::{rate_limit, RateLimitConfig, RateLimiter};
pub use response::{ApiResponse, ApiResult};
