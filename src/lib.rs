pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod testing;
pub mod validator;

pub use config::AppConfig;
pub use error::ApiError;
pub use routes::app;
pub use state::AppState;
