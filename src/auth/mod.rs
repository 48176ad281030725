pub mod policy;
pub mod remote;

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use policy::{authorize, PolicyError, Requirement};
pub use remote::HttpTokenVerifier;

/// Who is making a request.
///
/// Unauthenticated callers are the explicit `Anonymous` variant, never a
/// user with zero-valued fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    User(User),
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Anonymous => None,
            Identity::User(user) => Some(user),
        }
    }
}

/// A user exactly as the token authority described it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub activated: bool,
    pub permissions: HashSet<String>,
}

impl User {
    pub fn has_permission(&self, code: &str) -> bool {
        self.permissions.contains(code)
    }
}

/// Outcomes reported by the token authority
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("token rejected by authority")]
    Unauthenticated,

    #[error("malformed token: {0}")]
    InvalidArgument(String),

    #[error("token authority failure: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The Authorization header is not `Bearer <token>`
    #[error("invalid or missing authentication credentials")]
    InvalidCredentials,

    #[error("invalid or expired authentication token")]
    InvalidToken,

    #[error("authentication backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl From<VerifyError> for AuthError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Unauthenticated | VerifyError::InvalidArgument(_) => AuthError::InvalidToken,
            VerifyError::Other(msg) => AuthError::BackendUnavailable(msg),
        }
    }
}

/// Remote token verification. Implementations own their transport.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<User, VerifyError>;
}

/// Resolves the `Authorization` header of a request to an [`Identity`]
pub struct Authenticator {
    verifier: Arc<dyn TokenVerifier>,
    timeout: Duration,
}

impl Authenticator {
    pub fn new(verifier: Arc<dyn TokenVerifier>, timeout: Duration) -> Self {
        Self { verifier, timeout }
    }

    /// `None` or an empty header is anonymous and never reaches the
    /// authority. Verification is attempted once, bounded by the timeout.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<Identity, AuthError> {
        let header = match authorization {
            None | Some("") => return Ok(Identity::Anonymous),
            Some(header) => header,
        };

        let token = bearer_token(header)?;

        match tokio::time::timeout(self.timeout, self.verifier.verify_token(token)).await {
            Ok(Ok(user)) => Ok(Identity::User(user)),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Err(AuthError::BackendUnavailable(format!(
                "verification exceeded {:?}",
                self.timeout
            ))),
        }
    }
}

/// Token from a header of exactly two space separated parts, `Bearer <token>`
fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidCredentials),
    }
}
