use thiserror::Error;

use super::{Identity, User};

/// What a route demands of the caller. Each level implies the ones above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Authenticated,
    Activated,
    Permission(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("you must be authenticated to access this resource")]
    Unauthorized,

    #[error("your user account must be activated to access this resource")]
    Inactive,

    #[error("your user account doesn't have the necessary permissions to access this resource")]
    NotPermitted,
}

/// Check `identity` against `requirement`.
///
/// Checks always run authenticated, then activated, then permission, and the
/// first failing gate decides the outcome.
pub fn authorize(identity: &Identity, requirement: Requirement) -> Result<&User, PolicyError> {
    let user = identity.user().ok_or(PolicyError::Unauthorized)?;
    if requirement == Requirement::Authenticated {
        return Ok(user);
    }

    if !user.activated {
        return Err(PolicyError::Inactive);
    }

    match requirement {
        Requirement::Permission(code) if !user.has_permission(code) => Err(PolicyError::NotPermitted),
        _ => Ok(user),
    }
}
