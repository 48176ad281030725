use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::marker::PhantomData;

use crate::auth::{authorize, AuthError, Identity, Requirement, User};
use crate::error::ApiError;
use crate::state::AppState;

/// Resolve the caller's [`Identity`] and store it as a request extension.
///
/// `Vary: Authorization` is set on every response this middleware sees,
/// including its own rejections.
pub async fn authenticate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let authorization = match request.headers().get(header::AUTHORIZATION) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|s| Some(s.to_owned()))
            .map_err(|_| AuthError::InvalidCredentials),
    };

    let outcome = match authorization {
        Ok(value) => state.authenticator.authenticate(value.as_deref()).await,
        Err(err) => Err(err),
    };

    let mut response = match outcome {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    };

    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    response
}

/// A permission code a route can demand through [`Authorized`]
pub trait Permission: Send + Sync + 'static {
    const CODE: &'static str;
}

pub struct MoviesRead;

impl Permission for MoviesRead {
    const CODE: &'static str = "movies:read";
}

pub struct MoviesWrite;

impl Permission for MoviesWrite {
    const CODE: &'static str = "movies:write";
}

/// Extractor that only succeeds for an authenticated, activated user holding
/// permission `P`. Requests that skipped [`authenticate`] count as anonymous.
pub struct Authorized<P: Permission> {
    pub user: User,
    _permission: PhantomData<fn() -> P>,
}

#[async_trait]
impl<S, P> FromRequestParts<S> for Authorized<P>
where
    S: Send + Sync,
    P: Permission,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let anonymous = Identity::Anonymous;
        let identity = parts.extensions.get::<Identity>().unwrap_or(&anonymous);

        let user = authorize(identity, Requirement::Permission(P::CODE)).map_err(|err| {
            tracing::warn!("Request to {} denied: {}", parts.uri.path(), err);
            ApiError::from(err)
        })?;

        Ok(Self {
            user: user.clone(),
            _permission: PhantomData,
        })
    }
}
