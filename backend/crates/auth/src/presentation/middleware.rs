//! Auth Middleware
//!
//! Bearer gate for protected routes. Other crates mount it with
//! `axum::middleware::from_fn_with_state(gate, require_bearer)`.

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::Request;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::token::{TokenService, extract_access_token};
use std::sync::Arc;

use crate::application::authenticate::{AuthenticatedUser, authenticate};
use crate::error::AuthError;

/// Middleware state
#[derive(Clone)]
pub struct BearerGate {
    tokens: Arc<TokenService>,
}

impl BearerGate {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

/// Middleware that requires a valid access token.
///
/// No token: 403. Invalid or expired token: 401. On success the caller is
/// stored in request extensions as [`AuthenticatedUser`].
pub async fn require_bearer(
    State(gate): State<BearerGate>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = extract_access_token(req.headers());

    match authenticate(&gate.tokens, token.as_deref()) {
        Ok(caller) => {
            req.extensions_mut().insert(caller);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

/// Handlers behind [`require_bearer`] take the caller as an argument.
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}
