//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use platform::token::TokenService;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::mailer::CodeMailer;
use crate::domain::repository::AuthStore;
use crate::infra::{mail::Mailer, postgres::PgAuthRepository};
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{BearerGate, require_bearer};

/// Create the Auth router with the PostgreSQL repository
pub fn auth_router(
    repo: PgAuthRepository,
    mailer: Mailer,
    config: AuthConfig,
    tokens: Arc<TokenService>,
) -> Router {
    auth_router_generic(repo, mailer, config, tokens)
}

/// Create a generic Auth router for any repository and mailer
pub fn auth_router_generic<R, M>(
    repo: R,
    mailer: M,
    config: AuthConfig,
    tokens: Arc<TokenService>,
) -> Router
where
    R: AuthStore,
    M: CodeMailer + Sync + 'static,
{
    let gate = BearerGate::new(tokens.clone());
    let state = AuthAppState {
        repo: Arc::new(repo),
        mailer: Arc::new(mailer),
        config: Arc::new(config),
        tokens,
    };

    let protected = Router::new()
        .route("/perfil", get(handlers::profile::<R, M>))
        .route("/change-password", put(handlers::update_password::<R, M>))
        .route("/update-role/{user_id}", put(handlers::update_role::<R, M>))
        .route_layer(middleware::from_fn_with_state(gate, require_bearer));

    Router::new()
        .route("/recover-password", post(handlers::recover_password::<R, M>))
        .route("/verify-code", post(handlers::verify_code::<R, M>))
        .route("/change-password", post(handlers::change_password::<R, M>))
        .route("/register", post(handlers::register::<R, M>))
        .route("/verify-email", post(handlers::verify_email::<R, M>))
        .route("/login", post(handlers::login::<R, M>))
        // `/change-password` answers POST with a recovery code and PUT with
        // a bearer token; the merge joins both methods on one path.
        .merge(protected)
        .with_state(state)
}
