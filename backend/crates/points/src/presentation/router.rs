//! Points Router

use auth::{BearerGate, require_bearer};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

use crate::domain::repository::PointsStore;
use crate::infra::postgres::PgPointsRepository;
use crate::presentation::handlers::{self, PointsAppState};

/// Create the points router with the PostgreSQL repository
pub fn points_router(repo: PgPointsRepository, gate: BearerGate) -> Router {
    points_router_generic(repo, gate)
}

/// Create a generic points router for any store implementation.
///
/// Every route requires a bearer token.
pub fn points_router_generic<S>(store: S, gate: BearerGate) -> Router
where
    S: PointsStore,
{
    let state = PointsAppState {
        store: Arc::new(store),
    };

    Router::new()
        .route("/recargar", post(handlers::recharge::<S>))
        .route("/saldo/{user_id}", get(handlers::balance::<S>))
        .route("/historial/{user_id}", get(handlers::history::<S>))
        .route("/historial/cuarto/{room_id}", get(handlers::room_history::<S>))
        .route("/planes", get(handlers::plans::<S>))
        .route("/promocionar", post(handlers::promote::<S>))
        .route("/cancelar-promocion", post(handlers::cancel_promotion::<S>))
        .route_layer(middleware::from_fn_with_state(gate, require_bearer))
        .with_state(state)
}
