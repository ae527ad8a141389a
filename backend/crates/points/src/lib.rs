//! Points (Ledger) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, ledger rules, repository traits
//! - `application/` - Use cases and configuration
//! - `infra/` - PostgreSQL implementation
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Point recharges (append-only)
//! - Balance: recharged points minus points spent on promotions
//! - Room promotions bought with points: create, renew, cancel
//! - User and room histories
//!
//! ## Consistency Model
//! - Balance check, activate-or-renew decision and write share one
//!   transaction under a per-user advisory lock
//! - At most one active promotion per (user, room), also enforced by a
//!   partial unique index
//! - Lock waits are bounded; a timeout is reported as 503 and can be retried

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::PointsConfig;
pub use domain::services::PromotionOutcome;
pub use domain::value_objects::PromotionStatus;
pub use error::{PointsError, PointsResult};
pub use infra::postgres::PgPointsRepository;
pub use presentation::router::points_router;
