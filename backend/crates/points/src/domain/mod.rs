//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Plan, Recharge, Promotion)
//! - Domain value objects (PromotionStatus, RechargeAmount, PointCount)
//! - Domain services (balance and activate-or-renew rules)
//! - Repository traits (interfaces), including the locked ledger transaction

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
