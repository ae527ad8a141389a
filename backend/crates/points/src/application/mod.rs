//! Application Layer
//!
//! Use cases and application services.

pub mod access;
pub mod balance;
pub mod cancel;
pub mod config;
pub mod history;
pub mod plans;
pub mod promote;
pub mod recharge;

// Re-exports
pub use access::ensure_may_act_for;
pub use balance::GetBalanceUseCase;
pub use cancel::CancelPromotionUseCase;
pub use config::PointsConfig;
pub use history::{GetHistoryUseCase, RoomHistoryUseCase, UserHistory};
pub use plans::ListPlansUseCase;
pub use promote::{PromoteInput, PromoteOutput, PromoteRoomUseCase};
pub use recharge::{RechargeInput, RechargeUseCase};
