//! Shared Kernel
//!
//! Vocabulary every backend crate agrees on:
//! - The unified error type and its HTTP classification
//! - Typed identifiers for the marketplace entities
//!
//! Anything domain-specific (ledger rules, verification codes) lives in its
//! own crate; only things with the same meaning everywhere belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
