//! Value Object Module

pub mod email;
pub mod one_time_code;
pub mod person_name;
pub mod user_password;
pub mod user_role;
