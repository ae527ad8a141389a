//! One-time numeric codes mailed to prove control of an address.

use platform::crypto::{constant_time_eq, random_numeric_code};
use std::fmt;

pub const CODE_DIGITS: usize = 6;

/// Exactly six ASCII digits, `"000000"` to `"999999"`.
#[derive(Clone, PartialEq, Eq)]
pub struct OneTimeCode(String);

impl OneTimeCode {
    /// Uniform over the whole range, from the OS CSPRNG.
    pub fn generate() -> Self {
        Self(random_numeric_code(CODE_DIGITS as u32))
    }

    /// Parse submitted input. Surrounding whitespace is ignored; anything
    /// that is not six digits afterwards yields `None`.
    pub fn parse(input: &str) -> Option<Self> {
        let code = input.trim();
        (code.len() == CODE_DIGITS && code.bytes().all(|b| b.is_ascii_digit()))
            .then(|| Self(code.to_string()))
    }

    /// Restore a code read back from the store.
    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison.
    pub fn matches(&self, other: &OneTimeCode) -> bool {
        constant_time_eq(self.0.as_bytes(), other.0.as_bytes())
    }
}

// Codes stay out of logs.
impl fmt::Debug for OneTimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OneTimeCode(******)")
    }
}
