use derive_more::Display;
use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const NAME_MAX_CHARS: usize = 60;

/// Which name field failed validation; used in the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NameField {
    #[display("first_name")]
    FirstName,
    #[display("paternal_surname")]
    PaternalSurname,
    #[display("maternal_surname")]
    MaternalSurname,
}

/// A given name or surname: trimmed, 1 to 60 characters, no control characters.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
pub struct PersonName(String);

impl PersonName {
    pub fn new(value: impl AsRef<str>, field: NameField) -> AppResult<Self> {
        let value = value.as_ref().trim();

        if value.is_empty() {
            return Err(AppError::bad_request(format!("{} is required", field)));
        }

        if value.chars().count() > NAME_MAX_CHARS {
            return Err(AppError::bad_request(format!(
                "{} must be at most {} characters",
                field, NAME_MAX_CHARS
            )));
        }

        if value.chars().any(char::is_control) {
            return Err(AppError::bad_request(format!(
                "{} contains invalid characters",
                field
            )));
        }

        Ok(Self(value.to_string()))
    }

    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
