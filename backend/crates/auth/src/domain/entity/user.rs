//! User Entity
//!
//! A permanent account. Only created once the owner has proven control of
//! the email address, so every stored user is verified.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::entity::pending_registration::PendingRegistration;
use crate::domain::value_object::{
    email::Email, person_name::PersonName, user_password::UserPassword, user_role::UserRole,
};

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub first_name: PersonName,
    pub paternal_surname: PersonName,
    pub maternal_surname: Option<PersonName>,
    pub email: Email,
    pub password: UserPassword,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Promote a verified pending registration to an account.
    pub fn from_registration(pending: PendingRegistration, now: DateTime<Utc>) -> Self {
        Self {
            user_id: UserId::new(),
            first_name: pending.first_name,
            paternal_surname: pending.paternal_surname,
            maternal_surname: pending.maternal_surname,
            email: pending.email,
            password: pending.password,
            role: pending.role,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_password(&mut self, password: UserPassword, now: DateTime<Utc>) {
        self.password = password;
        self.updated_at = now;
    }
}
