use crate::domain::value_object::{
    email::Email, person_name::PersonName, user_password::UserPassword, user_role::UserRole,
};

/// A would-be user held until the email address is verified.
///
/// The password is already hashed; nothing in clear text waits here.
#[derive(Debug, Clone)]
pub struct PendingRegistration {
    pub first_name: PersonName,
    pub paternal_surname: PersonName,
    pub maternal_surname: Option<PersonName>,
    pub email: Email,
    pub password: UserPassword,
    pub role: UserRole,
}
