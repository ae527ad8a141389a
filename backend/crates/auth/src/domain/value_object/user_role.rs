use serde::{Deserialize, Serialize};
use std::fmt;

/// Marketplace role. Ids match the `role_id` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(i16)]
pub enum UserRole {
    /// Looks for rooms
    #[default]
    Tenant = 1,
    /// Lists and promotes rooms
    Partner = 2,
    Admin = 3,
}

impl UserRole {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use UserRole::*;
        match self {
            Tenant => "tenant",
            Partner => "partner",
            Admin => "admin",
        }
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Admins are provisioned, never self-registered.
    #[inline]
    pub const fn can_self_register(&self) -> bool {
        !self.is_admin()
    }

    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        use UserRole::*;
        match id {
            1 => Some(Tenant),
            2 => Some(Partner),
            3 => Some(Admin),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_from_id() {
        assert_eq!(UserRole::from_id(1), Some(UserRole::Tenant));
        assert_eq!(UserRole::from_id(2), Some(UserRole::Partner));
        assert_eq!(UserRole::from_id(3), Some(UserRole::Admin));
        assert_eq!(UserRole::from_id(0), None);
        assert_eq!(UserRole::from_id(4), None);
    }

    #[test]
    fn test_id_roundtrip() {
        for role in [UserRole::Tenant, UserRole::Partner, UserRole::Admin] {
            assert_eq!(UserRole::from_id(role.id()), Some(role));
        }
    }

    #[test]
    fn test_role_checks() {
        assert!(UserRole::Tenant.can_self_register());
        assert!(UserRole::Partner.can_self_register());
        assert!(!UserRole::Admin.can_self_register());
        assert!(UserRole::Admin.is_admin());
        assert_eq!(UserRole::Partner.to_string(), "partner");
    }
}
