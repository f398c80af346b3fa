//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles available in the RBAC system.
///
/// Roles are ordered by privilege level: Admin > Librarian > Patron.
/// The administrator role is a superset of every other role, not a
/// disjoint set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// May reserve and return books and browse the catalog.
    Patron,
    /// May additionally list and override any reservation.
    Librarian,
    /// Full administrator; holds every capability.
    Admin,
}

impl UserRole {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Admin => 3,
            Self::Librarian => 2,
            Self::Patron => 1,
        }
    }

    /// Check if this role has at least the given role's privileges.
    pub fn has_at_least(&self, other: &UserRole) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    /// Check if this role is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Check if this role is a librarian or higher.
    pub fn is_librarian_or_above(&self) -> bool {
        self.has_at_least(&Self::Librarian)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Librarian => "librarian",
            Self::Patron => "patron",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = libris_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "librarian" => Ok(Self::Librarian),
            "patron" => Ok(Self::Patron),
            _ => Err(libris_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: patron, librarian, admin"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_ordering() {
        assert!(UserRole::Admin.has_at_least(&UserRole::Patron));
        assert!(UserRole::Admin.has_at_least(&UserRole::Admin));
        assert!(UserRole::Librarian.has_at_least(&UserRole::Patron));
        assert!(!UserRole::Patron.has_at_least(&UserRole::Librarian));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("PATRON".parse::<UserRole>().unwrap(), UserRole::Patron);
        assert!("wizard".parse::<UserRole>().is_err());
    }
}
