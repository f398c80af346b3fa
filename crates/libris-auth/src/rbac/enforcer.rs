//! RBAC enforcement logic: checks whether a role holds a required capability.

use libris_core::error::AppError;
use libris_entity::user::UserRole;

use super::capabilities::{Capability, RolePolicies};

/// Enforces role-based access control for service operations.
///
/// Authorization has no side effects; callers receive a typed error and
/// nothing in the system changes.
#[derive(Debug, Clone)]
pub struct RbacEnforcer {
    /// The capability lattice.
    policies: RolePolicies,
}

impl RbacEnforcer {
    /// Creates a new enforcer with the default capability lattice.
    pub fn new() -> Self {
        Self {
            policies: RolePolicies::new(),
        }
    }

    /// Creates an enforcer with custom policies.
    pub fn with_policies(policies: RolePolicies) -> Self {
        Self { policies }
    }

    /// Checks whether the given role holds the required capability.
    ///
    /// Returns `Ok(())` if allowed, or an `Authorization` error if denied.
    pub fn require_capability(
        &self,
        role: &UserRole,
        capability: Capability,
    ) -> Result<(), AppError> {
        if self.policies.has_capability(role, &capability) {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "Role '{role}' does not have capability '{capability:?}'"
            )))
        }
    }

    /// Checks whether the role holds the capability (returns bool).
    pub fn has_capability(&self, role: &UserRole, capability: Capability) -> bool {
        self.policies.has_capability(role, &capability)
    }

    /// Checks whether the given role is at least the specified minimum
    /// role. Role hierarchy: Admin > Librarian > Patron.
    pub fn require_minimum_role(
        &self,
        actual_role: &UserRole,
        minimum_role: &UserRole,
    ) -> Result<(), AppError> {
        if actual_role.has_at_least(minimum_role) {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "Role '{actual_role}' is insufficient; minimum required: '{minimum_role}'"
            )))
        }
    }

    /// Returns a reference to the underlying policies.
    pub fn policies(&self) -> &RolePolicies {
        &self.policies
    }
}

impl Default for RbacEnforcer {
    fn default() -> Self {
        Self::new()
    }
}
