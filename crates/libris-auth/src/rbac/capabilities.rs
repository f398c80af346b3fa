//! Role-to-capability mapping definitions.
//!
//! The administrator-superset rule lives here, once: each role's set is
//! built on top of the previous role's, so scattered role-equality
//! checks are never needed elsewhere.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use libris_entity::user::UserRole;

/// A named permission gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    // Catalog
    /// Browse and read the book catalog.
    CatalogRead,
    /// Create books.
    CreateBook,
    /// Update book details and capacity.
    UpdateBook,
    /// Delete books.
    DeleteBook,

    // Reservations
    /// Reserve an available book.
    ReserveBook,
    /// Return one's own reserved book.
    ReturnOwnBook,
    /// List one's own reservations.
    ListOwnReservations,
    /// List all reservations across users.
    ListAllReservations,
    /// Overwrite any reservation's status.
    OverrideReservationStatus,

    // Identity
    /// Read any user's profile.
    ReadAnyUser,
    /// Change a user's role.
    ChangeUserRole,
}

/// Defines the mapping from each role to its set of capabilities.
#[derive(Debug, Clone)]
pub struct RolePolicies {
    /// Role → set of capabilities.
    policies: HashMap<UserRole, HashSet<Capability>>,
}

impl RolePolicies {
    /// Creates the default capability lattice.
    pub fn new() -> Self {
        let mut policies = HashMap::new();

        // Patron: self-service lending and catalog reads
        let patron: HashSet<Capability> = [
            Capability::CatalogRead,
            Capability::ReserveBook,
            Capability::ReturnOwnBook,
            Capability::ListOwnReservations,
        ]
        .into_iter()
        .collect();

        // Librarian: patron + oversight of every reservation
        let mut librarian = patron.clone();
        librarian.insert(Capability::ListAllReservations);
        librarian.insert(Capability::OverrideReservationStatus);

        // Admin: librarian + catalog and user management (full superset)
        let mut admin = librarian.clone();
        admin.insert(Capability::CreateBook);
        admin.insert(Capability::UpdateBook);
        admin.insert(Capability::DeleteBook);
        admin.insert(Capability::ReadAnyUser);
        admin.insert(Capability::ChangeUserRole);

        policies.insert(UserRole::Patron, patron);
        policies.insert(UserRole::Librarian, librarian);
        policies.insert(UserRole::Admin, admin);

        Self { policies }
    }

    /// Returns the set of capabilities for the given role.
    pub fn capabilities_for_role(&self, role: &UserRole) -> HashSet<Capability> {
        self.policies.get(role).cloned().unwrap_or_default()
    }

    /// Checks whether the given role holds the specified capability.
    pub fn has_capability(&self, role: &UserRole, capability: &Capability) -> bool {
        self.policies
            .get(role)
            .is_some_and(|caps| caps.contains(capability))
    }
}

impl Default for RolePolicies {
    fn default() -> Self {
        Self::new()
    }
}
