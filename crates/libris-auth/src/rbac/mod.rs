//! Role-based access control: capability definitions and enforcement.

pub mod capabilities;
pub mod enforcer;

pub use capabilities::{Capability, RolePolicies};
pub use enforcer::RbacEnforcer;
