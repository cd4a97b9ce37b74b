//! Shared types for group role management policy lookups

pub mod ids;
pub mod policy;

// Re-export commonly used types
pub use ids::{GroupId, PolicyId, RoleKind};
pub use policy::{AssignmentQuery, PolicyAssignment, RoleManagementPolicy, GROUP_SCOPE_TYPE};
