//! # Role Policy Core
//!
//! Shared types, traits, and error handling for group role management
//! policy lookups. The directory client and the lookup crate both build on
//! this package so neither depends on the other.

pub mod context;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use context::RequestContext;
pub use error::{DirectoryError, ErrorKind, ResolutionError, Result, ValidationError};
pub use traits::{DirectoryClient, RetryControl, RetrySuppression};
pub use types::{
    AssignmentQuery, GroupId, PolicyAssignment, PolicyId, RoleKind, RoleManagementPolicy,
};
