//! # Group Role Management Policy Lookup
//!
//! Resolves the role management policy assigned to a (group, role
//! relationship) pair and exposes its id to a declarative configuration
//! layer.
//!
//! ## Flow
//!
//! ```text
//! ResourceData → schema validation → LookupInput
//!     → retry suppression (scoped) → locator::resolve → PolicyId | Diagnostics
//! ```
//!
//! ## Example
//!
//! ```rust
//! use rolepolicy_core::{GroupId, RequestContext, RoleKind};
//! use rolepolicy_directory::InMemoryDirectory;
//! use rolepolicy_lookup::{GroupRoleManagementPolicyDataSource, ResourceData};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let group = GroupId::parse("11111111-1111-1111-1111-111111111111").unwrap();
//! let directory = InMemoryDirectory::new().with_group_policy(&group, RoleKind::Owner, "policy-abc");
//!
//! let mut data = ResourceData::new()
//!     .with("group_id", group.as_str())
//!     .with("role_id", "owner");
//!
//! let data_source = GroupRoleManagementPolicyDataSource::new().unwrap();
//! let diagnostics = data_source
//!     .invoke(&RequestContext::background(), &mut data, &directory)
//!     .await;
//!
//! assert!(!diagnostics.has_error());
//! assert_eq!(data.id(), Some("policy-abc"));
//! # }
//! ```

pub mod data_source;
pub mod diagnostics;
pub mod locator;
pub mod metrics;
pub mod resource;
pub mod schema;

pub use data_source::{GroupRoleManagementPolicyDataSource, READ_FAILURE_DETAIL, READ_FAILURE_SUMMARY};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use metrics::{LookupMetrics, MetricsSnapshot};
pub use resource::ResourceData;
pub use schema::{
    group_role_management_policy_schema, DataSourceSchema, FieldSchema, LookupInput, Validator,
    DEFAULT_READ_TIMEOUT,
};
