//! Directory client trait

use super::retry::RetryControl;
use crate::context::RequestContext;
use crate::error::Result;
use crate::types::{AssignmentQuery, PolicyAssignment, RoleManagementPolicy};
use async_trait::async_trait;
use std::sync::Arc;

/// Read-only view of the directory service used by policy lookups
///
/// Implementations must drive every outbound call through the supplied
/// [`RequestContext`] and consult [`DirectoryClient::retry_control`] before
/// retrying a failed request.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Retry-suppression state shared by everyone using this client
    fn retry_control(&self) -> &RetryControl;

    /// List policy assignments matching the query, across all pages
    async fn list_policy_assignments(
        &self,
        ctx: &RequestContext,
        query: &AssignmentQuery,
    ) -> Result<Vec<PolicyAssignment>>;

    /// Fetch a role management policy; `Ok(None)` when it does not exist
    async fn get_policy(
        &self,
        ctx: &RequestContext,
        policy_id: &str,
    ) -> Result<Option<RoleManagementPolicy>>;

    /// Short backend name for logs
    fn backend_tag(&self) -> &'static str {
        "directory"
    }
}

#[async_trait]
impl<T: DirectoryClient + ?Sized> DirectoryClient for Arc<T> {
    fn retry_control(&self) -> &RetryControl {
        (**self).retry_control()
    }

    async fn list_policy_assignments(
        &self,
        ctx: &RequestContext,
        query: &AssignmentQuery,
    ) -> Result<Vec<PolicyAssignment>> {
        (**self).list_policy_assignments(ctx, query).await
    }

    async fn get_policy(
        &self,
        ctx: &RequestContext,
        policy_id: &str,
    ) -> Result<Option<RoleManagementPolicy>> {
        (**self).get_policy(ctx, policy_id).await
    }

    fn backend_tag(&self) -> &'static str {
        (**self).backend_tag()
    }
}
