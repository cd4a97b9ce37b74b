//! Policy locator
//!
//! Turns a (group, role relationship) pair into the id of the role
//! management policy assigned to it. The lookup is two reads: the assignment
//! collection filtered to the pair, then the policy the single matching
//! assignment points at. Nothing is cached and nothing is retried here;
//! every call asks the directory again.

use rolepolicy_core::{
    AssignmentQuery, DirectoryClient, GroupId, PolicyId, RequestContext, ResolutionError, RoleKind,
};
use tracing::{debug, instrument};

/// Resolve the policy id for `group_id` and `role_id`
///
/// # Errors
///
/// - [`ResolutionError::Cancelled`] / [`ResolutionError::DeadlineExceeded`]
///   when `ctx` ends before or during the lookup
/// - [`ResolutionError::NotFound`] when no assignment matches
/// - [`ResolutionError::Ambiguous`] when more than one assignment matches
/// - [`ResolutionError::NilPolicyId`] when the assignment or the policy
///   carries no id
/// - [`ResolutionError::PolicyNotFound`] when the assigned policy is gone
/// - [`ResolutionError::Directory`] for transport and service failures
#[instrument(
    name = "resolve_policy",
    skip(ctx, client, group_id, role_id),
    fields(group_id = %group_id, role_id = %role_id, backend = client.backend_tag())
)]
pub async fn resolve(
    ctx: &RequestContext,
    client: &dyn DirectoryClient,
    group_id: &GroupId,
    role_id: RoleKind,
) -> Result<PolicyId, ResolutionError> {
    ctx.check()?;

    let query = AssignmentQuery::new(group_id.clone(), role_id);
    let assignments = client.list_policy_assignments(ctx, &query).await?;
    debug!(count = assignments.len(), "Listed policy assignments");

    let assignment = match assignments.as_slice() {
        [] => {
            return Err(ResolutionError::NotFound {
                group_id: group_id.to_string(),
                role_id: role_id.to_string(),
            })
        }
        [single] => single,
        many => return Err(ResolutionError::Ambiguous { count: many.len() }),
    };

    let nil_policy_id = || ResolutionError::NilPolicyId {
        group_id: group_id.to_string(),
        role_id: role_id.to_string(),
    };

    let assigned_id = assignment.policy_id().ok_or_else(nil_policy_id)?;
    let policy = client
        .get_policy(ctx, assigned_id)
        .await?
        .ok_or_else(|| ResolutionError::PolicyNotFound {
            policy_id: assigned_id.to_string(),
        })?;

    let id = policy.id().ok_or_else(nil_policy_id)?;
    debug!(policy_id = id, "Resolved role management policy");
    PolicyId::new(id).map_err(|_| nil_policy_id())
}
