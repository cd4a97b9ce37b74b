//! Directory records: policy assignments and role management policies

use super::ids::{GroupId, RoleKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scope type of policies attached to groups
pub const GROUP_SCOPE_TYPE: &str = "Group";

/// Record linking a (group, role relationship) pair to a policy
///
/// Every field is optional on the wire; a record without `policy_id` is a
/// legitimate (if unhelpful) answer from the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyAssignment {
    /// Assignment identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Identifier of the assigned role management policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,

    /// Identifier of the scope (the group id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_id: Option<String>,

    /// Scope type, "Group" for group policies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_type: Option<String>,

    /// Role relationship the assignment applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_definition_id: Option<String>,
}

impl PolicyAssignment {
    /// Build an assignment for a group and role pointing at `policy_id`
    pub fn for_group(group_id: &GroupId, role_id: RoleKind, policy_id: impl Into<String>) -> Self {
        let policy_id = policy_id.into();
        Self {
            id: Some(format!(
                "{}_{}_{}_{}",
                GROUP_SCOPE_TYPE, group_id, policy_id, role_id
            )),
            policy_id: Some(policy_id),
            scope_id: Some(group_id.to_string()),
            scope_type: Some(GROUP_SCOPE_TYPE.to_string()),
            role_definition_id: Some(role_id.to_string()),
        }
    }

    /// Whether this record belongs to the given group and role
    pub fn matches(&self, query: &AssignmentQuery) -> bool {
        self.scope_id.as_deref() == Some(query.group_id.as_str())
            && self.scope_type.as_deref() == Some(GROUP_SCOPE_TYPE)
            && self.role_definition_id.as_deref() == Some(query.role_id.as_str())
    }

    /// Policy id, treating an empty string the same as a missing one
    pub fn policy_id(&self) -> Option<&str> {
        self.policy_id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// A role management policy resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleManagementPolicy {
    /// Policy identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Identifier of the scope the policy applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_id: Option<String>,

    /// Scope type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_type: Option<String>,

    /// Whether this is the tenant-wide default policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_organization_default: Option<bool>,

    /// Last modification time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date_time: Option<DateTime<Utc>>,
}

impl RoleManagementPolicy {
    /// Minimal group-scoped policy with the given id
    pub fn for_group(id: impl Into<String>, group_id: &GroupId) -> Self {
        Self {
            id: Some(id.into()),
            scope_id: Some(group_id.to_string()),
            scope_type: Some(GROUP_SCOPE_TYPE.to_string()),
            ..Default::default()
        }
    }

    /// Policy id, treating an empty string the same as a missing one
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// Filter for the assignment lookup of one (group, role) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssignmentQuery {
    /// Group that owns the assignment
    pub group_id: GroupId,
    /// Role relationship kind
    pub role_id: RoleKind,
}

impl AssignmentQuery {
    /// Create a query for a group and role
    pub fn new(group_id: GroupId, role_id: RoleKind) -> Self {
        Self { group_id, role_id }
    }

    /// OData `$filter` expression selecting the assignment
    pub fn filter(&self) -> String {
        format!(
            "scopeId eq '{}' and scopeType eq '{}' and roleDefinitionId eq '{}'",
            escape_odata(self.group_id.as_str()),
            GROUP_SCOPE_TYPE,
            escape_odata(self.role_id.as_str()),
        )
    }
}

fn escape_odata(value: &str) -> String {
    value.replace('\'', "''")
}
