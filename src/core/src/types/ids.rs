//! Identifiers: group, role relationship kind, and policy

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Length of the canonical hyphenated UUID form
const UUID_TEXT_LEN: usize = 36;

/// Identifier of the group that owns a role assignment
///
/// Only the hyphenated 8-4-4-4-12 form is accepted. The caller's text is
/// kept verbatim so it round-trips into directory filters unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupId(String);

impl GroupId {
    /// Parse a group id, checking UUID syntax
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        if is_hyphenated_uuid(value) {
            Ok(GroupId(value.to_string()))
        } else {
            Err(ValidationError::InvalidGroupId {
                field: "group_id".to_string(),
                value: value.to_string(),
            })
        }
    }

    /// Get the group id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_hyphenated_uuid(value: &str) -> bool {
    let bytes = value.as_bytes();
    value.len() == UUID_TEXT_LEN
        && [8, 13, 18, 23].iter().all(|&i| bytes[i] == b'-')
        && Uuid::parse_str(value).is_ok()
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for GroupId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GroupId::parse(s)
    }
}

impl TryFrom<String> for GroupId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        GroupId::parse(&value)
    }
}

impl From<GroupId> for String {
    fn from(id: GroupId) -> Self {
        id.0
    }
}

/// Kind of privilege a group role assignment confers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    /// Membership of the group
    Member,
    /// Ownership of the group
    Owner,
    /// Relationship the directory could not classify
    Unknown,
}

impl RoleKind {
    /// The closed set of recognized relationship kinds
    pub const ALL: [RoleKind; 3] = [RoleKind::Member, RoleKind::Owner, RoleKind::Unknown];

    /// Wire value used by the directory service
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::Member => "member",
            RoleKind::Owner => "owner",
            RoleKind::Unknown => "unknown",
        }
    }

    /// Wire values of every recognized kind
    pub fn values() -> [&'static str; 3] {
        Self::ALL.map(|kind| kind.as_str())
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleKind {
    type Err = ValidationError;

    /// Case-sensitive: "Owner" is rejected
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidRoleKind {
                field: "role_id".to_string(),
                value: s.to_string(),
            })
    }
}

/// Identifier of a role management policy, as issued by the directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PolicyId(String);

impl PolicyId {
    /// Wrap a directory-issued id; empty or blank ids are rejected
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyPolicyId);
        }
        Ok(PolicyId(id))
    }

    /// Get the policy id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PolicyId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PolicyId::new(value)
    }
}

impl From<PolicyId> for String {
    fn from(id: PolicyId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_group_id_accepts_hyphenated_uuid() {
        let id = GroupId::parse("11111111-1111-1111-1111-111111111111").unwrap();
        assert_eq!(id.as_str(), "11111111-1111-1111-1111-111111111111");

        // Case is preserved
        let upper = GroupId::parse("ABCDEF01-2345-6789-ABCD-EF0123456789").unwrap();
        assert_eq!(upper.to_string(), "ABCDEF01-2345-6789-ABCD-EF0123456789");
    }

    #[test]
    fn test_group_id_rejects_other_forms() {
        for bad in [
            "",
            "not-a-uuid",
            "11111111111111111111111111111111",
            "{11111111-1111-1111-1111-111111111111}",
            "urn:uuid:11111111-1111-1111-1111-111111111111",
            "11111111-1111-1111-1111-11111111111g",
            " 11111111-1111-1111-1111-111111111111",
        ] {
            let err = GroupId::parse(bad).unwrap_err();
            assert_eq!(err.field(), Some("group_id"), "input {bad:?}");
        }
    }

    #[test]
    fn test_role_kind_is_case_sensitive() {
        assert_eq!("member".parse::<RoleKind>().unwrap(), RoleKind::Member);
        assert_eq!("owner".parse::<RoleKind>().unwrap(), RoleKind::Owner);
        assert_eq!("unknown".parse::<RoleKind>().unwrap(), RoleKind::Unknown);
        assert!("Owner".parse::<RoleKind>().is_err());
        assert!("admin".parse::<RoleKind>().is_err());
        assert!("".parse::<RoleKind>().is_err());
    }

    #[test]
    fn test_role_kind_serde_uses_wire_values() {
        let json = serde_json::to_string(&RoleKind::Owner).unwrap();
        assert_eq!(json, "\"owner\"");
        let kind: RoleKind = serde_json::from_str("\"member\"").unwrap();
        assert_eq!(kind, RoleKind::Member);
        assert_eq!(RoleKind::values(), ["member", "owner", "unknown"]);
    }

    #[test]
    fn test_policy_id_rejects_blank() {
        assert!(PolicyId::new("").is_err());
        assert!(PolicyId::new("   ").is_err());
        assert_eq!(PolicyId::new("policy-abc").unwrap().as_str(), "policy-abc");
        assert!(serde_json::from_str::<PolicyId>("\"\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_any_uuid_parses(bytes in any::<[u8; 16]>()) {
            let text = Uuid::from_bytes(bytes).hyphenated().to_string();
            let parsed = GroupId::parse(&text).unwrap();
            prop_assert_eq!(parsed.as_str(), text.as_str());
        }

        #[test]
        fn prop_role_kind_accepts_only_closed_set(s in "\\PC{0,12}") {
            let parsed = s.parse::<RoleKind>();
            prop_assert_eq!(parsed.is_ok(), RoleKind::values().contains(&s.as_str()));
        }
    }
}
