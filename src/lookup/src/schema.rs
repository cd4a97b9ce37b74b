//! Data source schema and the validation gate
//!
//! Raw attribute strings only become a [`LookupInput`] after every field has
//! passed its validator, so nothing unvalidated can reach the locator.

use crate::resource::ResourceData;
use rolepolicy_core::{GroupId, RoleKind, ValidationError};
use std::time::Duration;

/// Read timeout declared by the data source
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Name of the group id attribute
pub const GROUP_ID_FIELD: &str = "group_id";

/// Name of the role id attribute
pub const ROLE_ID_FIELD: &str = "role_id";

/// Value check applied to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// Hyphenated UUID
    Uuid,
    /// One of the recognized role relationship kinds, case-sensitive
    RoleKind,
}

impl Validator {
    /// Check `value` for the field named `field`
    pub fn validate(&self, field: &str, value: &str) -> Result<(), ValidationError> {
        let ok = match self {
            Validator::Uuid => GroupId::parse(value).is_ok(),
            Validator::RoleKind => value.parse::<RoleKind>().is_ok(),
        };
        if ok {
            return Ok(());
        }

        let (field, value) = (field.to_string(), value.to_string());
        Err(match self {
            Validator::Uuid => ValidationError::InvalidGroupId { field, value },
            Validator::RoleKind => ValidationError::InvalidRoleKind { field, value },
        })
    }
}

/// Declaration of a single attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    /// Attribute name
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Must be supplied
    pub required: bool,
    /// Changing the value replaces the whole lookup
    pub force_new: bool,
    /// Value check
    pub validator: Validator,
}

/// Declaration of a data source: its fields and read timeout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceSchema {
    /// Fields in declaration order
    pub fields: Vec<FieldSchema>,
    /// Upper bound on a single read
    pub read_timeout: Duration,
}

impl DataSourceSchema {
    /// Find a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate every field of `data`, collecting all failures
    pub fn validate(&self, data: &ResourceData) -> Vec<ValidationError> {
        self.fields
            .iter()
            .filter_map(|field| match data.get(field.name) {
                Some(value) => field.validator.validate(field.name, value).err(),
                None if field.required => Some(ValidationError::MissingField {
                    field: field.name.to_string(),
                }),
                None => None,
            })
            .collect()
    }
}

/// Schema of the group role management policy data source
pub fn group_role_management_policy_schema() -> DataSourceSchema {
    DataSourceSchema {
        fields: vec![
            FieldSchema {
                name: GROUP_ID_FIELD,
                description: "ID of the group to which this policy is assigned",
                required: true,
                force_new: true,
                validator: Validator::Uuid,
            },
            FieldSchema {
                name: ROLE_ID_FIELD,
                description: "The ID of the role of this policy to the group",
                required: true,
                force_new: true,
                validator: Validator::RoleKind,
            },
        ],
        read_timeout: DEFAULT_READ_TIMEOUT,
    }
}

/// Validated input to a lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupInput {
    /// Group that owns the role assignment
    pub group_id: GroupId,
    /// Role relationship kind
    pub role_id: RoleKind,
}

impl LookupInput {
    /// Input from already-typed values
    pub fn new(group_id: GroupId, role_id: RoleKind) -> Self {
        Self { group_id, role_id }
    }

    /// Validate raw attributes against `schema` and build the typed input
    pub fn from_resource(
        schema: &DataSourceSchema,
        data: &ResourceData,
    ) -> Result<Self, Vec<ValidationError>> {
        let errors = schema.validate(data);
        if !errors.is_empty() {
            return Err(errors);
        }

        let group_id = data.get(GROUP_ID_FIELD).unwrap_or_default().parse::<GroupId>();
        let role_id = data.get(ROLE_ID_FIELD).unwrap_or_default().parse::<RoleKind>();
        match (group_id, role_id) {
            (Ok(group_id), Ok(role_id)) => Ok(Self { group_id, role_id }),
            (group_id, role_id) => Err(group_id.err().into_iter().chain(role_id.err()).collect()),
        }
    }
}
