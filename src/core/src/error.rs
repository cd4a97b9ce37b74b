//! Error types for policy lookups
//!
//! Three layers of errors exist: [`ValidationError`] for caller input that
//! never reaches the directory, [`DirectoryError`] for anything the directory
//! client reports, and [`ResolutionError`] for the outcome of resolving a
//! (group, role) pair. All of them classify into an [`ErrorKind`].

use std::fmt;
use thiserror::Error;

/// Result type for directory client operations
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Coarse classification shared by every error in this workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input failed format or membership checks
    Validation,
    /// No matching assignment, or the service returned a nil policy id
    NotFound,
    /// Network failure, non-2xx response or malformed payload
    Transport,
    /// Deadline exceeded or explicit cancellation
    Cancellation,
}

impl ErrorKind {
    /// Stable lowercase name, used in logs and diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Transport => "transport",
            ErrorKind::Cancellation => "cancellation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by a directory client
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// The requested object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Connection or protocol failure before a response was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// The request context was cancelled
    #[error("Request cancelled")]
    Cancelled,

    /// The request context deadline passed
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// Client configuration is invalid
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl DirectoryError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DirectoryError::NotFound(_) => ErrorKind::NotFound,
            DirectoryError::Cancelled | DirectoryError::DeadlineExceeded => ErrorKind::Cancellation,
            DirectoryError::Transport(_)
            | DirectoryError::Status { .. }
            | DirectoryError::Decode(_)
            | DirectoryError::Configuration(_) => ErrorKind::Transport,
        }
    }
}

/// Errors produced while resolving a group role management policy
#[derive(Debug, Clone, Error)]
pub enum ResolutionError {
    /// No policy assignment matched the group and role
    #[error("No policy assignment found for group {group_id} and role {role_id}")]
    NotFound { group_id: String, role_id: String },

    /// The assignment points at a policy that does not exist
    #[error("Policy {policy_id} referenced by the assignment was not found")]
    PolicyNotFound { policy_id: String },

    /// The service returned a record without a policy id
    #[error("ID is nil for returned Group Role Management Policy (group {group_id}, role {role_id})")]
    NilPolicyId { group_id: String, role_id: String },

    /// More than one assignment matched; exactly one is expected
    #[error("Got wrong number of policy assignments. Expected 1, got {count}")]
    Ambiguous { count: usize },

    /// The directory client failed
    #[error("Directory error: {0}")]
    Directory(#[source] DirectoryError),

    /// The request context was cancelled
    #[error("Resolution cancelled")]
    Cancelled,

    /// The request context deadline passed
    #[error("Resolution deadline exceeded")]
    DeadlineExceeded,
}

impl ResolutionError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolutionError::NotFound { .. }
            | ResolutionError::PolicyNotFound { .. }
            | ResolutionError::NilPolicyId { .. }
            | ResolutionError::Ambiguous { .. } => ErrorKind::NotFound,
            ResolutionError::Directory(e) => e.kind(),
            ResolutionError::Cancelled | ResolutionError::DeadlineExceeded => ErrorKind::Cancellation,
        }
    }
}

impl From<DirectoryError> for ResolutionError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Cancelled => ResolutionError::Cancelled,
            DirectoryError::DeadlineExceeded => ResolutionError::DeadlineExceeded,
            other => ResolutionError::Directory(other),
        }
    }
}

/// Input validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The group id is not UUID-shaped
    #[error("expected {field} to be a valid UUID, got {value:?}")]
    InvalidGroupId { field: String, value: String },

    /// The role id is not one of the recognized relationship kinds
    #[error("expected {field} to be one of [member owner unknown], got {value:?}")]
    InvalidRoleKind { field: String, value: String },

    /// A required attribute was not supplied
    #[error("the argument {field:?} is required, but no definition was found")]
    MissingField { field: String },

    /// A policy id must not be empty
    #[error("policy id must not be empty")]
    EmptyPolicyId,
}

impl ValidationError {
    /// Always [`ErrorKind::Validation`]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }

    /// Attribute the error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::InvalidGroupId { field, .. }
            | ValidationError::InvalidRoleKind { field, .. }
            | ValidationError::MissingField { field } => Some(field),
            ValidationError::EmptyPolicyId => None,
        }
    }
}
