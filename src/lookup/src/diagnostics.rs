//! Operator-facing diagnostics

use rolepolicy_core::{ErrorKind, ValidationError};
use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The operation failed
    Error,
    /// The operation succeeded with a caveat
    Warning,
}

/// A single diagnostic: summary, detail, and structured key/value context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// One-line summary
    pub summary: String,
    /// Longer explanation
    pub detail: String,
    /// Attribute the diagnostic refers to, for validation failures
    pub attribute_path: Option<String>,
    /// Structured context, in insertion order
    pub attributes: Vec<(String, String)>,
    /// Classification of the underlying failure
    pub kind: Option<ErrorKind>,
}

impl Diagnostic {
    /// Error diagnostic
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute_path: None,
            attributes: Vec::new(),
            kind: None,
        }
    }

    /// Warning diagnostic
    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(summary, detail)
        }
    }

    /// Error diagnostic for a rejected input
    pub fn validation(err: &ValidationError) -> Self {
        let mut diag = Self::error("Invalid argument", err.to_string()).with_kind(err.kind());
        diag.attribute_path = err.field().map(str::to_string);
        diag
    }

    /// Append a key/value pair of context
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Record the failure classification
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Look up a context value by key
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether this is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
        };
        write!(f, "{label}: {}", self.summary)?;
        if let Some(path) = &self.attribute_path {
            write!(f, " (at {path})")?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        for (key, value) in &self.attributes {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

/// Ordered collection of diagnostics returned by an operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// No diagnostics
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    /// Whether any diagnostic is an error
    pub fn has_error(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    /// Whether there are no diagnostics at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of diagnostics
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate in order
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_keep_order() {
        let diag = Diagnostic::error("summary", "detail")
            .with_attribute("group_id", "g")
            .with_attribute("role_id", "owner");

        let keys: Vec<_> = diag.attributes.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["group_id", "role_id"]);
        assert_eq!(diag.attribute("role_id"), Some("owner"));
        assert_eq!(
            diag.to_string(),
            "Error: summary: detail group_id=g role_id=owner"
        );
    }

    #[test]
    fn test_validation_diagnostic_points_at_field() {
        let err = ValidationError::InvalidRoleKind {
            field: "role_id".to_string(),
            value: "admin".to_string(),
        };
        let diag = Diagnostic::validation(&err);

        assert_eq!(diag.kind, Some(ErrorKind::Validation));
        assert_eq!(diag.attribute_path.as_deref(), Some("role_id"));
        assert!(diag.detail.contains("admin"));
    }

    #[test]
    fn test_warnings_are_not_errors() {
        let diags: Diagnostics = vec![Diagnostic::warning("heads up", "")].into_iter().collect();
        assert!(!diags.has_error());
        assert_eq!(diags.len(), 1);
    }
}
