//! Error types for the HMS core.
//!
//! Every domain operation returns a typed [`HmsError`]; the boundary layer
//! is responsible for presentation (HTTP status codes, response bodies).
//! Sensitive values (passwords, tokens) must never appear in error text.

use std::collections::BTreeMap;

/// Ordered map of field name to a caller-correctable message.
///
/// Produced by input validation; a non-empty map always means the operation
/// persisted nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Creates an empty field-error map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message against a field, replacing any earlier message.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    /// Returns the message recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Consumes the map, yielding `Ok(())` when no errors were recorded.
    pub fn into_result(self) -> HmsResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(HmsError::Validation(self))
        }
    }

    /// Iterates over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Failure modes shared by every domain operation.
#[derive(Debug, thiserror::Error)]
pub enum HmsError {
    /// Field-level validation failed; no state was persisted.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    /// A reference resolved to no record. Carries the record kind.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Missing, invalid, or expired credential. Deliberately carries no
    /// detail so callers cannot distinguish unknown usernames from bad
    /// passwords.
    #[error("invalid credentials")]
    Unauthorized,
    /// Valid credential, insufficient role.
    #[error("insufficient permissions")]
    Forbidden,
    /// Uniqueness violation on registration. Carries the offending field.
    #[error("{0} already exists")]
    Conflict(&'static str),
    /// Unexpected infrastructure failure (hashing, token minting).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias used across the core crate.
pub type HmsResult<T> = std::result::Result<T, HmsError>;
