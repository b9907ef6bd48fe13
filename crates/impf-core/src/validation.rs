//! Per-field validation errors for operator input.
//!
//! Messages are in German, matching the operator-facing UI of the vaccination
//! center. The web layer renders them verbatim.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single rejected field and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
  pub field:   String,
  pub message: String,
}

/// A non-empty list of [`FieldError`]s collected while validating one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
  pub fn new() -> Self { Self::default() }

  /// Record a rejected field.
  pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
    self.0.push(FieldError {
      field:   field.into(),
      message: message.into(),
    });
  }

  /// Shorthand for a list holding exactly one error.
  pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
    let mut errors = Self::new();
    errors.push(field, message);
    errors
  }

  /// Move every error of `other` into `self`, prefixing field names with
  /// `prefix` (used for batch imports, e.g. `persons[3].phone`).
  pub fn absorb(&mut self, prefix: &str, other: ValidationErrors) {
    for e in other.0 {
      self.0.push(FieldError {
        field:   format!("{prefix}.{}", e.field),
        message: e.message,
      });
    }
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn errors(&self) -> &[FieldError] { &self.0 }

  /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
  pub fn into_result(self) -> Result<(), Self> {
    if self.is_empty() { Ok(()) } else { Err(self) }
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for e in &self.0 {
      if !first {
        f.write_str("; ")?;
      }
      write!(f, "{}: {}", e.field, e.message)?;
      first = false;
    }
    Ok(())
  }
}

impl std::error::Error for ValidationErrors {}
