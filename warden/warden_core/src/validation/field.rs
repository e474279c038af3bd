//! Field paths and field-scoped validation errors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dotted path to a field inside an object, e.g. `subjects[0].name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldPath(String);

impl FieldPath {
    /// Start a path at a top-level field.
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Start a path from several nested field names.
    pub fn from_parts(parts: &[&str]) -> Self {
        Self(parts.join("."))
    }

    /// Path to a child field.
    pub fn child(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self::new(name)
        } else {
            Self(format!("{}.{}", self.0, name))
        }
    }

    /// Path to a list element.
    pub fn index(&self, i: usize) -> Self {
        Self(format!("{}[{}]", self.0, i))
    }

    /// Path to a map entry.
    pub fn key(&self, key: &str) -> Self {
        Self(format!("{}[{}]", self.0, key))
    }

    /// The rendered path.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    /// A required field was empty.
    Required,

    /// A field held an invalid value.
    Invalid,

    /// A field held a value outside the supported set.
    NotSupported,
}

/// One validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// The kind of failure.
    pub error_type: ErrorType,

    /// Where the failure was found.
    pub field: FieldPath,

    /// The offending value, rendered.
    pub bad_value: String,

    /// Human-readable explanation.
    pub detail: String,
}

impl FieldError {
    /// A required field is missing.
    pub fn required(field: FieldPath, detail: impl Into<String>) -> Self {
        Self {
            error_type: ErrorType::Required,
            field,
            bad_value: String::new(),
            detail: detail.into(),
        }
    }

    /// A field has an invalid value.
    pub fn invalid(field: FieldPath, value: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            error_type: ErrorType::Invalid,
            field,
            bad_value: value.into(),
            detail: detail.into(),
        }
    }

    /// A field has a value outside `valid`.
    pub fn not_supported(field: FieldPath, value: impl Into<String>, valid: &[&str]) -> Self {
        let detail = if valid.is_empty() {
            String::new()
        } else {
            let quoted: Vec<String> = valid.iter().map(|v| format!("\"{}\"", v)).collect();
            format!("supported values: {}", quoted.join(", "))
        };

        Self {
            error_type: ErrorType::NotSupported,
            field,
            bad_value: value.into(),
            detail,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error_type {
            ErrorType::Required => write!(f, "{}: Required value", self.field)?,
            ErrorType::Invalid => {
                write!(f, "{}: Invalid value: \"{}\"", self.field, self.bad_value)?
            }
            ErrorType::NotSupported => {
                write!(f, "{}: Unsupported value: \"{}\"", self.field, self.bad_value)?
            }
        }

        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }

        Ok(())
    }
}

/// An ordered list of validation failures. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorList(Vec<FieldError>);

impl ErrorList {
    /// An empty list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append one error.
    pub fn push(&mut self, err: FieldError) {
        self.0.push(err);
    }

    /// Whether no errors were recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the errors in order.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// The errors as a slice.
    pub fn as_slice(&self) -> &[FieldError] {
        &self.0
    }

    /// Convert into `Ok(())` when empty, `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), ErrorList> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<Vec<FieldError>> for ErrorList {
    fn from(errs: Vec<FieldError>) -> Self {
        Self(errs)
    }
}

impl FromIterator<FieldError> for ErrorList {
    fn from_iter<I: IntoIterator<Item = FieldError>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<FieldError> for ErrorList {
    fn extend<I: IntoIterator<Item = FieldError>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for ErrorList {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.len() {
            0 => Ok(()),
            1 => write!(f, "{}", self.0[0]),
            _ => {
                write!(f, "[")?;
                for (i, err) in self.0.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                write!(f, "]")
            }
        }
    }
}
