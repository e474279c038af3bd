//! Label requirements.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Labels;
use crate::error::{Error, Result};
use crate::validation::{is_qualified_name, is_valid_label_value, FieldError, FieldPath};

/// Comparison applied by a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// The label equals the single value.
    Equals,

    /// The label is absent or differs from the single value.
    NotEquals,

    /// The label is present and one of the values.
    In,

    /// The label is absent or none of the values.
    NotIn,

    /// The label is present.
    Exists,

    /// The label is absent.
    DoesNotExist,
}

/// One predicate over a label set.
///
/// Requirements are immutable once built; `Clone` yields an independent copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requirement {
    pub(super) key: String,
    pub(super) operator: Operator,
    pub(super) values: Vec<String>,
}

impl Requirement {
    /// Create a requirement, checking the value count against the operator.
    ///
    /// `In` and `NotIn` need at least one value, `Equals` and `NotEquals`
    /// exactly one, `Exists` and `DoesNotExist` none. Set operators keep
    /// their values sorted and deduplicated.
    ///
    /// The key must be a qualified name and every value a valid label
    /// value, so the rendered form always parses back to the same
    /// requirement.
    pub fn new<I, S>(key: impl Into<String>, operator: Operator, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.into();
        let mut values: Vec<String> = values.into_iter().map(Into::into).collect();
        let path = FieldPath::new("requirement");
        let mut errs = Vec::new();

        if key.is_empty() {
            errs.push(FieldError::required(path.child("key"), "label key is required"));
        } else {
            for msg in is_qualified_name(&key) {
                errs.push(FieldError::invalid(path.child("key"), &key, msg));
            }
        }

        for (i, value) in values.iter().enumerate() {
            for msg in is_valid_label_value(value) {
                errs.push(FieldError::invalid(path.child("values").index(i), value, msg));
            }
        }

        match operator {
            Operator::In | Operator::NotIn => {
                if values.is_empty() {
                    errs.push(FieldError::invalid(
                        path.child("values"),
                        "[]",
                        "for 'in', 'notin' operators, values set can't be empty",
                    ));
                }
                values.sort();
                values.dedup();
            }
            Operator::Equals | Operator::NotEquals => {
                if values.len() != 1 {
                    errs.push(FieldError::invalid(
                        path.child("values"),
                        format!("{:?}", values),
                        "exact-match compatibility requires one single value",
                    ));
                }
            }
            Operator::Exists | Operator::DoesNotExist => {
                if !values.is_empty() {
                    errs.push(FieldError::invalid(
                        path.child("values"),
                        format!("{:?}", values),
                        "values set must be empty for exists and does not exist",
                    ));
                }
            }
        }

        if !errs.is_empty() {
            return Err(Error::Invalid(errs.into()));
        }

        Ok(Self {
            key,
            operator,
            values,
        })
    }

    /// Shorthand for an `Equals` requirement.
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        Self::new(key, Operator::Equals, [value.into()])
    }

    /// The label key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The values.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Whether the label set satisfies this requirement.
    pub fn matches(&self, labels: &Labels) -> bool {
        let value = labels.get(&self.key);
        match self.operator {
            Operator::Equals => value == self.values.first(),
            Operator::NotEquals => value != self.values.first(),
            Operator::In => value.is_some_and(|v| self.values.contains(v)),
            Operator::NotIn => !value.is_some_and(|v| self.values.contains(v)),
            Operator::Exists => value.is_some(),
            Operator::DoesNotExist => value.is_none(),
        }
    }

    /// Render this requirement as a parameterized query fragment and its
    /// arguments, e.g. `("team=?", ["infra"])`.
    pub fn to_query(&self) -> (String, Vec<String>) {
        let placeholders = || vec!["?"; self.values.len()].join(",");
        let query = match self.operator {
            Operator::Equals => format!("{}=?", self.key),
            Operator::NotEquals => format!("{}!=?", self.key),
            Operator::In => format!("{} IN ({})", self.key, placeholders()),
            Operator::NotIn => format!("{} NOT IN ({})", self.key, placeholders()),
            Operator::Exists => format!("{} IS NOT NULL", self.key),
            Operator::DoesNotExist => format!("{} IS NULL", self.key),
        };

        (query, self.values.clone())
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let single = self.values.first().map(String::as_str).unwrap_or_default();
        match self.operator {
            Operator::Equals => write!(f, "{}={}", self.key, single),
            Operator::NotEquals => write!(f, "{}!={}", self.key, single),
            Operator::In => write!(f, "{} in ({})", self.key, self.values.join(",")),
            Operator::NotIn => write!(f, "{} notin ({})", self.key, self.values.join(",")),
            Operator::Exists => write!(f, "{}", self.key),
            Operator::DoesNotExist => write!(f, "!{}", self.key),
        }
    }
}
