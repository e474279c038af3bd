//! Authorization decisions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The vote of one authorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// The request is allowed.
    Allow,

    /// The request is denied.
    Deny,

    /// The authorizer abstains; others may still decide.
    NoOpinion,
}

impl Decision {
    /// Whether this is a definitive vote.
    pub fn is_definitive(&self) -> bool {
        !matches!(self, Self::NoOpinion)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "ALLOW"),
            Self::Deny => write!(f, "DENY"),
            Self::NoOpinion => write!(f, "NO_OPINION"),
        }
    }
}

/// A decision with the reason behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    /// The decision.
    pub decision: Decision,

    /// Why the decision was reached. May be empty.
    pub reason: String,
}

impl Authorization {
    /// An `Allow` with a reason.
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Allow,
            reason: reason.into(),
        }
    }

    /// A `Deny` with a reason.
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Deny,
            reason: reason.into(),
        }
    }

    /// A `NoOpinion` with a reason.
    pub fn no_opinion(reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::NoOpinion,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "{}", self.decision)
        } else {
            write!(f, "{}: {}", self.decision, self.reason)
        }
    }
}
