//! Authenticated user information.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known group every authenticated user belongs to.
pub const ALL_AUTHENTICATED: &str = "system:authenticated";

/// The identity a request is authorized for.
///
/// Produced by authentication, which is outside this engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// The user name.
    pub name: String,

    /// A unique identifier, if the authenticator supplies one.
    #[serde(default)]
    pub uid: String,

    /// Groups the user belongs to.
    #[serde(default)]
    pub groups: Vec<String>,

    /// Extra attributes supplied by the authenticator.
    #[serde(default)]
    pub extra: BTreeMap<String, Vec<String>>,
}

impl UserInfo {
    /// Create a user with a name and no groups.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add groups to this user.
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Whether the user belongs to `group`.
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}
