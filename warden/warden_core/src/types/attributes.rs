//! Request attributes.
//!
//! Everything an authorizer may consult about a request: who is asking,
//! which verb, and either a typed resource or a literal URL path.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::UserInfo;

/// Attributes of one request to authorize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    /// The requesting user.
    pub user: UserInfo,

    /// The verb, e.g. `get` or `delete`.
    pub verb: String,

    /// Namespace of the target object. Empty for cluster-scoped targets.
    #[serde(default)]
    pub namespace: String,

    /// API group of the resource.
    #[serde(default)]
    pub api_group: String,

    /// Resource type, e.g. `pods`.
    #[serde(default)]
    pub resource: String,

    /// Subresource, e.g. `log`.
    #[serde(default)]
    pub subresource: String,

    /// Name of the target object, if the request names one.
    #[serde(default)]
    pub name: String,

    /// URL path for non-resource requests.
    #[serde(default)]
    pub path: String,

    /// Whether the request targets a resource rather than a URL path.
    pub resource_request: bool,
}

impl Attributes {
    /// Attributes for a request against a typed resource.
    pub fn resource(
        user: UserInfo,
        verb: impl Into<String>,
        resource: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            user,
            verb: verb.into(),
            resource: resource.into(),
            namespace: namespace.into(),
            resource_request: true,
            ..Self::default()
        }
    }

    /// Attributes for a request against a literal URL path.
    pub fn non_resource(user: UserInfo, verb: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            user,
            verb: verb.into(),
            path: path.into(),
            resource_request: false,
            ..Self::default()
        }
    }

    /// Set the target object name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the subresource.
    pub fn with_subresource(mut self, subresource: impl Into<String>) -> Self {
        self.subresource = subresource.into();
        self
    }

    /// Set the API group.
    pub fn with_api_group(mut self, api_group: impl Into<String>) -> Self {
        self.api_group = api_group.into();
        self
    }

    /// The resource as matched against rules: `resource/subresource` when a
    /// subresource is set.
    pub fn combined_resource(&self) -> String {
        if self.subresource.is_empty() {
            self.resource.clone()
        } else {
            format!("{}/{}", self.resource, self.subresource)
        }
    }

    /// Whether the verb only reads.
    pub fn is_read_only(&self) -> bool {
        matches!(self.verb.as_str(), "get" | "list" | "watch")
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user {:?} {}", self.user.name, self.verb)?;

        if !self.resource_request {
            return write!(f, " path {:?}", self.path);
        }

        write!(f, " resource {:?}", self.combined_resource())?;
        if !self.name.is_empty() {
            write!(f, " named {:?}", self.name)?;
        }
        if self.namespace.is_empty() {
            write!(f, " cluster-wide")
        } else {
            write!(f, " in namespace {:?}", self.namespace)
        }
    }
}
