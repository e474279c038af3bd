//! RBAC policy objects.
//!
//! Roles bundle [`PolicyRule`]s; bindings grant a role's rules to subjects.
//! All objects are owned by the policy store and handed out as read-only
//! snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;
use warden_core::Labels;

/// Matches any verb, resource or API group.
pub const WILDCARD: &str = "*";

/// Subject kind for service accounts.
pub const SERVICE_ACCOUNT_KIND: &str = "ServiceAccount";

/// Subject kind for users.
pub const USER_KIND: &str = "User";

/// Subject kind for groups.
pub const GROUP_KIND: &str = "Group";

/// Role reference kind for namespaced roles.
pub const ROLE_KIND: &str = "Role";

/// Role reference kind for cluster roles.
pub const CLUSTER_ROLE_KIND: &str = "ClusterRole";

/// Object kind for role bindings.
pub const ROLE_BINDING_KIND: &str = "RoleBinding";

/// Object kind for cluster role bindings.
pub const CLUSTER_ROLE_BINDING_KIND: &str = "ClusterRoleBinding";

/// Identity and labels of a policy object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// The object name.
    pub name: String,

    /// The namespace. Empty for cluster-scoped objects.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    /// Labels used for selection.
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
}

impl ObjectMeta {
    /// Metadata for a cluster-scoped object.
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Metadata for a namespaced object.
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// Add labels.
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels.extend(labels);
        self
    }
}

impl fmt::Display for ObjectMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

/// Common behavior of stored policy objects.
pub trait PolicyObject: Clone + Send + Sync + 'static {
    /// The object kind, e.g. `Role`.
    const KIND: &'static str;

    /// Whether objects of this kind live in a namespace.
    const NAMESPACED: bool;

    /// The object's metadata.
    fn metadata(&self) -> &ObjectMeta;
}

/// One grant of verbs over resources or non-resource URLs.
///
/// A valid rule is either resource-shaped (resources set, no URLs) or
/// non-resource-shaped (URLs set, no resources or resource names).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    /// Verbs this rule grants. `*` grants all verbs.
    #[serde(default)]
    pub verbs: Vec<String>,

    /// API groups. Recorded but not consulted when matching.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_groups: Vec<String>,

    /// Resource types. `*` covers all resources.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,

    /// Restricts the rule to named objects. Empty means any name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_names: Vec<String>,

    /// URL paths. An entry ending in `/*` covers every path below it.
    #[serde(
        default,
        rename = "nonResourceURLs",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub non_resource_urls: Vec<String>,
}

impl PolicyRule {
    /// A resource rule.
    pub fn resource<V, R>(verbs: V, resources: R) -> Self
    where
        V: IntoIterator,
        V::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            verbs: verbs.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// A non-resource rule.
    pub fn non_resource<V, U>(verbs: V, urls: U) -> Self
    where
        V: IntoIterator,
        V::Item: Into<String>,
        U: IntoIterator,
        U::Item: Into<String>,
    {
        Self {
            verbs: verbs.into_iter().map(Into::into).collect(),
            non_resource_urls: urls.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Restrict the rule to named objects.
    pub fn with_resource_names<N>(mut self, names: N) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
    {
        self.resource_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the API groups.
    pub fn with_api_groups<G>(mut self, groups: G) -> Self
    where
        G: IntoIterator,
        G::Item: Into<String>,
    {
        self.api_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the rule targets resources only.
    pub fn is_resource_shaped(&self) -> bool {
        !self.resources.is_empty() && self.non_resource_urls.is_empty()
    }

    /// Whether the rule targets URL paths only.
    pub fn is_non_resource_shaped(&self) -> bool {
        !self.non_resource_urls.is_empty()
            && self.resources.is_empty()
            && self.resource_names.is_empty()
    }
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let mut sep = "";
        let fields: [(&str, &Vec<String>); 5] = [
            ("APIGroups", &self.api_groups),
            ("Resources", &self.resources),
            ("ResourceNames", &self.resource_names),
            ("NonResourceURLs", &self.non_resource_urls),
            ("Verbs", &self.verbs),
        ];
        for (label, values) in fields {
            if values.is_empty() {
                continue;
            }
            write!(f, "{}{}:{:?}", sep, label, values)?;
            sep = ", ";
        }
        write!(f, "}}")
    }
}

/// A namespaced bundle of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Object metadata; `namespace` is required.
    pub metadata: ObjectMeta,

    /// The rules this role grants.
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

impl Role {
    /// Create a role.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, rules: Vec<PolicyRule>) -> Self {
        Self {
            metadata: ObjectMeta::namespaced(namespace, name),
            rules,
        }
    }
}

impl PolicyObject for Role {
    const KIND: &'static str = ROLE_KIND;
    const NAMESPACED: bool = true;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

/// A cluster-scoped bundle of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRole {
    /// Object metadata; `namespace` must be empty.
    pub metadata: ObjectMeta,

    /// The rules this role grants.
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

impl ClusterRole {
    /// Create a cluster role.
    pub fn new(name: impl Into<String>, rules: Vec<PolicyRule>) -> Self {
        Self {
            metadata: ObjectMeta::cluster(name),
            rules,
        }
    }
}

impl PolicyObject for ClusterRole {
    const KIND: &'static str = CLUSTER_ROLE_KIND;
    const NAMESPACED: bool = false;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

/// An entity rules can be granted to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// One of `ServiceAccount`, `User` or `Group`.
    pub kind: String,

    /// The subject name.
    pub name: String,

    /// Namespace of a service account subject.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

impl Subject {
    /// A user subject.
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            kind: USER_KIND.to_string(),
            name: name.into(),
            namespace: String::new(),
        }
    }

    /// A group subject.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            kind: GROUP_KIND.to_string(),
            name: name.into(),
            namespace: String::new(),
        }
    }

    /// A service account subject.
    pub fn service_account(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: SERVICE_ACCOUNT_KIND.to_string(),
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{} {:?}", self.kind, self.name)
        } else {
            write!(f, "{} {:?}", self.kind, format!("{}/{}", self.namespace, self.name))
        }
    }
}

/// The role a binding grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleRef {
    /// `Role` or `ClusterRole`.
    pub kind: String,

    /// The role name.
    pub name: String,
}

impl RoleRef {
    /// Reference a namespaced role.
    pub fn role(name: impl Into<String>) -> Self {
        Self {
            kind: ROLE_KIND.to_string(),
            name: name.into(),
        }
    }

    /// Reference a cluster role.
    pub fn cluster_role(name: impl Into<String>) -> Self {
        Self {
            kind: CLUSTER_ROLE_KIND.to_string(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RoleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.kind, self.name)
    }
}

/// Grants a role's rules to subjects within one namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBinding {
    /// Object metadata; `namespace` is required.
    pub metadata: ObjectMeta,

    /// The granted role. Immutable after creation.
    pub role_ref: RoleRef,

    /// Who receives the grant.
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

impl RoleBinding {
    /// Create a role binding.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        role_ref: RoleRef,
        subjects: Vec<Subject>,
    ) -> Self {
        Self {
            metadata: ObjectMeta::namespaced(namespace, name),
            role_ref,
            subjects,
        }
    }
}

impl PolicyObject for RoleBinding {
    const KIND: &'static str = ROLE_BINDING_KIND;
    const NAMESPACED: bool = true;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

/// Grants a cluster role's rules to subjects everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRoleBinding {
    /// Object metadata; `namespace` must be empty.
    pub metadata: ObjectMeta,

    /// The granted cluster role. Immutable after creation.
    pub role_ref: RoleRef,

    /// Who receives the grant.
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

impl ClusterRoleBinding {
    /// Create a cluster role binding.
    pub fn new(name: impl Into<String>, role_ref: RoleRef, subjects: Vec<Subject>) -> Self {
        Self {
            metadata: ObjectMeta::cluster(name),
            role_ref,
            subjects,
        }
    }
}

impl PolicyObject for ClusterRoleBinding {
    const KIND: &'static str = CLUSTER_ROLE_BINDING_KIND;
    const NAMESPACED: bool = false;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_shape() {
        let rule = PolicyRule::resource(["get"], ["pods"]);
        assert!(rule.is_resource_shaped());
        assert!(!rule.is_non_resource_shaped());

        let rule = PolicyRule::non_resource(["get"], ["/metrics/*"]);
        assert!(rule.is_non_resource_shaped());
        assert!(!rule.is_resource_shaped());

        let mut mixed = PolicyRule::non_resource(["get"], ["/metrics"]);
        mixed.resource_names = vec!["x".into()];
        assert!(!mixed.is_non_resource_shaped());
        assert!(!mixed.is_resource_shaped());
    }

    #[test]
    fn test_rule_display() {
        let rule = PolicyRule::resource(["get", "list"], ["pods"]).with_resource_names(["web"]);
        assert_eq!(
            rule.to_string(),
            r#"{Resources:["pods"], ResourceNames:["web"], Verbs:["get", "list"]}"#
        );
    }

    #[test]
    fn test_rule_json_field_names() {
        let json = r#"{"verbs":["get"],"nonResourceURLs":["/healthz"]}"#;
        let rule: PolicyRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.non_resource_urls, vec!["/healthz".to_string()]);
        assert_eq!(serde_json::to_string(&rule).unwrap(), json);
    }

    #[test]
    fn test_binding_json() {
        let json = r#"{
            "metadata": {"name": "read-pods", "namespace": "dev"},
            "roleRef": {"kind": "Role", "name": "pod-reader"},
            "subjects": [{"kind": "User", "name": "alice"}]
        }"#;
        let binding: RoleBinding = serde_json::from_str(json).unwrap();
        assert_eq!(binding.metadata.to_string(), "dev/read-pods");
        assert_eq!(binding.role_ref, RoleRef::role("pod-reader"));
        assert_eq!(binding.subjects, vec![Subject::user("alice")]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Subject::user("alice").to_string(), "User \"alice\"");
        assert_eq!(
            Subject::service_account("ci", "bot").to_string(),
            "ServiceAccount \"ci/bot\""
        );
        assert_eq!(RoleRef::cluster_role("view").to_string(), "ClusterRole \"view\"");
    }
}
