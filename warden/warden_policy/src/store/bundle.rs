//! Policy bundles.
//!
//! A bundle is a JSON document carrying any number of RBAC objects:
//!
//! ```json
//! {
//!   "clusterRoles": [...],
//!   "clusterRoleBindings": [...],
//!   "roles": [...],
//!   "roleBindings": [...]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use warden_core::{ErrorList, Result};

use crate::model::{ClusterRole, ClusterRoleBinding, PolicyObject, Role, RoleBinding};
use crate::validation;

/// A set of RBAC objects loaded together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyBundle {
    /// Namespaced roles.
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Namespaced role bindings.
    #[serde(default)]
    pub role_bindings: Vec<RoleBinding>,

    /// Cluster roles.
    #[serde(default)]
    pub cluster_roles: Vec<ClusterRole>,

    /// Cluster role bindings.
    #[serde(default)]
    pub cluster_role_bindings: Vec<ClusterRoleBinding>,
}

impl PolicyBundle {
    /// Parse a bundle from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a bundle file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Total number of objects.
    pub fn len(&self) -> usize {
        self.roles.len()
            + self.role_bindings.len()
            + self.cluster_roles.len()
            + self.cluster_role_bindings.len()
    }

    /// Whether the bundle holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate every object without storing anything.
    ///
    /// Returns one entry per invalid object, labelled `Kind ns/name`.
    pub fn validate(&self) -> Vec<(String, ErrorList)> {
        let mut invalid = Vec::new();
        collect(&mut invalid, &self.cluster_roles, validation::validate_cluster_role);
        collect(&mut invalid, &self.roles, validation::validate_role);
        collect(
            &mut invalid,
            &self.cluster_role_bindings,
            validation::validate_cluster_role_binding,
        );
        collect(&mut invalid, &self.role_bindings, validation::validate_role_binding);
        invalid
    }
}

fn collect<T: PolicyObject>(
    out: &mut Vec<(String, ErrorList)>,
    objects: &[T],
    validate: fn(&T) -> ErrorList,
) {
    for object in objects {
        let errs = validate(object);
        if !errs.is_empty() {
            out.push((format!("{} {}", T::KIND, object.metadata()), errs));
        }
    }
}
