//! Attribute-based access control.
//!
//! ABAC policies come from a static file of JSON objects, one per line:
//!
//! ```text
//! # operators may read everything
//! {"group": "operators", "readonly": true, "verbs": ["*"], "resources": ["*"]}
//! {"user": "alice", "namespace": "dev", "verbs": ["get", "create"], "resources": ["pods"]}
//! {"user": "*", "verbs": ["get"], "nonResourceURLs": ["/healthz"]}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. The file is read
//! once; a malformed line fails the whole load.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};
use warden_core::{Attributes, Authorization, AuthorizationError, Context, FieldPath, Result};

use super::registry::MODE_ABAC;
use super::rule::rule_allows;
use super::Authorizer;
use crate::model::rbac::WILDCARD;
use crate::model::PolicyRule;
use crate::validation::validate_policy_rule;

/// One ABAC policy line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbacPolicy {
    /// User name, or `*` for every user.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,

    /// Group name, or `*` for every group.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,

    /// Namespace of resource requests. Empty or `*` covers every namespace.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    /// Restrict the policy to `get`, `list` and `watch`.
    #[serde(default)]
    pub readonly: bool,

    /// What the policy grants.
    #[serde(flatten)]
    pub rule: PolicyRule,
}

impl AbacPolicy {
    /// Structural problems with this policy. Empty means valid.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.user.is_empty() && self.group.is_empty() {
            problems.push("policy must name a user or a group".to_string());
        }
        problems.extend(
            validate_policy_rule(&self.rule, false, &FieldPath::new(""))
                .iter()
                .map(ToString::to_string),
        );
        problems
    }

    /// Whether the policy covers the request.
    pub fn matches(&self, attrs: &Attributes) -> bool {
        if !self.subject_matches(attrs) {
            return false;
        }
        if self.readonly && !attrs.is_read_only() {
            return false;
        }
        if attrs.resource_request && !self.namespace_matches(&attrs.namespace) {
            return false;
        }
        rule_allows(attrs, &self.rule)
    }

    /// A set user must match, and so must a set group.
    fn subject_matches(&self, attrs: &Attributes) -> bool {
        let mut matched = false;

        if !self.user.is_empty() {
            if self.user != WILDCARD && self.user != attrs.user.name {
                return false;
            }
            matched = true;
        }

        if !self.group.is_empty() {
            if self.group != WILDCARD && !attrs.user.in_group(&self.group) {
                return false;
            }
            matched = true;
        }

        matched
    }

    fn namespace_matches(&self, namespace: &str) -> bool {
        self.namespace.is_empty() || self.namespace == WILDCARD || self.namespace == namespace
    }
}

/// The ABAC authorizer.
#[derive(Debug, Clone, Default)]
pub struct AbacAuthorizer {
    /// Policies with their one-based source line.
    policies: Vec<(usize, AbacPolicy)>,
}

impl AbacAuthorizer {
    /// Create an authorizer from policies built in code.
    pub fn new(policies: Vec<AbacPolicy>) -> Self {
        Self {
            policies: policies.into_iter().enumerate().map(|(i, p)| (i + 1, p)).collect(),
        }
    }

    /// Load a policy file.
    ///
    /// # Returns
    ///
    /// * `Ok(AbacAuthorizer)` - If every line parsed and validated.
    /// * `Err(AuthorizationError::PolicyFileLoad)` - Naming the first bad
    ///   line, or line 0 if the file could not be opened.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let file = File::open(path).map_err(|err| load_error(&source, 0, err.to_string()))?;
        Self::from_reader(BufReader::new(file), &source)
    }

    /// Load policies from a reader. `source` names the input in errors.
    pub fn from_reader<R: BufRead>(reader: R, source: &str) -> Result<Self> {
        let mut policies = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line.map_err(|err| load_error(source, line_no, err.to_string()))?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let policy: AbacPolicy = serde_json::from_str(trimmed)
                .map_err(|err| load_error(source, line_no, err.to_string()))?;

            let problems = policy.problems();
            if !problems.is_empty() {
                return Err(load_error(source, line_no, problems.join("; ")));
            }

            policies.push((line_no, policy));
        }

        info!(source, policies = policies.len(), "Loaded ABAC policy file");
        Ok(Self { policies })
    }

    /// Number of loaded policies.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether no policies are loaded.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

fn load_error(source: &str, line: usize, reason: String) -> warden_core::Error {
    AuthorizationError::PolicyFileLoad {
        path: source.to_string(),
        line,
        reason,
    }
    .into()
}

impl Authorizer for AbacAuthorizer {
    fn name(&self) -> &str {
        MODE_ABAC
    }

    fn authorize(&self, ctx: &Context, attrs: &Attributes) -> Result<Authorization> {
        ctx.check()?;

        match self.policies.iter().find(|(_, policy)| policy.matches(attrs)) {
            Some((line, _)) => {
                debug!(user = %attrs.user.name, line, "ABAC allowed request");
                Ok(Authorization::allow(format!("ABAC: allowed by policy on line {}", line)))
            }
            None => Ok(Authorization::no_opinion("ABAC: no policy matched")),
        }
    }
}
