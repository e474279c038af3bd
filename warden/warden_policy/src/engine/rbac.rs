//! Role-based access control.
//!
//! The RBAC authorizer walks the bindings that apply to a request,
//! resolves each binding's role and allows the request as soon as one
//! rule covers it. It never denies: a request no rule covers gets
//! `NoOpinion`.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use warden_core::types::serviceaccount;
use warden_core::{Attributes, Authorization, Context, Error, Result, Selector, UserInfo};

use super::registry::MODE_RBAC;
use super::rule::rule_allows;
use super::Authorizer;
use crate::model::rbac::{
    CLUSTER_ROLE_BINDING_KIND, CLUSTER_ROLE_KIND, GROUP_KIND, ROLE_BINDING_KIND, ROLE_KIND,
    SERVICE_ACCOUNT_KIND, USER_KIND,
};
use crate::model::{
    ClusterRole, ClusterRoleBinding, ObjectMeta, PolicyRule, Role, RoleBinding, RoleRef, Subject,
};
use crate::store::{ClusterLister, NamespaceLister, PolicyListers};

/// Every rule granted to one user, as far as it could be resolved.
#[derive(Debug, Clone, Default)]
pub struct RuleResolution {
    /// The granted rules, cluster-wide grants first.
    pub rules: Vec<PolicyRule>,

    /// Store failures hit while resolving. Missing roles are not failures.
    pub errors: Vec<String>,
}

impl RuleResolution {
    /// Whether every applicable binding was resolved.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The RBAC authorizer.
pub struct RbacAuthorizer {
    roles: Arc<dyn NamespaceLister<Role>>,
    role_bindings: Arc<dyn NamespaceLister<RoleBinding>>,
    cluster_roles: Arc<dyn ClusterLister<ClusterRole>>,
    cluster_role_bindings: Arc<dyn ClusterLister<ClusterRoleBinding>>,
    binding_selector: Selector,
}

/// A binding of either scope.
struct Binding<'a> {
    kind: &'static str,
    metadata: &'a ObjectMeta,
    role_ref: &'a RoleRef,
    subjects: &'a [Subject],
}

impl<'a> From<&'a RoleBinding> for Binding<'a> {
    fn from(binding: &'a RoleBinding) -> Self {
        Self {
            kind: ROLE_BINDING_KIND,
            metadata: &binding.metadata,
            role_ref: &binding.role_ref,
            subjects: &binding.subjects,
        }
    }
}

impl<'a> From<&'a ClusterRoleBinding> for Binding<'a> {
    fn from(binding: &'a ClusterRoleBinding) -> Self {
        Self {
            kind: CLUSTER_ROLE_BINDING_KIND,
            metadata: &binding.metadata,
            role_ref: &binding.role_ref,
            subjects: &binding.subjects,
        }
    }
}

/// Where a visited rule came from.
struct RuleSource<'a> {
    binding: &'a Binding<'a>,
    subject: &'a Subject,
}

impl fmt::Display for RuleSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} of {} to {}",
            self.binding.kind,
            self.binding.metadata.to_string(),
            self.binding.role_ref,
            self.subject
        )
    }
}

/// A resolved role.
enum RoleRules {
    Role(Arc<Role>),
    Cluster(Arc<ClusterRole>),
}

impl RoleRules {
    fn rules(&self) -> &[PolicyRule] {
        match self {
            Self::Role(role) => &role.rules,
            Self::Cluster(role) => &role.rules,
        }
    }
}

impl RbacAuthorizer {
    /// Create an RBAC authorizer reading from `listers`.
    pub fn new(listers: PolicyListers) -> Self {
        Self {
            roles: listers.roles,
            role_bindings: listers.role_bindings,
            cluster_roles: listers.cluster_roles,
            cluster_role_bindings: listers.cluster_role_bindings,
            binding_selector: Selector::everything(),
        }
    }

    /// Only consider bindings whose labels match `selector`.
    pub fn with_binding_selector(mut self, selector: Selector) -> Self {
        self.binding_selector = selector;
        self
    }

    /// Enumerate every rule granted to `user` in `namespace`.
    ///
    /// Cluster-wide grants are always included. An empty `namespace`
    /// yields only cluster-wide grants.
    ///
    /// # Returns
    ///
    /// * `Ok(RuleResolution)` - The rules, plus any store failures that
    ///   left the enumeration incomplete.
    /// * `Err` - If the evaluation was aborted.
    pub fn rules_for(&self, ctx: &Context, user: &UserInfo, namespace: &str) -> Result<RuleResolution> {
        let mut rules = Vec::new();
        let errors = self.visit_rules_for(ctx, user, namespace, |_, rule| {
            rules.push(rule.clone());
            true
        })?;

        Ok(RuleResolution {
            rules,
            errors: errors.iter().map(ToString::to_string).collect(),
        })
    }

    /// Visit every rule granted to `user`, cluster role bindings first.
    ///
    /// The visitor returns `false` to stop. Store failures are collected and
    /// returned; only an aborted evaluation ends the walk with `Err`.
    fn visit_rules_for<F>(
        &self,
        ctx: &Context,
        user: &UserInfo,
        namespace: &str,
        mut visitor: F,
    ) -> Result<Vec<Error>>
    where
        F: FnMut(&RuleSource<'_>, &PolicyRule) -> bool,
    {
        let mut errors = Vec::new();

        match self.cluster_role_bindings.list(ctx, &self.binding_selector) {
            Ok(bindings) => {
                for binding in &bindings {
                    let binding = Binding::from(&**binding);
                    if !self.visit_binding(ctx, user, "", &binding, &mut visitor, &mut errors)? {
                        return Ok(errors);
                    }
                }
            }
            Err(err) => note_error(err, &mut errors)?,
        }

        if namespace.is_empty() {
            return Ok(errors);
        }

        match self.role_bindings.list(ctx, namespace, &self.binding_selector) {
            Ok(bindings) => {
                for binding in &bindings {
                    let binding = Binding::from(&**binding);
                    if !self.visit_binding(ctx, user, namespace, &binding, &mut visitor, &mut errors)? {
                        return Ok(errors);
                    }
                }
            }
            Err(err) => note_error(err, &mut errors)?,
        }

        Ok(errors)
    }

    /// Visit the rules of one binding if it applies to `user`. Returns
    /// whether the walk should continue.
    fn visit_binding<F>(
        &self,
        ctx: &Context,
        user: &UserInfo,
        namespace: &str,
        binding: &Binding<'_>,
        visitor: &mut F,
        errors: &mut Vec<Error>,
    ) -> Result<bool>
    where
        F: FnMut(&RuleSource<'_>, &PolicyRule) -> bool,
    {
        let Some(subject) = applies_to(user, binding.subjects, namespace) else {
            return Ok(true);
        };

        let role = match self.role_rules(ctx, namespace, binding.role_ref) {
            Ok(Some(role)) => role,
            Ok(None) => return Ok(true),
            Err(err) => {
                note_error(err, errors)?;
                return Ok(true);
            }
        };

        let source = RuleSource { binding, subject };
        for rule in role.rules() {
            if !visitor(&source, rule) {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Resolve a role reference. Missing roles resolve to `None`.
    fn role_rules(&self, ctx: &Context, namespace: &str, role_ref: &RoleRef) -> Result<Option<RoleRules>> {
        let resolved = match role_ref.kind.as_str() {
            ROLE_KIND if !namespace.is_empty() => self
                .roles
                .get(ctx, namespace, &role_ref.name)
                .map(RoleRules::Role),
            CLUSTER_ROLE_KIND => self
                .cluster_roles
                .get(ctx, &role_ref.name)
                .map(RoleRules::Cluster),
            _ => {
                warn!(role_ref = %role_ref, namespace, "Ignoring unsupported role reference");
                return Ok(None);
            }
        };

        match resolved {
            Ok(role) => Ok(Some(role)),
            Err(err) if err.is_not_found() => {
                debug!(role_ref = %role_ref, namespace, "Dangling role reference grants nothing");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// Keep a store failure for later, unless the evaluation was aborted.
fn note_error(err: Error, errors: &mut Vec<Error>) -> Result<()> {
    if err.is_aborted() {
        return Err(err);
    }

    warn!(error = %err, "Failed to resolve RBAC policy");
    errors.push(err);
    Ok(())
}

/// The first subject naming `user`. `namespace` is the binding's
/// namespace, empty for cluster role bindings.
fn applies_to<'s>(user: &UserInfo, subjects: &'s [Subject], namespace: &str) -> Option<&'s Subject> {
    subjects
        .iter()
        .find(|subject| subject_matches(user, subject, namespace))
}

fn subject_matches(user: &UserInfo, subject: &Subject, namespace: &str) -> bool {
    match subject.kind.as_str() {
        USER_KIND => user.name == subject.name,
        GROUP_KIND => user.in_group(&subject.name),
        SERVICE_ACCOUNT_KIND => {
            let sa_namespace = if subject.namespace.is_empty() {
                namespace
            } else {
                subject.namespace.as_str()
            };
            !sa_namespace.is_empty()
                && serviceaccount::matches_username(sa_namespace, &subject.name, &user.name)
        }
        _ => false,
    }
}

impl Authorizer for RbacAuthorizer {
    fn name(&self) -> &str {
        MODE_RBAC
    }

    fn authorize(&self, ctx: &Context, attrs: &Attributes) -> Result<Authorization> {
        // URL paths are not namespaced, so only cluster-wide grants apply.
        let namespace = if attrs.resource_request {
            attrs.namespace.as_str()
        } else {
            ""
        };

        let mut allowed_by = None;
        let errors = self.visit_rules_for(ctx, &attrs.user, namespace, |source, rule| {
            if rule_allows(attrs, rule) {
                allowed_by = Some(source.to_string());
                return false;
            }
            true
        })?;

        if let Some(source) = allowed_by {
            debug!(user = %attrs.user.name, source = %source, "RBAC allowed request");
            return Ok(Authorization::allow(format!("RBAC: allowed by {}", source)));
        }

        if let Some(err) = errors.into_iter().next() {
            return Err(err);
        }

        Ok(Authorization::no_opinion("RBAC: no rule matched"))
    }
}
