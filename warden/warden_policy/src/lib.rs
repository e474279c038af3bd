//! # Warden Policy
//!
//! `warden_policy` decides whether a user may perform a request. Decisions
//! come from pluggable authorizers combined in a configured order.
//!
//! Key concepts:
//!
//! 1. **Roles and bindings**: Roles bundle rules; bindings grant a role's
//!    rules to users, groups and service accounts.
//!
//! 2. **Listers**: Read-only, selector-aware access to stored policy
//!    objects.
//!
//! 3. **Validation**: Structural checks every object passes before it is
//!    stored.
//!
//! 4. **Authorizers**: RBAC, ABAC and the constant authorizers, combined by
//!    an [`AuthorizerChain`] built from an [`AuthorizerRegistry`].

pub mod config;
pub mod engine;
pub mod model;
pub mod store;
pub mod validation;

// Re-export key types and traits for convenience
pub use config::AuthorizationConfig;
pub use engine::{
    AbacAuthorizer, AbacPolicy, AlwaysAllowAuthorizer, AlwaysDenyAuthorizer, Authorizer,
    AuthorizerChain, AuthorizerDeps, AuthorizerRegistry, DecisionAudit, RbacAuthorizer,
    RuleResolution,
};
pub use model::{
    ClusterRole, ClusterRoleBinding, Evaluation, ObjectMeta, PolicyObject, PolicyRule, Role,
    RoleBinding, RoleRef, Subject,
};
pub use store::{ClusterLister, InMemoryPolicyStore, NamespaceLister, PolicyBundle, PolicyListers};
