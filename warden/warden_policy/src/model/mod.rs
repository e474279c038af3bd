//! Policy models.
//!
//! This module defines the RBAC policy objects and the evaluation record.

pub mod evaluation;
pub mod rbac;

pub use evaluation::Evaluation;
pub use rbac::{
    ClusterRole, ClusterRoleBinding, ObjectMeta, PolicyObject, PolicyRule, Role, RoleBinding,
    RoleRef, Subject,
};
