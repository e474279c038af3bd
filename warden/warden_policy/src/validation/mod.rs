//! Structural validation of policy objects.
//!
//! Validators never mutate their input. Each returns an [`ErrorList`]
//! holding every violation found; an empty list means the object is valid.
//!
//! [`ErrorList`]: warden_core::ErrorList

mod rbac;

pub use rbac::{
    validate_cluster_role, validate_cluster_role_binding, validate_cluster_role_binding_update,
    validate_cluster_role_update, validate_object_meta, validate_policy_rule, validate_rbac_name,
    validate_role, validate_role_binding, validate_role_binding_subject,
    validate_role_binding_update, validate_role_update,
};
