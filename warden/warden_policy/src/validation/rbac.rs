//! Validators for RBAC objects.

use warden_core::validation::{
    is_dns1123_label, is_qualified_name, is_valid_label_value, is_valid_path_segment_name,
    is_valid_path_segment_prefix,
};
use warden_core::{ErrorList, FieldError, FieldPath};

use crate::model::rbac::{
    CLUSTER_ROLE_KIND, GROUP_KIND, ROLE_KIND, SERVICE_ACCOUNT_KIND, USER_KIND,
};
use crate::model::{
    ClusterRole, ClusterRoleBinding, ObjectMeta, PolicyRule, Role, RoleBinding, RoleRef, Subject,
};

/// Check a role or binding name.
///
/// With `prefix` set only the "may not contain" checks apply, so a
/// partial name such as a generate-name prefix can be checked.
pub fn validate_rbac_name(name: &str, prefix: bool) -> Vec<String> {
    if prefix {
        is_valid_path_segment_prefix(name)
    } else {
        is_valid_path_segment_name(name)
    }
}

/// Validate object metadata.
///
/// Namespaced kinds need a DNS-1123 label namespace; cluster-scoped kinds
/// must not carry one.
pub fn validate_object_meta(meta: &ObjectMeta, namespaced: bool, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();

    if meta.name.is_empty() {
        errs.push(FieldError::required(path.child("name"), "name or generateName is required"));
    } else {
        for msg in validate_rbac_name(&meta.name, false) {
            errs.push(FieldError::invalid(path.child("name"), &meta.name, msg));
        }
    }

    if namespaced {
        if meta.namespace.is_empty() {
            errs.push(FieldError::required(path.child("namespace"), ""));
        } else {
            for msg in is_dns1123_label(&meta.namespace) {
                errs.push(FieldError::invalid(path.child("namespace"), &meta.namespace, msg));
            }
        }
    } else if !meta.namespace.is_empty() {
        errs.push(FieldError::invalid(
            path.child("namespace"),
            &meta.namespace,
            "not allowed on this type",
        ));
    }

    let labels = path.child("labels");
    for (key, value) in &meta.labels {
        for msg in is_qualified_name(key) {
            errs.push(FieldError::invalid(labels.clone(), key, msg));
        }
        for msg in is_valid_label_value(value) {
            errs.push(FieldError::invalid(labels.key(key), value, msg));
        }
    }

    errs
}

/// Validate one policy rule.
///
/// Every violation is reported. A rule either targets resources or
/// non-resource URLs, never both, and URL rules are cluster-only.
pub fn validate_policy_rule(rule: &PolicyRule, is_namespaced: bool, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();

    if rule.verbs.is_empty() {
        errs.push(FieldError::required(
            path.child("verbs"),
            "verbs must contain at least one value",
        ));
    }

    if !rule.non_resource_urls.is_empty() {
        let urls = format!("{:?}", rule.non_resource_urls);
        if is_namespaced {
            errs.push(FieldError::invalid(
                path.child("nonResourceURLs"),
                &urls,
                "namespaced rules cannot apply to non-resource URLs",
            ));
        }
        if !rule.resources.is_empty() || !rule.resource_names.is_empty() {
            errs.push(FieldError::invalid(
                path.child("nonResourceURLs"),
                &urls,
                "rules cannot apply to both regular resources and non-resource URLs",
            ));
        }
        return errs;
    }

    if rule.resources.is_empty() {
        errs.push(FieldError::required(
            path.child("resources"),
            "resource rules must supply at least one resource",
        ));
    }

    errs
}

fn validate_rules(rules: &[PolicyRule], is_namespaced: bool) -> ErrorList {
    let path = FieldPath::new("rules");
    rules
        .iter()
        .enumerate()
        .flat_map(|(i, rule)| validate_policy_rule(rule, is_namespaced, &path.index(i)))
        .collect()
}

/// Validate a role and every rule it holds.
pub fn validate_role(role: &Role) -> ErrorList {
    let mut errs = validate_object_meta(&role.metadata, true, &FieldPath::new("metadata"));
    errs.extend(validate_rules(&role.rules, true));
    errs
}

/// Validate a replacement for `old`.
pub fn validate_role_update(role: &Role, _old: &Role) -> ErrorList {
    validate_role(role)
}

/// Validate a cluster role and every rule it holds.
pub fn validate_cluster_role(role: &ClusterRole) -> ErrorList {
    let mut errs = validate_object_meta(&role.metadata, false, &FieldPath::new("metadata"));
    errs.extend(validate_rules(&role.rules, false));
    errs
}

/// Validate a replacement for `old`.
pub fn validate_cluster_role_update(role: &ClusterRole, _old: &ClusterRole) -> ErrorList {
    validate_cluster_role(role)
}

/// Validate one binding subject.
///
/// `is_namespaced` is true for subjects of a `RoleBinding`, whose
/// service accounts default to the binding's namespace.
pub fn validate_role_binding_subject(
    subject: &Subject,
    is_namespaced: bool,
    path: &FieldPath,
) -> ErrorList {
    let mut errs = ErrorList::new();

    if subject.name.is_empty() {
        errs.push(FieldError::required(path.child("name"), ""));
    }

    match subject.kind.as_str() {
        SERVICE_ACCOUNT_KIND => {
            if !is_namespaced && subject.namespace.is_empty() {
                errs.push(FieldError::required(path.child("namespace"), ""));
            }
        }
        USER_KIND | GROUP_KIND => {}
        other => errs.push(FieldError::not_supported(
            path.child("kind"),
            other,
            &[SERVICE_ACCOUNT_KIND, USER_KIND, GROUP_KIND],
        )),
    }

    errs
}

fn validate_role_ref(role_ref: &RoleRef, supported: &[&str]) -> ErrorList {
    let mut errs = ErrorList::new();
    let path = FieldPath::new("roleRef");

    if !supported.contains(&role_ref.kind.as_str()) {
        errs.push(FieldError::not_supported(path.child("kind"), &role_ref.kind, supported));
    }

    if role_ref.name.is_empty() {
        errs.push(FieldError::required(path.child("name"), ""));
    } else {
        for msg in validate_rbac_name(&role_ref.name, false) {
            errs.push(FieldError::invalid(path.child("name"), &role_ref.name, msg));
        }
    }

    errs
}

fn validate_subjects(subjects: &[Subject], is_namespaced: bool) -> ErrorList {
    let path = FieldPath::new("subjects");
    subjects
        .iter()
        .enumerate()
        .flat_map(|(i, subject)| validate_role_binding_subject(subject, is_namespaced, &path.index(i)))
        .collect()
}

fn validate_role_ref_unchanged(new: &RoleRef, old: &RoleRef) -> ErrorList {
    let mut errs = ErrorList::new();
    if new != old {
        errs.push(FieldError::invalid(
            FieldPath::new("roleRef"),
            new.to_string(),
            "cannot change roleRef",
        ));
    }
    errs
}

/// Validate a role binding.
pub fn validate_role_binding(binding: &RoleBinding) -> ErrorList {
    let mut errs = validate_object_meta(&binding.metadata, true, &FieldPath::new("metadata"));
    errs.extend(validate_role_ref(&binding.role_ref, &[ROLE_KIND, CLUSTER_ROLE_KIND]));
    errs.extend(validate_subjects(&binding.subjects, true));
    errs
}

/// Validate a replacement for `old`. The role reference is immutable.
pub fn validate_role_binding_update(binding: &RoleBinding, old: &RoleBinding) -> ErrorList {
    let mut errs = validate_role_binding(binding);
    errs.extend(validate_role_ref_unchanged(&binding.role_ref, &old.role_ref));
    errs
}

/// Validate a cluster role binding. Only cluster roles can be bound.
pub fn validate_cluster_role_binding(binding: &ClusterRoleBinding) -> ErrorList {
    let mut errs = validate_object_meta(&binding.metadata, false, &FieldPath::new("metadata"));
    errs.extend(validate_role_ref(&binding.role_ref, &[CLUSTER_ROLE_KIND]));
    errs.extend(validate_subjects(&binding.subjects, false));
    errs
}

/// Validate a replacement for `old`. The role reference is immutable.
pub fn validate_cluster_role_binding_update(
    binding: &ClusterRoleBinding,
    old: &ClusterRoleBinding,
) -> ErrorList {
    let mut errs = validate_cluster_role_binding(binding);
    errs.extend(validate_role_ref_unchanged(&binding.role_ref, &old.role_ref));
    errs
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::validation::ErrorType;

    fn path() -> FieldPath {
        FieldPath::new("rules").index(0)
    }

    #[test]
    fn test_rbac_name() {
        assert!(validate_rbac_name("admin", false).is_empty());
        assert!(validate_rbac_name("system:admin", false).is_empty());
        assert_eq!(validate_rbac_name("..", false), vec!["may not be '..'"]);
        assert!(validate_rbac_name("..", true).is_empty());
        assert_eq!(validate_rbac_name("a/b", true), vec!["may not contain '/'"]);
        assert_eq!(validate_rbac_name("a%b", false), vec!["may not contain '%'"]);
    }

    #[test]
    fn test_policy_rule_errors_are_aggregated() {
        let rule = PolicyRule {
            non_resource_urls: vec!["/metrics".into()],
            resources: vec!["pods".into()],
            ..PolicyRule::default()
        };
        let errs = validate_policy_rule(&rule, true, &path());

        assert_eq!(errs.len(), 3);
        assert_eq!(errs.as_slice()[0].field.as_str(), "rules[0].verbs");
        assert_eq!(errs.as_slice()[0].error_type, ErrorType::Required);
        assert!(errs.as_slice()[1].detail.contains("namespaced rules"));
        assert!(errs.as_slice()[2].detail.contains("both regular resources"));
    }

    #[test]
    fn test_policy_rule_shapes() {
        let ok = PolicyRule::resource(["get"], ["pods"]);
        assert!(validate_policy_rule(&ok, true, &path()).is_empty());

        let ok = PolicyRule::non_resource(["get"], ["/healthz"]);
        assert!(validate_policy_rule(&ok, false, &path()).is_empty());

        let empty = PolicyRule::resource(["get"], Vec::<String>::new());
        let errs = validate_policy_rule(&empty, false, &path());
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.as_slice()[0].field.as_str(), "rules[0].resources");

        let names_and_urls = PolicyRule::non_resource(["get"], ["/x"]).with_resource_names(["a"]);
        assert_eq!(validate_policy_rule(&names_and_urls, false, &path()).len(), 1);
    }

    #[test]
    fn test_role_aggregates_all_rules() {
        let role = Role::new(
            "dev",
            "broken",
            vec![
                PolicyRule::default(),
                PolicyRule::resource(["get"], ["pods"]),
                PolicyRule::non_resource(["get"], ["/metrics"]),
            ],
        );
        let errs = validate_role(&role);
        let fields: Vec<&str> = errs.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["rules[0].verbs", "rules[0].resources", "rules[2].nonResourceURLs"]
        );
    }

    #[test]
    fn test_cluster_role_allows_urls() {
        let role = ClusterRole::new("metrics", vec![PolicyRule::non_resource(["get"], ["/metrics"])]);
        assert!(validate_cluster_role(&role).is_empty());
    }

    #[test]
    fn test_object_meta() {
        let mut role = Role::new("", "reader", vec![]);
        let errs = validate_role(&role);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.as_slice()[0].field.as_str(), "metadata.namespace");

        role.metadata.namespace = "Dev".into();
        assert_eq!(validate_role(&role).len(), 1);

        let mut cluster = ClusterRole::new("..", vec![]);
        cluster.metadata.namespace = "dev".into();
        let fields: Vec<String> = validate_cluster_role(&cluster)
            .iter()
            .map(|e| e.field.to_string())
            .collect();
        assert_eq!(fields, vec!["metadata.name", "metadata.namespace"]);
    }

    #[test]
    fn test_object_meta_labels() {
        let mut role = ClusterRole::new("reader", vec![PolicyRule::resource(["get"], ["pods"])]);
        role.metadata.labels = warden_core::labels::labels([("team", "infra"), ("tier", "")]);
        assert!(validate_cluster_role(&role).is_empty());

        role.metadata.labels =
            warden_core::labels::labels([("team", "a,b"), ("1=1 OR team", "x")]);
        let fields: Vec<String> = validate_cluster_role(&role)
            .iter()
            .map(|e| e.field.to_string())
            .collect();
        assert_eq!(fields, vec!["metadata.labels", "metadata.labels[team]"]);
    }

    #[test]
    fn test_subject() {
        let p = FieldPath::new("subjects").index(0);

        assert!(validate_role_binding_subject(&Subject::user("alice"), false, &p).is_empty());
        assert!(validate_role_binding_subject(&Subject::group("ops"), true, &p).is_empty());

        let sa = Subject::service_account("", "bot");
        assert!(validate_role_binding_subject(&sa, true, &p).is_empty());
        let errs = validate_role_binding_subject(&sa, false, &p);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.as_slice()[0].field.as_str(), "subjects[0].namespace");

        let unknown = Subject {
            kind: "Team".into(),
            name: String::new(),
            namespace: String::new(),
        };
        let errs = validate_role_binding_subject(&unknown, true, &p);
        assert_eq!(errs.len(), 2);
        assert_eq!(
            errs.as_slice()[1].to_string(),
            r#"subjects[0].kind: Unsupported value: "Team": supported values: "ServiceAccount", "User", "Group""#
        );
    }

    #[test]
    fn test_role_binding_role_ref() {
        let binding = RoleBinding::new("dev", "b", RoleRef::cluster_role("view"), vec![]);
        assert!(validate_role_binding(&binding).is_empty());

        let binding = RoleBinding::new(
            "dev",
            "b",
            RoleRef {
                kind: "Team".into(),
                name: String::new(),
            },
            vec![],
        );
        let fields: Vec<String> = validate_role_binding(&binding)
            .iter()
            .map(|e| e.field.to_string())
            .collect();
        assert_eq!(fields, vec!["roleRef.kind", "roleRef.name"]);
    }

    #[test]
    fn test_cluster_role_binding_rejects_role() {
        let binding = ClusterRoleBinding::new("b", RoleRef::role("reader"), vec![]);
        let errs = validate_cluster_role_binding(&binding);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.as_slice()[0].field.as_str(), "roleRef.kind");
    }

    #[test]
    fn test_role_ref_is_immutable() {
        let old = RoleBinding::new("dev", "b", RoleRef::role("reader"), vec![Subject::user("a")]);

        let mut new = old.clone();
        new.subjects.push(Subject::user("b"));
        assert!(validate_role_binding_update(&new, &old).is_empty());

        let mut new = old.clone();
        new.role_ref.name = "writer".into();
        assert!(validate_role_binding(&new).is_empty());
        let errs = validate_role_binding_update(&new, &old);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.as_slice()[0].detail, "cannot change roleRef");

        let old = ClusterRoleBinding::new("b", RoleRef::cluster_role("view"), vec![]);
        let mut new = old.clone();
        new.role_ref.name = "edit".into();
        assert_eq!(validate_cluster_role_binding_update(&new, &old).len(), 1);
    }

    #[test]
    fn test_validation_does_not_mutate() {
        let role = Role::new("dev", "r", vec![PolicyRule::default()]);
        let before = role.clone();
        let _ = validate_role(&role);
        assert_eq!(role, before);
    }
}
