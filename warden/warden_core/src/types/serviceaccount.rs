//! Service account usernames.
//!
//! Service accounts authenticate as users named
//! `system:serviceaccount:<namespace>:<name>` and belong to the
//! `system:serviceaccounts` and `system:serviceaccounts:<namespace>` groups.

use std::collections::BTreeMap;

use super::UserInfo;
use crate::validation::{is_dns1123_label, is_dns1123_subdomain};

/// Prefix of every service account username.
pub const SERVICE_ACCOUNT_USERNAME_PREFIX: &str = "system:serviceaccount:";

/// Separator between namespace and name.
pub const SERVICE_ACCOUNT_USERNAME_SEPARATOR: &str = ":";

/// Prefix of the per-namespace service account group.
pub const SERVICE_ACCOUNT_GROUP_PREFIX: &str = "system:serviceaccounts:";

/// Group containing every service account.
pub const ALL_SERVICE_ACCOUNTS_GROUP: &str = "system:serviceaccounts";

/// Extra key carrying the pod name of the authenticating request.
pub const POD_NAME_KEY: &str = "authentication.kubernetes.io/pod-name";

/// Extra key carrying the pod UID of the authenticating request.
pub const POD_UID_KEY: &str = "authentication.kubernetes.io/pod-uid";

/// Build the username of a service account.
pub fn make_username(namespace: &str, name: &str) -> String {
    format!(
        "{}{}{}{}",
        SERVICE_ACCOUNT_USERNAME_PREFIX, namespace, SERVICE_ACCOUNT_USERNAME_SEPARATOR, name
    )
}

/// Whether `username` names the service account `namespace/name`, without allocating.
pub fn matches_username(namespace: &str, name: &str, username: &str) -> bool {
    username
        .strip_prefix(SERVICE_ACCOUNT_USERNAME_PREFIX)
        .and_then(|rest| rest.strip_prefix(namespace))
        .and_then(|rest| rest.strip_prefix(SERVICE_ACCOUNT_USERNAME_SEPARATOR))
        .is_some_and(|rest| rest == name)
}

/// Split a service account username into `(namespace, name)`.
///
/// Returns `None` unless `username` is a valid name produced by [`make_username`].
pub fn split_username(username: &str) -> Option<(&str, &str)> {
    let trimmed = username.strip_prefix(SERVICE_ACCOUNT_USERNAME_PREFIX)?;
    let mut parts = trimmed.split(SERVICE_ACCOUNT_USERNAME_SEPARATOR);
    let (namespace, name) = match (parts.next(), parts.next(), parts.next()) {
        (Some(namespace), Some(name), None) => (namespace, name),
        _ => return None,
    };

    if !is_dns1123_label(namespace).is_empty() || !is_dns1123_subdomain(name).is_empty() {
        return None;
    }

    Some((namespace, name))
}

/// Groups a service account in `namespace` belongs to.
pub fn make_group_names(namespace: &str) -> Vec<String> {
    vec![
        ALL_SERVICE_ACCOUNTS_GROUP.to_string(),
        make_namespace_group_name(namespace),
    ]
}

/// The group of all service accounts in `namespace`.
pub fn make_namespace_group_name(namespace: &str) -> String {
    format!("{}{}", SERVICE_ACCOUNT_GROUP_PREFIX, namespace)
}

/// A service account identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceAccountInfo {
    /// Service account name.
    pub name: String,

    /// Service account namespace.
    pub namespace: String,

    /// Service account UID.
    pub uid: String,

    /// Pod the request came from, if bound to one.
    pub pod_name: String,

    /// UID of that pod.
    pub pod_uid: String,
}

impl ServiceAccountInfo {
    /// The user this service account authenticates as.
    pub fn user_info(&self) -> UserInfo {
        let mut extra = BTreeMap::new();
        if !self.pod_name.is_empty() && !self.pod_uid.is_empty() {
            extra.insert(POD_NAME_KEY.to_string(), vec![self.pod_name.clone()]);
            extra.insert(POD_UID_KEY.to_string(), vec![self.pod_uid.clone()]);
        }

        UserInfo {
            name: make_username(&self.namespace, &self.name),
            uid: self.uid.clone(),
            groups: make_group_names(&self.namespace),
            extra,
        }
    }
}
