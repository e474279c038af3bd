//! Subcommand implementations
//!
//! Each command builds what it needs from files: the configuration, the
//! RBAC bundle and the ABAC policy file.

pub mod check;
pub mod rules;
pub mod validate;

use anyhow::{Context as _, Result};
use std::path::Path;
use std::sync::Arc;
use warden_core::UserInfo;
use warden_policy::{AuthorizationConfig, InMemoryPolicyStore, PolicyBundle, PolicyListers};

/// Load and validate the configuration file.
pub fn load_config(path: &Path) -> Result<AuthorizationConfig> {
    AuthorizationConfig::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Build a store holding the configured RBAC bundle, or an empty store.
pub fn load_store(config: &AuthorizationConfig) -> Result<Arc<InMemoryPolicyStore>> {
    let store = InMemoryPolicyStore::new();

    if let Some(path) = &config.rbac_file {
        let bundle = PolicyBundle::from_file(path)
            .with_context(|| format!("Failed to read RBAC bundle {}", path.display()))?;
        let count = bundle.len();
        store
            .load_bundle(bundle)
            .with_context(|| format!("Failed to load RBAC bundle {}", path.display()))?;
        tracing::info!(path = %path.display(), objects = count, "Loaded RBAC bundle");
    }

    Ok(Arc::new(store))
}

/// Listers over `store`.
pub fn listers(store: &Arc<InMemoryPolicyStore>) -> PolicyListers {
    PolicyListers::from_store(Arc::clone(store))
}

/// The requesting user.
pub fn user_info(name: &str, groups: &[String]) -> UserInfo {
    UserInfo::new(name).with_groups(groups.iter().cloned())
}
