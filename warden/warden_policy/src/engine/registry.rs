//! Authorizer registry.
//!
//! The registry maps mode names to factories. It is filled once while the
//! process is wired together and then used to build the configured chain.
//! Factories receive their dependencies explicitly through
//! [`AuthorizerDeps`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use warden_core::{AuthorizationError, Result};

use super::{
    AbacAuthorizer, AlwaysAllowAuthorizer, AlwaysDenyAuthorizer, Authorizer, AuthorizerChain,
    DecisionAudit, RbacAuthorizer,
};
use crate::config::AuthorizationConfig;
use crate::store::PolicyListers;

/// Role-based access control.
pub const MODE_RBAC: &str = "RBAC";

/// Attribute-based access control from a policy file.
pub const MODE_ABAC: &str = "ABAC";

/// Allow everything.
pub const MODE_ALWAYS_ALLOW: &str = "AlwaysAllow";

/// Deny everything.
pub const MODE_ALWAYS_DENY: &str = "AlwaysDeny";

/// Resolved dependencies handed to every factory.
#[derive(Debug, Clone, Default)]
pub struct AuthorizerDeps {
    /// Policy store access, needed by RBAC.
    pub listers: Option<PolicyListers>,

    /// ABAC policy file.
    pub policy_file: Option<PathBuf>,
}

impl AuthorizerDeps {
    /// No dependencies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide policy store access.
    pub fn with_listers(mut self, listers: PolicyListers) -> Self {
        self.listers = Some(listers);
        self
    }

    /// Provide the ABAC policy file.
    pub fn with_policy_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.policy_file = Some(path.into());
        self
    }
}

/// Builds an authorizer from its dependencies.
pub type AuthorizerFactory =
    Box<dyn Fn(&AuthorizerDeps) -> Result<Arc<dyn Authorizer>> + Send + Sync>;

/// Mode name to factory mapping.
#[derive(Default)]
pub struct AuthorizerRegistry {
    factories: HashMap<String, AuthorizerFactory>,
}

impl AuthorizerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in modes.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.factories.insert(MODE_RBAC.to_string(), Box::new(rbac_factory));
        registry.factories.insert(MODE_ABAC.to_string(), Box::new(abac_factory));
        registry.factories.insert(
            MODE_ALWAYS_ALLOW.to_string(),
            Box::new(|_: &AuthorizerDeps| Ok(Arc::new(AlwaysAllowAuthorizer) as Arc<dyn Authorizer>)),
        );
        registry.factories.insert(
            MODE_ALWAYS_DENY.to_string(),
            Box::new(|_: &AuthorizerDeps| Ok(Arc::new(AlwaysDenyAuthorizer) as Arc<dyn Authorizer>)),
        );
        registry
    }

    /// Register a factory under `mode`.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the mode was free.
    /// * `Err(AuthorizationError::DuplicateMode)` - If it was taken.
    pub fn register<F>(&mut self, mode: &str, factory: F) -> Result<()>
    where
        F: Fn(&AuthorizerDeps) -> Result<Arc<dyn Authorizer>> + Send + Sync + 'static,
    {
        if self.factories.contains_key(mode) {
            return Err(AuthorizationError::DuplicateMode(mode.to_string()).into());
        }

        info!(mode, "Registered authorization mode");
        self.factories.insert(mode.to_string(), Box::new(factory));
        Ok(())
    }

    /// Whether a factory is registered under `mode`.
    pub fn contains(&self, mode: &str) -> bool {
        self.factories.contains_key(mode)
    }

    /// Registered mode names, sorted.
    pub fn modes(&self) -> Vec<&str> {
        let mut modes: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        modes.sort_unstable();
        modes
    }

    /// Build the authorizer registered under `mode`.
    pub fn build(&self, mode: &str, deps: &AuthorizerDeps) -> Result<Arc<dyn Authorizer>> {
        let factory = self
            .factories
            .get(mode)
            .ok_or_else(|| AuthorizationError::UnknownMode(mode.to_string()))?;

        debug!(mode, "Building authorizer");
        factory(deps)
    }

    /// Build the chain described by `config`.
    ///
    /// The config's policy file overrides one already present in `deps`.
    /// The chain gets the configured timeout and, unless the audit
    /// capacity is zero, a decision audit.
    pub fn build_chain(
        &self,
        config: &AuthorizationConfig,
        deps: &AuthorizerDeps,
    ) -> Result<AuthorizerChain> {
        config.validate()?;

        let mut deps = deps.clone();
        if let Some(path) = &config.policy_file {
            deps.policy_file = Some(path.clone());
        }

        let authorizers = config
            .modes
            .iter()
            .map(|mode| self.build(mode, &deps))
            .collect::<Result<Vec<_>>>()?;

        let mut chain = AuthorizerChain::new(authorizers);
        if let Some(timeout) = config.timeout() {
            chain = chain.with_timeout(timeout);
        }
        if config.audit_capacity > 0 {
            chain = chain.with_audit(DecisionAudit::new(config.audit_capacity));
        }

        info!(modes = ?config.modes, "Built authorizer chain");
        Ok(chain)
    }
}

impl std::fmt::Debug for AuthorizerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizerRegistry")
            .field("modes", &self.modes())
            .finish()
    }
}

fn rbac_factory(deps: &AuthorizerDeps) -> Result<Arc<dyn Authorizer>> {
    let listers = deps
        .listers
        .clone()
        .ok_or_else(|| missing(MODE_RBAC, "policy store listers"))?;
    Ok(Arc::new(RbacAuthorizer::new(listers)))
}

fn abac_factory(deps: &AuthorizerDeps) -> Result<Arc<dyn Authorizer>> {
    let path = deps
        .policy_file
        .as_ref()
        .ok_or_else(|| missing(MODE_ABAC, "policy_file"))?;
    Ok(Arc::new(AbacAuthorizer::from_file(path)?))
}

fn missing(mode: &str, dependency: &str) -> AuthorizationError {
    AuthorizationError::MissingDependency {
        mode: mode.to_string(),
        dependency: dependency.to_string(),
    }
}
