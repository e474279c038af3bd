//! Authorization configuration.
//!
//! Loaded from TOML:
//!
//! ```toml
//! modes = ["RBAC", "ABAC"]
//! policy_file = "abac.jsonl"
//! rbac_file = "rbac.json"
//! timeout_ms = 2000
//! audit_capacity = 500
//! log_level = "debug"
//! ```
//!
//! Relative paths in a loaded file are resolved against the file's
//! directory.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use warden_core::{Error, LogLevel, Result};

use crate::engine::{DEFAULT_AUDIT_CAPACITY, MODE_ABAC};

/// Authorization configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorizationConfig {
    /// Authorization modes, in evaluation order
    #[serde(default = "default_modes")]
    pub modes: Vec<String>,

    /// ABAC policy file, one JSON policy per line
    #[serde(default)]
    pub policy_file: Option<PathBuf>,

    /// JSON bundle of RBAC objects to load into the in-memory store
    #[serde(default)]
    pub rbac_file: Option<PathBuf>,

    /// Deadline for one decision, in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Decisions kept per user in the audit log; zero disables the audit
    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_modes() -> Vec<String> {
    vec!["RBAC".to_string()]
}

fn default_audit_capacity() -> usize {
    DEFAULT_AUDIT_CAPACITY
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            modes: default_modes(),
            policy_file: None,
            rbac_file: None,
            timeout_ms: None,
            audit_capacity: default_audit_capacity(),
            log_level: LogLevel::default(),
        }
    }
}

impl AuthorizationConfig {
    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::Config(format!("Failed to read {}: {}", path.display(), err))
        })?;

        let mut config = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration without validating it.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|err| Error::Config(format!("Failed to parse configuration: {}", err)))
    }

    /// Make relative file paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.policy_file, &mut self.rbac_file].into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.modes.is_empty() {
            return Err(Error::Config(
                "At least one authorization mode is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for mode in &self.modes {
            if !seen.insert(mode.as_str()) {
                return Err(Error::Config(format!(
                    "Authorization mode listed twice: {}",
                    mode
                )));
            }
        }

        if seen.contains(MODE_ABAC) && self.policy_file.is_none() {
            return Err(Error::Config(
                "ABAC mode requires policy_file".to_string(),
            ));
        }

        Ok(())
    }

    /// The decision deadline, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
