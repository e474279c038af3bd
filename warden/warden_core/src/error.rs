//! Error types for the Warden authorization engine.
//!
//! This module defines the error hierarchy shared by every Warden crate.
//! Errors are organized by subsystem, and the root error type, `Error`,
//! wraps each of them so callers can handle failures uniformly.
//!
//! Two classifications matter to the decision engine:
//!
//! - [`Error::is_not_found`] identifies a missing object in the store. RBAC
//!   treats that as "this binding grants nothing" rather than a failure.
//! - [`Error::is_aborted`] identifies an evaluation that was cancelled or
//!   ran past its deadline. It must never be read as a decision.

use crate::validation::ErrorList;
use thiserror::Error;

/// Root error type for Warden.
#[derive(Debug, Error)]
pub enum Error {
    /// Policy store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Authorizer construction and evaluation errors
    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    /// A policy object failed structural validation
    #[error("Invalid object: {0}")]
    Invalid(ErrorList),

    /// Evaluation was cancelled or exceeded its deadline
    #[error("Evaluation aborted: {0}")]
    Aborted(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether this error reports a missing object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(StoreError::NotFound { .. }))
    }

    /// Whether this error reports a cancelled or timed-out evaluation.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors raised by policy stores and their listers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No object of the given kind and name exists
    #[error("{kind} {} not found", qualified(.namespace, .name))]
    NotFound {
        /// Object kind, e.g. `Role`
        kind: String,

        /// Namespace for namespaced kinds
        namespace: Option<String>,

        /// Object name
        name: String,
    },

    /// An object with the same key already exists
    #[error("{kind} {} already exists", qualified(.namespace, .name))]
    AlreadyExists {
        /// Object kind
        kind: String,

        /// Namespace for namespaced kinds
        namespace: Option<String>,

        /// Object name
        name: String,
    },

    /// The backing store failed
    #[error("Backend failure: {0}")]
    Backend(String),

    /// A stored object could not be decoded
    #[error("Decode failure: {0}")]
    Decode(String),
}

impl StoreError {
    /// Build a `NotFound` error.
    pub fn not_found(kind: &str, namespace: Option<&str>, name: &str) -> Self {
        Self::NotFound {
            kind: kind.to_string(),
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        }
    }

    /// Build an `AlreadyExists` error.
    pub fn already_exists(kind: &str, namespace: Option<&str>, name: &str) -> Self {
        Self::AlreadyExists {
            kind: kind.to_string(),
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        }
    }
}

fn qualified(namespace: &Option<String>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}/{}", ns, name),
        _ => name.to_string(),
    }
}

/// Errors related to authorizer construction.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    /// No factory is registered under the requested mode
    #[error("Unknown authorization mode: {0}")]
    UnknownMode(String),

    /// A factory is already registered under the mode
    #[error("Authorization mode already registered: {0}")]
    DuplicateMode(String),

    /// The ABAC policy file could not be loaded
    #[error("Failed to load policy file {path} (line {line}): {reason}")]
    PolicyFileLoad {
        /// Policy file path
        path: String,

        /// One-based line number, 0 when the file itself failed
        line: usize,

        /// What went wrong
        reason: String,
    },

    /// A factory required a dependency that was not supplied
    #[error("Missing dependency for {mode}: {dependency}")]
    MissingDependency {
        /// Mode being built
        mode: String,

        /// The missing dependency
        dependency: String,
    },
}

/// Result type for Warden operations.
pub type Result<T> = std::result::Result<T, Error>;
