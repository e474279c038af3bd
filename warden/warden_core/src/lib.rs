//! # Warden Core
//!
//! `warden_core` provides the building blocks shared by every part of the
//! Warden authorization engine: the error taxonomy, the evaluation context,
//! label selectors, request attributes and decisions, and the generic
//! validation helpers policy validators are built from.
//!
//! ## Crate Structure
//!
//! - **error**: Error types for all Warden components
//! - **context**: Deadlines and cancellation for one evaluation
//! - **labels**: Label sets, requirements and selectors
//! - **types**: Users, request attributes and decisions
//! - **validation**: Field-scoped errors and name checks
//! - **utils**: Log levels

pub mod context;
pub mod error;
pub mod labels;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export key types for convenience
pub use context::{CancelHandle, Context};
pub use error::{AuthorizationError, Error, Result, StoreError};
pub use labels::{Labels, Operator, Requirement, Selector};
pub use types::{Attributes, Authorization, Decision, UserInfo};
pub use utils::LogLevel;
pub use validation::{ErrorList, FieldError, FieldPath};
