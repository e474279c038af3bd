//! Authorization engine.
//!
//! Every decision strategy implements [`Authorizer`]. Strategies are built
//! by name through the [`AuthorizerRegistry`] and combined in order by an
//! [`AuthorizerChain`].

mod abac;
mod always;
mod audit;
mod chain;
mod rbac;
mod registry;
pub mod rule;

pub use abac::{AbacAuthorizer, AbacPolicy};
pub use always::{AlwaysAllowAuthorizer, AlwaysDenyAuthorizer};
pub use audit::{DecisionAudit, DEFAULT_AUDIT_CAPACITY};
pub use chain::AuthorizerChain;
pub use rbac::{RbacAuthorizer, RuleResolution};
pub use registry::{
    AuthorizerDeps, AuthorizerFactory, AuthorizerRegistry, MODE_ABAC, MODE_ALWAYS_ALLOW,
    MODE_ALWAYS_DENY, MODE_RBAC,
};

use warden_core::{Attributes, Authorization, Context, Result};

/// A decision strategy.
///
/// Implementations return `NoOpinion` when they have nothing to say about
/// a request. An `Err` means the authorizer could not decide; it is never
/// a denial by itself.
pub trait Authorizer: Send + Sync {
    /// The mode name this authorizer is registered under.
    fn name(&self) -> &str;

    /// Decide on one request.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The evaluation context, passed through to every store call.
    /// * `attrs` - The request attributes.
    ///
    /// # Returns
    ///
    /// * `Ok(Authorization)` - The decision with its reason.
    /// * `Err` - If the decision could not be made. `Error::Aborted` means
    ///   the context was cancelled or timed out.
    fn authorize(&self, ctx: &Context, attrs: &Attributes) -> Result<Authorization>;
}
