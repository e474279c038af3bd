//! Ordered combination of authorizers.
//!
//! The chain asks each authorizer in turn. The first definitive answer
//! wins, whether it allows or denies. When every authorizer abstains the
//! request is denied.
//!
//! An authorizer that fails is treated as abstaining: the failure is
//! logged and mentioned in the final reason, and later authorizers still
//! run. An aborted evaluation is the exception; it stops the chain and is
//! returned as an error, never as a decision.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use warden_core::{Attributes, Authorization, Context, Decision, Result};

use super::{Authorizer, DecisionAudit};
use crate::model::Evaluation;

/// An ordered list of authorizers evaluated first-definitive-wins.
#[derive(Clone)]
pub struct AuthorizerChain {
    authorizers: Vec<Arc<dyn Authorizer>>,
    timeout: Option<Duration>,
    audit: Option<DecisionAudit>,
}

impl AuthorizerChain {
    /// Create a chain evaluating `authorizers` in order.
    pub fn new(authorizers: Vec<Arc<dyn Authorizer>>) -> Self {
        Self {
            authorizers,
            timeout: None,
            audit: None,
        }
    }

    /// Bound every evaluation by `timeout`, on top of the caller's deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Record every final decision into `audit`.
    pub fn with_audit(mut self, audit: DecisionAudit) -> Self {
        self.audit = Some(audit);
        self
    }

    /// The audit log, if one is attached.
    pub fn audit(&self) -> Option<&DecisionAudit> {
        self.audit.as_ref()
    }

    /// Names of the authorizers, in evaluation order.
    pub fn names(&self) -> Vec<&str> {
        self.authorizers.iter().map(|authz| authz.name()).collect()
    }

    /// Decide on one request.
    ///
    /// # Returns
    ///
    /// * `Ok(Authorization)` - `Allow` or `Deny`, never `NoOpinion`.
    /// * `Err` - Only when the evaluation was cancelled or timed out.
    pub fn authorize(&self, ctx: &Context, attrs: &Attributes) -> Result<Authorization> {
        let ctx = match self.timeout {
            Some(timeout) => ctx.child_with_timeout(timeout),
            None => ctx.clone(),
        };

        let mut failures = Vec::new();

        for authz in &self.authorizers {
            ctx.check()?;

            match authz.authorize(&ctx, attrs) {
                Ok(result) if result.decision.is_definitive() => {
                    debug!(
                        authorizer = authz.name(),
                        decision = %result.decision,
                        request = %attrs,
                        "Authorizer decided"
                    );
                    self.record(attrs, &result, Some(authz.name()));
                    return Ok(result);
                }
                Ok(_) => {}
                Err(err) if err.is_aborted() => {
                    warn!(authorizer = authz.name(), error = %err, "Authorization aborted");
                    return Err(err);
                }
                Err(err) => {
                    warn!(
                        authorizer = authz.name(),
                        error = %err,
                        "Authorizer failed; treating as no opinion"
                    );
                    failures.push(format!("{}: {}", authz.name(), err));
                }
            }
        }

        let reason = if failures.is_empty() {
            "no authorizer allowed the request".to_string()
        } else {
            format!(
                "no authorizer allowed the request; errors: {}",
                failures.join("; ")
            )
        };

        debug!(request = %attrs, "No authorizer had an opinion, denying");
        let result = Authorization::deny(reason);
        self.record(attrs, &result, None);
        Ok(result)
    }

    /// Whether the request is allowed. Aborted evaluations are errors.
    pub fn is_allowed(&self, ctx: &Context, attrs: &Attributes) -> Result<bool> {
        Ok(self.authorize(ctx, attrs)?.decision == Decision::Allow)
    }

    fn record(&self, attrs: &Attributes, result: &Authorization, authorizer: Option<&str>) {
        if let Some(audit) = &self.audit {
            audit.record(Evaluation::new(attrs, result, authorizer));
        }
    }
}

impl std::fmt::Debug for AuthorizerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizerChain")
            .field("authorizers", &self.names())
            .field("timeout", &self.timeout)
            .finish()
    }
}
