//! Constant authorizers for bootstrap and testing.

use warden_core::{Attributes, Authorization, Context, Result};

use super::registry::{MODE_ALWAYS_ALLOW, MODE_ALWAYS_DENY};
use super::Authorizer;

/// Allows every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAllowAuthorizer;

impl Authorizer for AlwaysAllowAuthorizer {
    fn name(&self) -> &str {
        MODE_ALWAYS_ALLOW
    }

    fn authorize(&self, _ctx: &Context, _attrs: &Attributes) -> Result<Authorization> {
        Ok(Authorization::allow("AlwaysAllow"))
    }
}

/// Denies every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysDenyAuthorizer;

impl Authorizer for AlwaysDenyAuthorizer {
    fn name(&self) -> &str {
        MODE_ALWAYS_DENY
    }

    fn authorize(&self, _ctx: &Context, _attrs: &Attributes) -> Result<Authorization> {
        Ok(Authorization::deny("Everything is forbidden."))
    }
}
