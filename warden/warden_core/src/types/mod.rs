//! Common data types.
//!
//! The shapes that flow into and out of an authorization decision.

pub mod attributes;
pub mod decision;
pub mod serviceaccount;
pub mod user;

pub use attributes::Attributes;
pub use decision::{Authorization, Decision};
pub use user::UserInfo;
