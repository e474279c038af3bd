//! Decision records.
//!
//! An [`Evaluation`] captures one final decision of an authorizer chain so
//! it can be inspected after the fact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::{Attributes, Authorization, Decision};

/// One recorded authorization decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    /// Unique record ID.
    pub id: Uuid,

    /// The requesting user's name.
    pub user: String,

    /// A rendering of the request attributes.
    pub request: String,

    /// The final decision.
    pub decision: Decision,

    /// Why the decision was reached.
    pub reason: String,

    /// The authorizer that produced the decision. `None` when every
    /// authorizer abstained.
    pub authorizer: Option<String>,

    /// When the decision was made.
    pub timestamp: DateTime<Utc>,
}

impl Evaluation {
    /// Record the outcome of authorizing `attrs`.
    ///
    /// # Arguments
    ///
    /// * `attrs` - The request that was authorized.
    /// * `outcome` - The final decision and reason.
    /// * `authorizer` - The name of the deciding authorizer, if any.
    pub fn new(attrs: &Attributes, outcome: &Authorization, authorizer: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: attrs.user.name.clone(),
            request: attrs.to_string(),
            decision: outcome.decision,
            reason: outcome.reason.clone(),
            authorizer: authorizer.map(str::to_string),
            timestamp: Utc::now(),
        }
    }
}
