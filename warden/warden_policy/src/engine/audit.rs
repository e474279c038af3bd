//! Decision auditing.
//!
//! This module keeps a bounded, per-user history of final decisions.

use dashmap::DashMap;
use std::sync::Arc;
use warden_core::Decision;

use crate::model::Evaluation;

/// Default number of decisions kept per user.
pub const DEFAULT_AUDIT_CAPACITY: usize = 1000;

/// A decision audit log.
///
/// Cloning the audit shares the underlying log.
#[derive(Debug, Clone)]
pub struct DecisionAudit {
    /// The recorded decisions, keyed by user name.
    entries: Arc<DashMap<String, Vec<Evaluation>>>,

    /// The maximum number of entries to keep per user.
    max_entries_per_user: usize,
}

impl DecisionAudit {
    /// Create a new decision audit.
    ///
    /// # Arguments
    ///
    /// * `max_entries_per_user` - The maximum number of entries to keep per user.
    pub fn new(max_entries_per_user: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_entries_per_user,
        }
    }

    /// Record a decision, dropping the user's oldest entries beyond capacity.
    pub fn record(&self, evaluation: Evaluation) {
        let mut user_entries = self.entries.entry(evaluation.user.clone()).or_default();
        user_entries.push(evaluation);

        if user_entries.len() > self.max_entries_per_user {
            let to_remove = user_entries.len() - self.max_entries_per_user;
            user_entries.drain(0..to_remove);
        }
    }

    /// Decisions recorded for `user`, oldest first.
    pub fn get_evaluations(&self, user: &str) -> Vec<Evaluation> {
        self.entries
            .get(user)
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Forget every decision recorded for `user`.
    pub fn clear_evaluations(&self, user: &str) {
        self.entries.remove(user);
    }

    /// Every recorded decision.
    pub fn get_all_evaluations(&self) -> Vec<Evaluation> {
        self.entries
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect()
    }

    /// Every recorded decision with the given outcome.
    ///
    /// # Arguments
    ///
    /// * `decision` - The decision to filter by.
    ///
    /// # Returns
    ///
    /// The matching evaluations, in no particular order across users.
    pub fn get_evaluations_by_decision(&self, decision: Decision) -> Vec<Evaluation> {
        self.entries
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|evaluation| evaluation.decision == decision)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Every recorded decision made by the named authorizer.
    pub fn get_evaluations_by_authorizer(&self, authorizer: &str) -> Vec<Evaluation> {
        self.entries
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|evaluation| evaluation.authorizer.as_deref() == Some(authorizer))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

impl Default for DecisionAudit {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}
