//! Label selection.
//!
//! Policy objects carry a set of string labels. A [`Selector`] is an ANDed
//! list of [`Requirement`]s over such a set and is what listers accept to
//! narrow a query.

mod requirement;
mod selector;

pub use requirement::{Operator, Requirement};
pub use selector::Selector;

use std::collections::BTreeMap;

/// A label set.
///
/// Ordered by key so selectors derived from it render deterministically.
pub type Labels = BTreeMap<String, String>;

/// Build a label set from key/value pairs.
pub fn labels<K, V, I>(pairs: I) -> Labels
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
