//! Label selectors.

use std::fmt;
use std::str::FromStr;

use super::{Labels, Operator, Requirement};
use crate::error::{Error, Result};
use crate::validation::{FieldError, FieldPath};

/// A conjunction of label requirements.
///
/// The empty selector matches everything. [`Selector::Nothing`] matches no
/// label set and ignores [`Selector::add`]. Selectors are plain values:
/// `add` returns a new selector and never touches the receiver, so a
/// selector can be shared across threads and extended independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// All of these requirements must hold.
    Requirements(Vec<Requirement>),

    /// Selects nothing.
    Nothing,
}

impl Default for Selector {
    fn default() -> Self {
        Self::everything()
    }
}

impl Selector {
    /// A selector that matches every label set.
    pub fn everything() -> Self {
        Self::Requirements(Vec::new())
    }

    /// A selector that matches no label set.
    pub fn nothing() -> Self {
        Self::Nothing
    }

    /// An empty selector to be extended with [`Selector::add`].
    pub fn new() -> Self {
        Self::Requirements(Vec::new())
    }

    /// Build a selector with one equality requirement per label.
    ///
    /// Requirements are ordered by key, so equal label sets always render
    /// the same string. Fails if a key or value is not valid label syntax.
    pub fn from_set(labels: &Labels) -> Result<Self> {
        labels
            .iter()
            .map(|(key, value)| Requirement::equals(key.as_str(), value.as_str()))
            .collect::<Result<Vec<_>>>()
            .map(Self::Requirements)
    }

    /// Whether this selector places no restriction on the selection space.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Requirements(reqs) => reqs.is_empty(),
            Self::Nothing => false,
        }
    }

    /// Return a new selector with `reqs` appended after the existing requirements.
    pub fn add<I>(&self, reqs: I) -> Self
    where
        I: IntoIterator<Item = Requirement>,
    {
        match self {
            Self::Requirements(existing) => {
                let mut combined = existing.clone();
                combined.extend(reqs);
                Self::Requirements(combined)
            }
            Self::Nothing => Self::Nothing,
        }
    }

    /// The requirements and whether this selector selects anything at all.
    pub fn requirements(&self) -> (&[Requirement], bool) {
        match self {
            Self::Requirements(reqs) => (reqs, true),
            Self::Nothing => (&[], false),
        }
    }

    /// An independent copy of this selector.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// Whether every requirement holds for the label set.
    pub fn matches(&self, labels: &Labels) -> bool {
        match self {
            Self::Requirements(reqs) => reqs.iter().all(|r| r.matches(labels)),
            Self::Nothing => false,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self::Requirements(reqs) = self else {
            return Ok(());
        };

        for (i, req) in reqs.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", req)?;
        }

        Ok(())
    }
}

impl FromStr for Selector {
    type Err = Error;

    /// Parse the textual form produced by `Display`.
    ///
    /// The empty string parses to [`Selector::everything`].
    fn from_str(s: &str) -> Result<Self> {
        let mut reqs = Vec::new();
        for term in split_terms(s) {
            let term = term.trim();
            if term.is_empty() {
                continue;
            }
            reqs.push(parse_term(term)?);
        }

        Ok(Self::Requirements(reqs))
    }
}

/// Split on commas that are not inside a parenthesized value list.
fn split_terms(s: &str) -> Vec<&str> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                terms.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    terms.push(&s[start..]);

    terms
}

fn parse_term(term: &str) -> Result<Requirement> {
    if let Some(key) = term.strip_prefix('!') {
        return Requirement::new(key.trim(), Operator::DoesNotExist, Vec::<String>::new());
    }

    if let (Some(open), true) = (term.find('('), term.ends_with(')')) {
        let head = term[..open].trim_end();
        // `in ()` is the set holding only the empty value.
        let values = term[open + 1..term.len() - 1].split(',').map(str::trim);

        if let Some(key) = head.strip_suffix(" notin") {
            return Requirement::new(key.trim(), Operator::NotIn, values);
        }
        if let Some(key) = head.strip_suffix(" in") {
            return Requirement::new(key.trim(), Operator::In, values);
        }

        return Err(Error::Invalid(
            vec![FieldError::invalid(
                FieldPath::new("selector"),
                term,
                "expected 'in' or 'notin' before a value list",
            )]
            .into(),
        ));
    }

    if let Some((key, value)) = term.split_once("!=") {
        return Requirement::new(key.trim(), Operator::NotEquals, [value.trim()]);
    }
    if let Some((key, value)) = term.split_once("==") {
        return Requirement::new(key.trim(), Operator::Equals, [value.trim()]);
    }
    if let Some((key, value)) = term.split_once('=') {
        return Requirement::new(key.trim(), Operator::Equals, [value.trim()]);
    }

    Requirement::new(term, Operator::Exists, Vec::<String>::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::labels;

    #[test]
    fn test_everything_and_nothing() {
        assert!(Selector::everything().is_empty());
        assert!(Selector::new().is_empty());
        assert!(!Selector::nothing().is_empty());

        let set = labels([("team", "infra")]);
        assert!(Selector::everything().matches(&set));
        assert!(!Selector::nothing().matches(&set));
        assert!(!Selector::nothing().matches(&Labels::new()));

        let nothing = Selector::nothing();
        let (reqs, selectable) = nothing.requirements();
        assert!(reqs.is_empty());
        assert!(!selectable);
    }

    #[test]
    fn test_add_does_not_mutate_receiver() {
        let base = Selector::from_set(&labels([("team", "infra")])).unwrap();
        let before = base.to_string();

        let extended = base.add([Requirement::equals("env", "prod").unwrap()]);

        assert_eq!(base.to_string(), before);
        assert_eq!(extended.to_string(), "team=infra,env=prod");
    }

    #[test]
    fn test_nothing_ignores_add() {
        let sel = Selector::nothing().add([Requirement::equals("env", "prod").unwrap()]);
        assert_eq!(sel, Selector::Nothing);
    }

    #[test]
    fn test_from_set_is_sorted() {
        let sel = Selector::from_set(&labels([("z", "1"), ("a", "2"), ("m", "3")])).unwrap();
        assert_eq!(sel.to_string(), "a=2,m=3,z=1");
        assert!(Selector::from_set(&Labels::new()).unwrap().is_empty());
    }

    #[test]
    fn test_deep_copy_is_independent() {
        let original = Selector::from_set(&labels([("team", "infra")])).unwrap();
        let mut copy = original.deep_copy();
        if let Selector::Requirements(reqs) = &mut copy {
            reqs.clear();
        }
        assert_eq!(original.to_string(), "team=infra");
        assert!(copy.is_empty());
    }

    #[test]
    fn test_parse_round_trip() {
        let text = "team=infra,env in (dev,prod),owner!=bob,tier,!legacy,zone notin (a)";
        let sel: Selector = text.parse().unwrap();
        assert_eq!(sel.to_string(), text);

        let (reqs, _) = sel.requirements();
        assert_eq!(reqs.len(), 6);
        assert_eq!(reqs[1].operator(), Operator::In);
    }

    #[test]
    fn test_parse_empty_and_invalid() {
        let sel: Selector = "".parse().unwrap();
        assert!(sel.is_empty());

        assert!("env between (a,b)".parse::<Selector>().is_err());
        assert!("=value".parse::<Selector>().is_err());
    }

    #[test]
    fn test_from_set_rejects_bad_labels() {
        assert!(Selector::from_set(&labels([("team", "x!=y")])).is_err());
        assert!(Selector::from_set(&labels([("team", "a,b")])).is_err());
        assert!(Selector::from_set(&labels([("1=1 OR team", "x")])).is_err());
    }

    #[test]
    fn test_rendered_selector_parses_back() {
        let selectors = vec![
            Selector::from_set(&labels([("team", "infra"), ("app.kubernetes.io/name", "web")]))
                .unwrap(),
            Selector::from_set(&labels([("team", "")])).unwrap(),
            Selector::new().add([
                Requirement::new("env", Operator::In, ["prod", "dev"]).unwrap(),
                Requirement::new("zone", Operator::NotIn, [""]).unwrap(),
                Requirement::new("owner", Operator::NotEquals, ["bob"]).unwrap(),
                Requirement::new("tier", Operator::Exists, Vec::<String>::new()).unwrap(),
                Requirement::new("legacy", Operator::DoesNotExist, Vec::<String>::new()).unwrap(),
            ]),
            Selector::everything(),
        ];

        for sel in selectors {
            let parsed: Selector = sel.to_string().parse().unwrap();
            assert_eq!(parsed, sel, "{}", sel);
        }
    }

    #[test]
    fn test_parse_rejects_ambiguous_terms() {
        assert!("team=x!=y".parse::<Selector>().is_err());
        assert!("team==x=y".parse::<Selector>().is_err());
        assert!("env in (a b)".parse::<Selector>().is_err());
    }
}
