//! Rule matching.
//!
//! Pure functions deciding whether a [`PolicyRule`] covers a request. A
//! rule covers a request when every dimension matches; API groups are not
//! consulted.

use warden_core::Attributes;

use crate::model::rbac::WILDCARD;
use crate::model::PolicyRule;

/// Whether the rule grants `verb`.
pub fn verb_matches(rule: &PolicyRule, verb: &str) -> bool {
    rule.verbs.iter().any(|v| v == WILDCARD || v == verb)
}

/// Whether the rule covers `resource`, optionally qualified by
/// `subresource`.
///
/// With a subresource set the rule must name `resource/subresource`,
/// `*/subresource` or `*`.
pub fn resource_matches(rule: &PolicyRule, resource: &str, subresource: &str) -> bool {
    let combined = if subresource.is_empty() {
        resource.to_string()
    } else {
        format!("{}/{}", resource, subresource)
    };

    rule.resources.iter().any(|r| {
        r == WILDCARD
            || *r == combined
            || (!subresource.is_empty()
                && r.strip_prefix("*/").is_some_and(|sub| sub == subresource))
    })
}

/// Whether the rule covers the object `name`. An empty `resourceNames`
/// covers every name.
pub fn resource_name_matches(rule: &PolicyRule, name: &str) -> bool {
    rule.resource_names.is_empty() || rule.resource_names.iter().any(|n| n == name)
}

/// Whether the rule covers the URL `path`.
///
/// `*` covers every path and an entry ending in `/*` covers everything
/// below its prefix. Other entries must match exactly.
pub fn non_resource_url_matches(rule: &PolicyRule, path: &str) -> bool {
    rule.non_resource_urls.iter().any(|url| {
        if url == WILDCARD || url == path {
            return true;
        }
        url.strip_suffix('*')
            .filter(|prefix| prefix.ends_with('/'))
            .is_some_and(|prefix| path.starts_with(prefix))
    })
}

/// Whether the rule covers the whole request.
///
/// Resource requests are only matched by resource-shaped rules and URL
/// requests only by non-resource-shaped rules.
pub fn rule_allows(attrs: &Attributes, rule: &PolicyRule) -> bool {
    if attrs.resource_request {
        rule.is_resource_shaped()
            && verb_matches(rule, &attrs.verb)
            && resource_matches(rule, &attrs.resource, &attrs.subresource)
            && resource_name_matches(rule, &attrs.name)
    } else {
        rule.is_non_resource_shaped()
            && verb_matches(rule, &attrs.verb)
            && non_resource_url_matches(rule, &attrs.path)
    }
}

/// Whether any rule covers the request.
pub fn rules_allow(attrs: &Attributes, rules: &[PolicyRule]) -> bool {
    rules.iter().any(|rule| rule_allows(attrs, rule))
}
