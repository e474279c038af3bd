use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use warden_core::types::serviceaccount;
use warden_core::{Attributes, Context, Decision, Error, UserInfo};
use warden_policy::engine::{MODE_ALWAYS_ALLOW, MODE_ALWAYS_DENY, MODE_RBAC};
use warden_policy::validation::validate_policy_rule;
use warden_policy::{
    AuthorizationConfig, Authorizer, AuthorizerChain, AuthorizerDeps, AuthorizerRegistry,
    InMemoryPolicyStore, PolicyBundle, PolicyListers, PolicyRule, RbacAuthorizer,
};

const BUNDLE: &str = r#"{
    "roles": [
        {
            "metadata": {"name": "pod-reader", "namespace": "ns"},
            "rules": [{"verbs": ["get"], "resources": ["pods"]}]
        }
    ],
    "roleBindings": [
        {
            "metadata": {"name": "read-pods", "namespace": "ns"},
            "roleRef": {"kind": "Role", "name": "pod-reader"},
            "subjects": [{"kind": "User", "name": "alice"}]
        },
        {
            "metadata": {"name": "ci", "namespace": "ns"},
            "roleRef": {"kind": "Role", "name": "deployer"},
            "subjects": [{"kind": "ServiceAccount", "name": "ci"}]
        }
    ],
    "clusterRoles": [
        {
            "metadata": {"name": "metrics-reader"},
            "rules": [{"verbs": ["get"], "nonResourceURLs": ["/metrics/*"]}]
        }
    ],
    "clusterRoleBindings": [
        {
            "metadata": {"name": "monitoring"},
            "roleRef": {"kind": "ClusterRole", "name": "metrics-reader"},
            "subjects": [{"kind": "Group", "name": "monitoring"}]
        }
    ]
}"#;

fn store() -> Arc<InMemoryPolicyStore> {
    let bundle = PolicyBundle::from_json_str(BUNDLE).unwrap();
    Arc::new(InMemoryPolicyStore::from_bundle(bundle).unwrap())
}

fn chain(modes: &[&str], store: &Arc<InMemoryPolicyStore>) -> AuthorizerChain {
    let config = AuthorizationConfig {
        modes: modes.iter().map(|m| m.to_string()).collect(),
        ..AuthorizationConfig::default()
    };
    let deps = AuthorizerDeps::new().with_listers(PolicyListers::from_store(store.clone()));
    AuthorizerRegistry::with_defaults()
        .build_chain(&config, &deps)
        .unwrap()
}

fn request(user: &str, verb: &str, resource: &str, namespace: &str) -> Attributes {
    Attributes::resource(UserInfo::new(user), verb, resource, namespace)
}

#[test]
fn test_rbac_grants_only_what_is_bound() {
    let store = store();
    let rbac = RbacAuthorizer::new(PolicyListers::from_store(store));
    let ctx = Context::background();

    let decide = |attrs: Attributes| rbac.authorize(&ctx, &attrs).unwrap().decision;

    assert_eq!(decide(request("alice", "get", "pods", "ns")), Decision::Allow);
    assert_eq!(decide(request("alice", "delete", "pods", "ns")), Decision::NoOpinion);
    assert_eq!(decide(request("bob", "get", "pods", "ns")), Decision::NoOpinion);
}

#[test]
fn test_dangling_binding_contributes_nothing() {
    let store = store();
    let rbac = RbacAuthorizer::new(PolicyListers::from_store(store));
    let ci = UserInfo::new(serviceaccount::make_username("ns", "ci"));
    let attrs = Attributes::resource(ci, "create", "deployments", "ns");

    let result = rbac.authorize(&Context::background(), &attrs).unwrap();
    assert_eq!(result.decision, Decision::NoOpinion);
}

#[test]
fn test_non_resource_urls_use_prefix_entries() {
    let store = store();
    let chain = chain(&[MODE_RBAC], &store);
    let ctx = Context::background();
    let monitor = UserInfo::new("prometheus").with_groups(["monitoring"]);

    let cpu = Attributes::non_resource(monitor.clone(), "get", "/metrics/cpu");
    assert_eq!(chain.authorize(&ctx, &cpu).unwrap().decision, Decision::Allow);

    let sibling = Attributes::non_resource(monitor, "get", "/metricsx");
    assert_eq!(chain.authorize(&ctx, &sibling).unwrap().decision, Decision::Deny);
}

#[test]
fn test_chain_order_decides() {
    let store = store();
    let ctx = Context::background();
    let attrs = request("alice", "get", "pods", "ns");

    let deny_first = chain(&[MODE_ALWAYS_DENY, MODE_RBAC], &store);
    assert_eq!(deny_first.authorize(&ctx, &attrs).unwrap().decision, Decision::Deny);

    let rbac_first = chain(&[MODE_RBAC, MODE_ALWAYS_DENY], &store);
    assert_eq!(rbac_first.authorize(&ctx, &attrs).unwrap().decision, Decision::Allow);

    let rbac_only = chain(&[MODE_RBAC], &store);
    assert_eq!(rbac_only.authorize(&ctx, &attrs).unwrap().decision, Decision::Allow);

    let nobody = request("mallory", "get", "pods", "ns");
    assert_eq!(rbac_only.authorize(&ctx, &nobody).unwrap().decision, Decision::Deny);

    let bootstrap = chain(&[MODE_RBAC, MODE_ALWAYS_ALLOW], &store);
    assert_eq!(bootstrap.authorize(&ctx, &nobody).unwrap().decision, Decision::Allow);
}

#[test]
fn test_writes_are_seen_by_later_decisions() {
    let store = store();
    let chain = chain(&[MODE_RBAC], &store);
    let ctx = Context::background();
    let attrs = request("alice", "get", "pods", "ns");
    assert!(chain.is_allowed(&ctx, &attrs).unwrap());

    store.delete_role_binding("ns", "read-pods").unwrap();
    assert!(!chain.is_allowed(&ctx, &attrs).unwrap());
}

#[test]
fn test_cancellation_is_not_a_decision() {
    let store = store();
    let chain = chain(&[MODE_RBAC, MODE_ALWAYS_ALLOW], &store);
    let ctx = Context::with_timeout(Duration::from_secs(30));
    let handle = ctx.cancel_handle();
    handle.cancel();

    let err = chain
        .authorize(&ctx, &request("alice", "get", "pods", "ns"))
        .unwrap_err();
    assert!(matches!(err, Error::Aborted(_)));
}

#[test]
fn test_concurrent_decisions_share_one_chain() {
    let store = store();
    let chain = Arc::new(chain(&[MODE_RBAC], &store));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let chain = Arc::clone(&chain);
            thread::spawn(move || {
                let user = if i % 2 == 0 { "alice" } else { "bob" };
                let attrs = request(user, "get", "pods", "ns");
                chain.is_allowed(&Context::background(), &attrs).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), i % 2 == 0);
    }

    let audit = chain.audit().unwrap();
    assert_eq!(audit.get_evaluations("alice").len(), 4);
    assert_eq!(audit.get_evaluations_by_decision(Decision::Deny).len(), 4);
}

#[test]
fn test_abac_and_rbac_from_config_file() {
    let dir = tempfile::tempdir().unwrap();

    let mut abac = std::fs::File::create(dir.path().join("abac.jsonl")).unwrap();
    writeln!(abac, "# interns may list pods anywhere").unwrap();
    writeln!(
        abac,
        r#"{{"group": "interns", "readonly": true, "verbs": ["*"], "resources": ["pods"]}}"#
    )
    .unwrap();

    let mut config = std::fs::File::create(dir.path().join("warden.toml")).unwrap();
    writeln!(config, "modes = [\"RBAC\", \"ABAC\"]").unwrap();
    writeln!(config, "policy_file = \"abac.jsonl\"").unwrap();
    writeln!(config, "timeout_ms = 10000").unwrap();

    let config = AuthorizationConfig::load(dir.path().join("warden.toml")).unwrap();
    let deps = AuthorizerDeps::new().with_listers(PolicyListers::from_store(store()));
    let chain = AuthorizerRegistry::with_defaults()
        .build_chain(&config, &deps)
        .unwrap();
    let ctx = Context::background();

    let intern = UserInfo::new("ivan").with_groups(["interns"]);
    let list = Attributes::resource(intern.clone(), "list", "pods", "prod");
    let result = chain.authorize(&ctx, &list).unwrap();
    assert_eq!(result.decision, Decision::Allow);
    assert_eq!(result.reason, "ABAC: allowed by policy on line 2");

    let delete = Attributes::resource(intern, "delete", "pods", "prod");
    assert_eq!(chain.authorize(&ctx, &delete).unwrap().decision, Decision::Deny);

    let alice = request("alice", "get", "pods", "ns");
    assert!(chain
        .authorize(&ctx, &alice)
        .unwrap()
        .reason
        .starts_with("RBAC: allowed by RoleBinding"));
}

#[test]
fn test_valid_rules_have_exactly_one_shape() {
    let candidates = vec![
        PolicyRule::resource(["get"], ["pods"]),
        PolicyRule::non_resource(["get"], ["/healthz"]),
        PolicyRule::resource(["get"], Vec::<String>::new()),
        PolicyRule {
            verbs: vec!["get".into()],
            resources: vec!["pods".into()],
            non_resource_urls: vec!["/healthz".into()],
            ..PolicyRule::default()
        },
        PolicyRule::default(),
    ];

    let path = warden_core::FieldPath::new("rule");
    for rule in candidates {
        if validate_policy_rule(&rule, false, &path).is_empty() {
            assert!(rule.resources.is_empty() != rule.non_resource_urls.is_empty());
        }
    }
}
