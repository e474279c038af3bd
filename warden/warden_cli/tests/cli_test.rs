use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const BUNDLE: &str = r#"{
    "roles": [
        {
            "metadata": {"name": "pod-reader", "namespace": "dev"},
            "rules": [{"verbs": ["get", "list"], "resources": ["pods", "pods/log"]}]
        }
    ],
    "roleBindings": [
        {
            "metadata": {"name": "read-pods", "namespace": "dev"},
            "roleRef": {"kind": "Role", "name": "pod-reader"},
            "subjects": [{"kind": "User", "name": "alice"}]
        }
    ],
    "clusterRoles": [
        {
            "metadata": {"name": "health"},
            "rules": [{"verbs": ["get"], "nonResourceURLs": ["/healthz"]}]
        }
    ],
    "clusterRoleBindings": [
        {
            "metadata": {"name": "health"},
            "roleRef": {"kind": "ClusterRole", "name": "health"},
            "subjects": [{"kind": "Group", "name": "system:authenticated"}]
        }
    ]
}"#;

fn warden() -> Command {
    let mut cmd = Command::cargo_bin("warden").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Write an RBAC-only setup and return the config path.
fn rbac_setup(dir: &Path) -> PathBuf {
    fs::write(dir.join("rbac.json"), BUNDLE).unwrap();
    let config = dir.join("warden.toml");
    fs::write(
        &config,
        "modes = [\"RBAC\"]\nrbac_file = \"rbac.json\"\nlog_level = \"error\"\n",
    )
    .unwrap();
    config
}

#[test]
fn test_check_allows_bound_user() {
    let dir = TempDir::new().unwrap();
    let config = rbac_setup(dir.path());

    warden()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .args(["--user", "alice", "--verb", "get"])
        .args(["--resource", "pods", "--namespace", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "ALLOW: RBAC: allowed by RoleBinding \"dev/read-pods\"",
        ));
}

#[test]
fn test_check_denies_unbound_user() {
    let dir = TempDir::new().unwrap();
    let config = rbac_setup(dir.path());

    warden()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .args(["--user", "bob", "--verb", "get"])
        .args(["--resource", "pods", "--namespace", "dev"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "DENY: no authorizer allowed the request",
        ));
}

#[test]
fn test_check_subresource_and_wrong_namespace() {
    let dir = TempDir::new().unwrap();
    let config = rbac_setup(dir.path());

    warden()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .args(["--user", "alice", "--verb", "get"])
        .args(["--resource", "pods", "--subresource", "log"])
        .args(["--namespace", "dev", "--name", "web-0"])
        .assert()
        .success();

    warden()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .args(["--user", "alice", "--verb", "get"])
        .args(["--resource", "pods", "--namespace", "prod"])
        .assert()
        .code(1);
}

#[test]
fn test_check_non_resource_path_via_group() {
    let dir = TempDir::new().unwrap();
    let config = rbac_setup(dir.path());

    warden()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .args(["--user", "carol", "--group", "system:authenticated"])
        .args(["--verb", "get", "--path", "/healthz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ClusterRoleBinding \"health\""));

    warden()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .args(["--user", "carol", "--verb", "get", "--path", "/healthz"])
        .assert()
        .code(1);
}

#[test]
fn test_check_json_output() {
    let dir = TempDir::new().unwrap();
    let config = rbac_setup(dir.path());

    let output = warden()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .args(["--user", "alice", "--verb", "list"])
        .args(["--resource", "pods", "--namespace", "dev", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["decision"], "Allow");
}

#[test]
fn test_check_requires_resource_or_path() {
    let dir = TempDir::new().unwrap();
    let config = rbac_setup(dir.path());

    warden()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .args(["--user", "alice", "--verb", "get"])
        .assert()
        .failure();

    warden()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .args(["--user", "alice", "--verb", "get"])
        .args(["--resource", "pods", "--path", "/healthz"])
        .assert()
        .failure();
}

#[test]
fn test_check_always_deny_and_abac() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("abac.jsonl"),
        "# operators read everything\n\
         {\"user\": \"ops\", \"readonly\": true, \"verbs\": [\"*\"], \"resources\": [\"*\"]}\n",
    )
    .unwrap();
    let config = dir.path().join("warden.toml");
    fs::write(
        &config,
        "modes = [\"ABAC\", \"AlwaysDeny\"]\npolicy_file = \"abac.jsonl\"\n",
    )
    .unwrap();

    warden()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .args(["--user", "ops", "--verb", "get", "--resource", "secrets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ABAC: allowed by policy on line 2"));

    warden()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .args(["--user", "ops", "--verb", "delete", "--resource", "secrets"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("DENY: Everything is forbidden."));
}

#[test]
fn test_check_bad_config_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("warden.toml");
    fs::write(&config, "modes = [\"ABAC\"]\n").unwrap();

    warden()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .args(["--user", "alice", "--verb", "get", "--resource", "pods"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ABAC mode requires policy_file"));

    warden()
        .arg("check")
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .args(["--user", "alice", "--verb", "get", "--resource", "pods"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_check_unknown_mode() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("warden.toml");
    fs::write(&config, "modes = [\"Webhook\"]\n").unwrap();

    warden()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .args(["--user", "alice", "--verb", "get", "--resource", "pods"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Webhook"));
}

#[test]
fn test_validate_valid_bundle() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("rbac.json");
    fs::write(&file, BUNDLE).unwrap();

    warden()
        .arg("validate")
        .arg("--file")
        .arg(&file)
        .assert()
        .success()
        .stdout("valid\n");
}

#[test]
fn test_validate_reports_field_errors() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("rbac.json");
    fs::write(
        &file,
        r#"{
            "roles": [
                {
                    "metadata": {"name": "bad", "namespace": "dev"},
                    "rules": [{"verbs": [], "resources": ["pods"]}]
                }
            ],
            "clusterRoleBindings": [
                {
                    "metadata": {"name": "b"},
                    "roleRef": {"kind": "Role", "name": "x"},
                    "subjects": [{"kind": "User", "name": "alice"}]
                }
            ]
        }"#,
    )
    .unwrap();

    warden()
        .arg("validate")
        .arg("--file")
        .arg(&file)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Role dev/bad"))
        .stdout(predicate::str::contains("verbs must contain at least one value"))
        .stdout(predicate::str::contains("ClusterRoleBinding b"));
}

#[test]
fn test_validate_malformed_json() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("rbac.json");
    fs::write(&file, "{ not json").unwrap();

    warden()
        .arg("validate")
        .arg("--file")
        .arg(&file)
        .assert()
        .code(2)
        .stderr(predicate::str::starts_with("error:"));
}

#[test]
fn test_rules_lists_grants() {
    let dir = TempDir::new().unwrap();
    let config = rbac_setup(dir.path());

    warden()
        .arg("rules")
        .arg("--config")
        .arg(&config)
        .args(["--user", "alice", "--group", "system:authenticated"])
        .args(["--namespace", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/healthz"))
        .stdout(predicate::str::contains("pods/log"));

    warden()
        .arg("rules")
        .arg("--config")
        .arg(&config)
        .args(["--user", "alice"])
        .assert()
        .success()
        .stdout("no rules\n");
}

#[test]
fn test_rules_json_output() {
    let dir = TempDir::new().unwrap();
    let config = rbac_setup(dir.path());

    let output = warden()
        .arg("rules")
        .arg("--config")
        .arg(&config)
        .args(["--user", "alice", "--namespace", "dev", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let rules: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rules.as_array().unwrap().len(), 1);
    assert_eq!(rules[0]["resources"][0], "pods");
}

#[test]
fn test_rules_reports_dangling_binding_as_complete() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("rbac.json"),
        r#"{
            "roleBindings": [
                {
                    "metadata": {"name": "ghost", "namespace": "dev"},
                    "roleRef": {"kind": "Role", "name": "missing"},
                    "subjects": [{"kind": "User", "name": "alice"}]
                }
            ]
        }"#,
    )
    .unwrap();
    let config = dir.path().join("warden.toml");
    fs::write(&config, "rbac_file = \"rbac.json\"\n").unwrap();

    warden()
        .arg("rules")
        .arg("--config")
        .arg(&config)
        .args(["--user", "alice", "--namespace", "dev"])
        .assert()
        .success()
        .stdout("no rules\n");
}

#[test]
fn test_invalid_log_level_rejected() {
    warden()
        .args(["--log-level", "loud", "validate", "--file", "x.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown log level"));
}
