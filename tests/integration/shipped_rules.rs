//! Integration tests for the shipped credential and telemetry rule sets.
//!
//! Runs the real files under `rules/` against a mock service config.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use traverser::document::Document;
use traverser::rules::{apply_rules, load_from_dir, RuleSet, ScrubOutcome};
use traverser::{get_at_path, Key, Value};

const SERVICE_CONFIG: &str = r#"schema_version = "1.3.0"

[telemetry]
exporter = "otlp"
endpoints = ["https://metrics.example.com/v1"]
allowed_hosts = ["ab.example.com", "cd.example.com"]

[auth.github]
token = "ghp_abc123"
user = "octocat"

[auth.gitlab]
token = "glpat_def456"

[database]
url = "postgres://db.internal/app"
password = "hunter2"

[examples]
password = "example-password"

[[servers]]
name = "primary"
api_key = "sk_live_1"
private_key = "-----BEGIN KEY-----"

[[servers]]
name = "replica"
"#;

fn rules_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("rules")
}

fn setup_config(contents: &str) -> (TempDir, Document) {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("service.toml");
    fs::write(&file, contents).unwrap();
    let document = Document::read(&file).unwrap();
    (dir, document)
}

fn scrub(rule_sets: &[(PathBuf, RuleSet)], value: &Value) -> (Value, usize, usize) {
    let mut current = value.clone();
    let mut hits = 0;
    let mut skipped = 0;
    for (file, rules) in rule_sets {
        match apply_rules(rules, &current) {
            Ok(ScrubOutcome::Applied {
                value: Some(value),
                hits: rule_hits,
            }) => {
                hits += rule_hits.len();
                current = value;
            }
            Ok(ScrubOutcome::Applied { value: None, .. }) => {
                panic!("✗ {}: deleted the document", file.display())
            }
            Ok(ScrubOutcome::SkippedVersion { reason }) => {
                println!("⊘ {}: Skipped - {}", file.display(), reason);
                skipped += 1;
            }
            Err(e) => panic!("✗ {}: Error - {}", file.display(), e),
        }
    }
    (current, hits, skipped)
}

#[test]
fn test_shipped_rules_load() {
    let rule_sets = load_from_dir(rules_dir()).expect("Failed to load rules/");
    let names: Vec<_> = rule_sets
        .iter()
        .map(|(_, rules)| rules.meta.name.as_str())
        .collect();
    assert_eq!(names, vec!["credentials", "telemetry-off"]);
}

#[test]
fn test_shipped_rules_scrub_service_config() {
    let rule_sets = load_from_dir(rules_dir()).unwrap();
    let (_dir, document) = setup_config(SERVICE_CONFIG);
    let (scrubbed, hits, skipped) = scrub(&rule_sets, &document.value);

    assert_eq!(skipped, 0);
    assert!(hits > 0, "No rules matched");

    assert_eq!(
        get_at_path(&scrubbed, &["database", "password"]).unwrap(),
        &Value::str("********")
    );
    assert_eq!(
        get_at_path(&scrubbed, &["examples", "password"]).unwrap(),
        &Value::str("example-password"),
        "skipped subtree must be left alone"
    );
    assert!(get_at_path(&scrubbed, &["auth", "github", "token"]).is_err());
    assert_eq!(
        get_at_path(&scrubbed, &["auth", "github", "user"]).unwrap(),
        &Value::str("octocat")
    );
    assert_eq!(
        get_at_path(&scrubbed, &["telemetry", "exporter"]).unwrap(),
        &Value::str("none")
    );
    assert!(get_at_path(&scrubbed, &["telemetry", "endpoints"]).is_err());
    assert_eq!(
        get_at_path(&scrubbed, &["telemetry", "allowed_hosts"]).unwrap(),
        &Value::List(Vec::new())
    );

    let servers = get_at_path(&scrubbed, &["servers"])
        .unwrap()
        .as_list()
        .unwrap();
    let primary = servers[0].as_map().unwrap();
    assert_eq!(
        primary.get(&Key::from("api_key")),
        Some(&Value::str("********"))
    );
    assert!(primary.get(&Key::from("private_key")).is_none());

    let rendered = document.render(&scrubbed).unwrap();
    for secret in ["hunter2", "ghp_abc123", "glpat_def456", "sk_live_1", "BEGIN KEY"] {
        assert!(!rendered.contains(secret), "{secret} leaked:\n{rendered}");
    }
    assert!(rendered.contains("exporter = \"none\""), "{rendered}");
}

#[test]
fn test_shipped_rules_idempotent() {
    let rule_sets = load_from_dir(rules_dir()).unwrap();
    let (_dir, document) = setup_config(SERVICE_CONFIG);

    let (first, _, _) = scrub(&rule_sets, &document.value);
    let (second, _, _) = scrub(&rule_sets, &first);
    assert_eq!(first, second, "Scrubbing must be idempotent");
}

#[test]
fn test_telemetry_rules_skip_schema_v2() {
    let rule_sets = load_from_dir(rules_dir()).unwrap();
    let config = SERVICE_CONFIG.replace("\"1.3.0\"", "\"2.0.0\"");
    let (_dir, document) = setup_config(&config);
    let (scrubbed, _, skipped) = scrub(&rule_sets, &document.value);

    assert_eq!(skipped, 1);
    assert_eq!(
        get_at_path(&scrubbed, &["telemetry", "exporter"]).unwrap(),
        &Value::str("otlp")
    );
    // Credentials are scrubbed regardless of schema version
    assert_eq!(
        get_at_path(&scrubbed, &["database", "password"]).unwrap(),
        &Value::str("********")
    );
}

#[test]
fn test_scrubbed_document_written_in_place() {
    let rule_sets = load_from_dir(rules_dir()).unwrap();
    let (_dir, document) = setup_config(SERVICE_CONFIG);
    let (scrubbed, _, _) = scrub(&rule_sets, &document.value);

    document.write(&document.render(&scrubbed).unwrap()).unwrap();
    let reread = Document::read(&document.path).unwrap();
    assert_eq!(reread.value, scrubbed);
}

#[test]
fn test_telemetry_rules_report_allowed_host_hits() {
    let rule_sets = load_from_dir(rules_dir()).unwrap();
    let (_, telemetry) = rule_sets
        .iter()
        .find(|(_, rules)| rules.meta.name == "telemetry-off")
        .unwrap();
    let (_dir, document) = setup_config(SERVICE_CONFIG);

    let ScrubOutcome::Applied { hits, .. } = apply_rules(telemetry, &document.value).unwrap()
    else {
        panic!("telemetry rules should apply to schema 1.x");
    };
    let host_hits: Vec<_> = hits
        .iter()
        .filter(|hit| hit.rule_id == "drop-allowed-hosts")
        .map(|hit| hit.path.to_string())
        .collect();
    assert_eq!(
        host_hits,
        vec!["telemetry.allowed_hosts.0", "telemetry.allowed_hosts.1"]
    );
}
