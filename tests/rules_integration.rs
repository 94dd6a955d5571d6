//! Integration tests for rule sets
//!
//! Tests loading rule files from disk, version filtering, and rule application

use std::fs;
use tempfile::TempDir;
use traverser::rules::{
    apply_rules, load, load_from_dir, load_from_path, load_from_str, ApplicationError,
    ConfigError, ScrubOutcome,
};
use traverser::value::convert::from_json_str;
use traverser::{get_at_path, TraverseError, Value};

const MASK_RULES: &str = r#"
[meta]
name = "mask-secrets"
description = "Mask credentials everywhere"

[[rules]]
id = "mask-password"
path = "**.password"
action = { type = "replace", value = "********" }

[[rules]]
id = "drop-tokens"
path = "auth.*.token"
action = { type = "delete" }
"#;

const VERSIONED_RULES: &str = r#"
[meta]
name = "v1-only"
version_field = "schema"
version_range = ">=1.0.0, <2.0.0"

[[rules]]
id = "drop-legacy"
path = "legacy"
action = { type = "delete" }
"#;

fn document(schema: &str) -> Value {
    from_json_str(&format!(
        r#"{{
            "schema": "{schema}",
            "legacy": {{"enabled": true}},
            "db": {{"user": "app", "password": "pw"}},
            "auth": {{
                "github": {{"token": "ghp_x", "scopes": ["repo"]}},
                "gitlab": {{"token": "glpat_y"}}
            }}
        }}"#
    ))
    .unwrap()
}

/// Helper to write rule files into a fresh directory
fn setup_rules_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

#[test]
fn test_load_and_apply_from_file() {
    let dir = setup_rules_dir(&[("mask.toml", MASK_RULES)]);
    let rules = load_from_path(dir.path().join("mask.toml")).unwrap();
    assert_eq!(rules.meta.name, "mask-secrets");
    assert_eq!(rules.rules.len(), 2);

    let original = document("1.2.0");
    let ScrubOutcome::Applied {
        value: Some(value),
        hits,
    } = apply_rules(&rules, &original).unwrap()
    else {
        panic!("expected rules to apply");
    };

    assert_eq!(
        get_at_path(&value, &["db", "password"]).unwrap(),
        &Value::str("********")
    );
    for provider in ["github", "gitlab"] {
        let err = get_at_path(&value, &["auth", provider, "token"]).unwrap_err();
        assert!(matches!(err, TraverseError::KeyNotFound { .. }));
    }
    assert!(get_at_path(&value, &["auth", "github", "scopes"]).is_ok());
    assert_eq!(hits.len(), 3);

    // The input is untouched
    assert_eq!(original, document("1.2.0"));
}

#[test]
fn test_directory_rule_sets_apply_in_name_order() {
    let dir = setup_rules_dir(&[
        ("20-mask.toml", MASK_RULES),
        ("10-versioned.toml", VERSIONED_RULES),
        ("README.md", "not a rule file"),
    ]);
    let loaded = load_from_dir(dir.path()).unwrap();
    let names: Vec<_> = loaded
        .iter()
        .map(|(_, rules)| rules.meta.name.as_str())
        .collect();
    assert_eq!(names, vec!["v1-only", "mask-secrets"]);

    let mut current = document("1.0.0");
    for (_, rules) in &loaded {
        match apply_rules(rules, &current).unwrap() {
            ScrubOutcome::Applied {
                value: Some(value), ..
            } => current = value,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert!(get_at_path(&current, &["legacy"]).is_err());
    assert_eq!(
        get_at_path(&current, &["db", "password"]).unwrap(),
        &Value::str("********")
    );
}

#[test]
fn test_version_outside_range_is_skipped() {
    let rules = load_from_str(VERSIONED_RULES).unwrap();
    match apply_rules(&rules, &document("2.1.0")).unwrap() {
        ScrubOutcome::SkippedVersion { reason } => {
            assert!(reason.contains("2.1.0"), "{reason}");
        }
        other => panic!("expected skip, got {other:?}"),
    }
}

#[test]
fn test_prerelease_versions_follow_semver() {
    let rules = load_from_str(VERSIONED_RULES).unwrap();
    // Pre-releases only match requirements that name a pre-release.
    assert!(matches!(
        apply_rules(&rules, &document("1.5.0-beta.1")).unwrap(),
        ScrubOutcome::SkippedVersion { .. }
    ));
}

#[test]
fn test_invalid_document_version_is_an_error() {
    let rules = load_from_str(VERSIONED_RULES).unwrap();
    let err = apply_rules(&rules, &document("one")).unwrap_err();
    assert!(matches!(err, ApplicationError::Version(_)));
    assert!(err.to_string().contains("'one'"), "{err}");
}

#[test]
fn test_load_single_file_or_directory() {
    let dir = setup_rules_dir(&[("mask.toml", MASK_RULES)]);
    assert_eq!(load(dir.path()).unwrap().len(), 1);
    assert_eq!(load(dir.path().join("mask.toml")).unwrap().len(), 1);

    let err = load(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_invalid_rule_file_in_directory() {
    let dir = setup_rules_dir(&[
        ("a.toml", MASK_RULES),
        ("b.toml", "[[rules]]\nid = \"x\"\npath = \"\"\naction = { type = \"delete\" }\n"),
    ]);
    let err = load_from_dir(dir.path()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("b.toml"), "{message}");
    assert!(message.contains("missing required field 'path'"), "{message}");
}

#[test]
fn test_reject_stops_processing() {
    let rules = load_from_str(
        r#"
[[rules]]
id = "no-plaintext"
path = "db.password"
action = { type = "reject", message = "plaintext database password" }

[[rules]]
id = "mask"
path = "**.token"
action = { type = "replace", value = "x" }
"#,
    )
    .unwrap();
    let err = apply_rules(&rules, &document("1.0.0")).unwrap_err();
    let violation = err.rejection().expect("rejected");
    assert_eq!(violation.rule_id, "no-plaintext");
    assert_eq!(violation.message, "plaintext database password");
}
