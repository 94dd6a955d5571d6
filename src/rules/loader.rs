use crate::rules::schema::{RuleSet, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
    NoRuleFiles {
        dir: PathBuf,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read rule set from {}: {}", path.display(), source)
            }
            ConfigError::Walk { path, source } => {
                write!(f, "failed to list rule files in {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse rule set TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse rule set TOML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid rule set ({}): {}", path.display(), source),
                None => write!(f, "invalid rule set: {}", source),
            },
            ConfigError::NoRuleFiles { dir } => {
                write!(f, "no .toml rule files found in {}", dir.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Walk { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
            ConfigError::NoRuleFiles { .. } => None,
        }
    }
}

pub fn load_from_str(input: &str) -> Result<RuleSet, ConfigError> {
    let rules: RuleSet = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    rules
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(rules)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RuleSet, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

/// Load every `*.toml` rule set directly inside `dir`, sorted by file name.
pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Vec<(PathBuf, RuleSet)>, ConfigError> {
    let dir = dir.as_ref();
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| ConfigError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
        {
            files.push(entry.path().to_path_buf());
        }
    }

    if files.is_empty() {
        return Err(ConfigError::NoRuleFiles {
            dir: dir.to_path_buf(),
        });
    }

    files.sort();
    files
        .into_iter()
        .map(|file| load_from_path(&file).map(|rules| (file, rules)))
        .collect()
}

/// Load a single rule file, or every rule file in a directory.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<(PathBuf, RuleSet)>, ConfigError> {
    let path = path.as_ref();
    if path.is_dir() {
        load_from_dir(path)
    } else {
        load_from_path(path).map(|rules| vec![(path.to_path_buf(), rules)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::schema::Action;
    use crate::value::Value;

    #[test]
    fn parses_actions() {
        let input = r#"
[meta]
name = "scrub"

[[rules]]
id = "mask"
path = "**.password"
[rules.action]
type = "replace"
value = "***"

[[rules]]
id = "drop"
path = "auth.*.token"
action = { type = "delete" }

[[rules]]
id = "expand"
path = "tags.*"
action = { type = "splice", values = ["a", 1, { k = true }] }
"#;
        let rules = load_from_str(input).unwrap();
        assert_eq!(rules.meta.name, "scrub");
        assert_eq!(
            rules.rules[0].action,
            Action::Replace {
                value: Value::str("***")
            }
        );
        assert_eq!(rules.rules[1].action, Action::Delete);
        assert_eq!(
            rules.rules[2].action,
            Action::Splice {
                values: vec![
                    Value::str("a"),
                    Value::int(1),
                    Value::map([("k", Value::bool(true))]),
                ]
            }
        );
    }

    #[test]
    fn validation_collects_issues() {
        let input = r#"
[meta]
version_range = ">=1.0.0"

[[rules]]
id = "a"
path = "x..y"
action = { type = "delete" }

[[rules]]
id = "a"
path = "z"
action = { type = "reject", message = " " }
"#;
        let err = load_from_str(input).unwrap_err();
        let ConfigError::Validation { source, .. } = err else {
            panic!("expected validation error, got {err}");
        };
        assert_eq!(source.issues.len(), 4, "{source}");
    }

    #[test]
    fn empty_rule_list_is_invalid() {
        let err = load_from_str("[meta]\nname = \"empty\"\n").unwrap_err();
        assert!(err.to_string().contains("rule set contains no rules"));
    }

    #[test]
    fn unknown_action_is_a_toml_error() {
        let input = "[[rules]]\nid = \"a\"\npath = \"b\"\naction = { type = \"explode\" }\n";
        assert!(matches!(
            load_from_str(input),
            Err(ConfigError::Toml { .. })
        ));
    }

    #[test]
    fn load_from_dir_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let rule = "[[rules]]\nid = \"r\"\npath = \"a\"\naction = { type = \"delete\" }\n";
        fs::write(dir.path().join("b.toml"), rule).unwrap();
        fs::write(dir.path().join("a.toml"), rule).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let loaded = load(dir.path()).unwrap();
        let names: Vec<_> = loaded
            .iter()
            .map(|(path, _)| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.toml", "b.toml"]);
    }

    #[test]
    fn empty_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_from_dir(dir.path()),
            Err(ConfigError::NoRuleFiles { .. })
        ));
    }

    #[test]
    fn errors_carry_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bad.toml");
        fs::write(&file, "[[rules]]\nid = \"\"\npath = \"a\"\naction = { type = \"skip\" }\n").unwrap();
        let err = load_from_path(&file).unwrap_err();
        assert!(err.to_string().contains("bad.toml"), "{err}");
    }
}
