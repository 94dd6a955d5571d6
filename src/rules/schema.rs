use crate::path::Path;
use crate::rules::pattern::PathPattern;
use crate::rules::version::parse_requirement;
use crate::value::Value;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RuleSet {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

impl RuleSet {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.rules.is_empty() {
            issues.push(ValidationIssue::EmptyRuleList);
        }

        match (&self.meta.version_range, &self.meta.version_field) {
            (Some(range), field) => {
                if field.as_deref().unwrap_or("").trim().is_empty() {
                    issues.push(ValidationIssue::InvalidCombo {
                        rule_id: None,
                        message: "version_range requires version_field".to_string(),
                    });
                }
                if let Err(e) = parse_requirement(range) {
                    issues.push(ValidationIssue::InvalidCombo {
                        rule_id: None,
                        message: e.to_string(),
                    });
                }
            }
            (None, Some(_)) => {
                issues.push(ValidationIssue::InvalidCombo {
                    rule_id: None,
                    message: "version_field is set but version_range is missing".to_string(),
                });
            }
            (None, None) => {}
        }
        if let Some(field) = &self.meta.version_field {
            if let Err(e) = Path::parse(field) {
                issues.push(ValidationIssue::InvalidCombo {
                    rule_id: None,
                    message: e.to_string(),
                });
            }
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: None,
                    field: "id",
                });
            } else if !seen.insert(rule.id.as_str()) {
                issues.push(ValidationIssue::DuplicateId {
                    rule_id: rule.id.clone(),
                });
            }

            if rule.path.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: Some(rule.id.clone()),
                    field: "path",
                });
            } else if let Err(e) = PathPattern::parse(&rule.path) {
                issues.push(ValidationIssue::InvalidCombo {
                    rule_id: Some(rule.id.clone()),
                    message: e.to_string(),
                });
            }

            if let Action::Reject { message } = &rule.action {
                if message.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        rule_id: Some(rule.id.clone()),
                        field: "action.message",
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Dotted path of the document's version string.
    #[serde(default)]
    pub version_field: Option<String>,
    /// Semver requirement the document version must satisfy.
    #[serde(default)]
    pub version_range: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuleDefinition {
    pub id: String,
    pub path: String,
    pub action: Action,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Action {
    Replace {
        value: Value,
    },
    Delete,
    /// Only valid on list elements; anywhere else the traversal fails.
    Splice {
        values: Vec<Value>,
    },
    /// Leave the matched subtree untouched by later rules.
    Skip,
    /// Fail the whole document.
    Reject {
        message: String,
    },
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyRuleList,
    MissingField {
        rule_id: Option<String>,
        field: &'static str,
    },
    DuplicateId {
        rule_id: String,
    },
    InvalidCombo {
        rule_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRuleList => write!(f, "rule set contains no rules"),
            ValidationIssue::MissingField { rule_id, field } => match rule_id {
                Some(id) => write!(f, "rule '{id}' missing required field '{field}'"),
                None => write!(f, "rule missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId { rule_id } => {
                write!(f, "rule id '{rule_id}' is used more than once")
            }
            ValidationIssue::InvalidCombo { rule_id, message } => match rule_id {
                Some(id) => write!(f, "rule '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid rule set configuration: {message}"),
            },
        }
    }
}
