//! Rule applicator - runs a rule set over a document
//!
//! Rules are compiled once, then driven through [`traverse`] by a
//! [`RuleVisitor`]. `skip` rules prune subtrees in `accept`; every other
//! action becomes the node's directive in `visit`.

use crate::access::get_at_path;
use crate::engine::traverse;
use crate::errors::TraverseError;
use crate::op::{Directive, Visit};
use crate::path::Path;
use crate::rules::pattern::PathPattern;
use crate::rules::schema::{Action, RuleDefinition, RuleSet};
use crate::rules::version::{matches_requirement, VersionError};
use crate::value::{Scalar, Value};
use crate::visitor::Visitor;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Result of running one rule set over a document
#[derive(Debug, Clone, PartialEq)]
#[must_use = "ScrubOutcome carries the scrubbed document"]
pub enum ScrubOutcome {
    /// Rules ran; `value` is `None` when a rule deleted the root
    Applied {
        value: Option<Value>,
        hits: Vec<RuleHit>,
    },
    /// The document version is outside the rule set's range
    SkippedVersion { reason: String },
}

impl fmt::Display for ScrubOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrubOutcome::Applied { hits, .. } => match hits.len() {
                1 => write!(f, "Applied 1 rule hit"),
                n => write!(f, "Applied {} rule hits", n),
            },
            ScrubOutcome::SkippedVersion { reason } => write!(f, "Skipped (version): {}", reason),
        }
    }
}

/// One rule firing on one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHit {
    pub rule_id: String,
    pub path: Path,
    pub action: &'static str,
}

/// Raised by a `reject` rule; surfaces as [`TraverseError::Visitor`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("rule '{rule_id}' rejected the document at {path}: {message}")]
pub struct RuleViolation {
    pub rule_id: String,
    pub path: Path,
    pub message: String,
}

/// Errors during rule application
#[derive(Debug)]
pub enum ApplicationError {
    /// Version gating failed
    Version(VersionError),
    /// The document's version field is not a string
    VersionNotString { field: String, found: String },
    /// Rule path did not compile
    InvalidPattern {
        rule_id: String,
        source: TraverseError,
    },
    /// Traversal aborted, including rejections
    Traverse(TraverseError),
}

impl ApplicationError {
    /// The rule violation behind a `reject` action, if that is what aborted.
    pub fn rejection(&self) -> Option<&RuleViolation> {
        match self {
            ApplicationError::Traverse(err) => err.downcast_visitor::<RuleViolation>(),
            _ => None,
        }
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationError::Version(e) => write!(f, "version error: {}", e),
            ApplicationError::VersionNotString { field, found } => {
                write!(f, "version field '{}' must be a string, found {}", field, found)
            }
            ApplicationError::InvalidPattern { rule_id, source } => {
                write!(f, "rule '{}' has an invalid path: {}", rule_id, source)
            }
            ApplicationError::Traverse(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ApplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplicationError::Version(e) => Some(e),
            ApplicationError::InvalidPattern { source, .. } => Some(source),
            ApplicationError::Traverse(e) => Some(e),
            ApplicationError::VersionNotString { .. } => None,
        }
    }
}

impl From<VersionError> for ApplicationError {
    fn from(e: VersionError) -> Self {
        ApplicationError::Version(e)
    }
}

impl From<TraverseError> for ApplicationError {
    fn from(e: TraverseError) -> Self {
        ApplicationError::Traverse(e)
    }
}

struct CompiledRule<'r> {
    definition: &'r RuleDefinition,
    pattern: PathPattern,
}

/// Visitor that applies the first matching rule at each node.
pub struct RuleVisitor<'r> {
    rules: Vec<CompiledRule<'r>>,
    hits: Vec<RuleHit>,
}

impl<'r> RuleVisitor<'r> {
    pub fn new(rule_set: &'r RuleSet) -> Result<Self, ApplicationError> {
        let rules = rule_set
            .rules
            .iter()
            .map(|definition| {
                PathPattern::parse(&definition.path)
                    .map(|pattern| CompiledRule {
                        definition,
                        pattern,
                    })
                    .map_err(|source| ApplicationError::InvalidPattern {
                        rule_id: definition.id.clone(),
                        source,
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            rules,
            hits: Vec::new(),
        })
    }

    pub fn hits(&self) -> &[RuleHit] {
        &self.hits
    }

    pub fn into_hits(self) -> Vec<RuleHit> {
        self.hits
    }

    fn matching(&self, path: &Path) -> Option<&'r RuleDefinition> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(path))
            .map(|rule| rule.definition)
    }

    fn record(&mut self, rule: &RuleDefinition, path: &Path) {
        let action = action_name(&rule.action);
        debug!(rule = %rule.id, path = %path, action, "rule matched");
        self.hits.push(RuleHit {
            rule_id: rule.id.clone(),
            path: path.clone(),
            action,
        });
    }
}

impl Visitor for RuleVisitor<'_> {
    fn accept(&mut self, path: &Path, _node: &Value) -> Directive {
        match self.matching(path) {
            Some(rule) if rule.action == Action::Skip => {
                self.record(rule, path);
                Directive::SkipSubtree
            }
            _ => Directive::Keep,
        }
    }

    fn visit(&mut self, path: &Path, _node: &Value) -> Visit {
        let Some(rule) = self.matching(path) else {
            return Visit::keep();
        };
        let visit = match &rule.action {
            // Skipped subtrees never reach here; only the root can.
            Action::Skip => return Visit::keep(),
            Action::Replace { value } => Visit::replace(value.clone()),
            Action::Delete => Visit::delete(),
            Action::Splice { values } => Visit::splice(values.clone()),
            Action::Reject { message } => Visit::fail(RuleViolation {
                rule_id: rule.id.clone(),
                path: path.clone(),
                message: message.clone(),
            }),
        };
        self.record(rule, path);
        visit
    }
}

fn action_name(action: &Action) -> &'static str {
    match action {
        Action::Replace { .. } => "replace",
        Action::Delete => "delete",
        Action::Splice { .. } => "splice",
        Action::Skip => "skip",
        Action::Reject { .. } => "reject",
    }
}

/// Check the document against the rule set's version range.
///
/// Returns the skip reason when the rule set does not apply.
fn version_gate(rule_set: &RuleSet, document: &Value) -> Result<Option<String>, ApplicationError> {
    let Some(range) = rule_set.meta.version_range.as_deref() else {
        return Ok(None);
    };
    let Some(field) = rule_set.meta.version_field.as_deref() else {
        return Ok(Some(format!(
            "version range {} has no version_field to check",
            range
        )));
    };
    let path = Path::parse(field)?;

    let found = match get_at_path(document, path.segments()) {
        Ok(found) => found,
        Err(TraverseError::KeyNotFound { .. }) | Err(TraverseError::NotTraversable { .. }) => {
            return Ok(Some(format!("version field '{}' not found", field)));
        }
        Err(other) => return Err(other.into()),
    };
    let version = match found.resolve() {
        Some(Value::Scalar(Scalar::Str(version))) => version,
        _ => {
            return Err(ApplicationError::VersionNotString {
                field: field.to_string(),
                found: found.kind().to_string(),
            })
        }
    };

    if matches_requirement(version, Some(range))? {
        Ok(None)
    } else {
        Ok(Some(format!(
            "version {} does not satisfy requirement {}",
            version, range
        )))
    }
}

/// Apply a rule set to a document
///
/// # Returns
///
/// The scrubbed copy with the list of rule hits, or the reason the rule set
/// was skipped. The input document is never modified.
pub fn apply_rules(rule_set: &RuleSet, document: &Value) -> Result<ScrubOutcome, ApplicationError> {
    if let Some(reason) = version_gate(rule_set, document)? {
        debug!(rules = %rule_set.meta.name, %reason, "rule set skipped");
        return Ok(ScrubOutcome::SkippedVersion { reason });
    }

    let mut visitor = RuleVisitor::new(rule_set)?;
    let value = traverse(document, &mut visitor).into_result()?;
    Ok(ScrubOutcome::Applied {
        value,
        hits: visitor.into_hits(),
    })
}
