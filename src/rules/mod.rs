pub mod applicator;
pub mod loader;
pub mod pattern;
pub mod schema;
pub mod version;

pub use applicator::{apply_rules, ApplicationError, RuleHit, RuleViolation, RuleVisitor, ScrubOutcome};
pub use loader::{load, load_from_dir, load_from_path, load_from_str, ConfigError};
pub use pattern::PathPattern;
pub use schema::{Action, Metadata, RuleDefinition, RuleSet, ValidationError, ValidationIssue};
pub use version::{matches_requirement, VersionError};
