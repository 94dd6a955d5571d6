//! Version gating for rule sets.
//!
//! A rule set may declare `version_field` and `version_range`; it then only
//! applies to documents whose version string satisfies the range, e.g.
//! `">=1.2.0, <2.0.0"`.

use semver::{Version, VersionReq};
use std::fmt;

#[derive(Debug, Clone)]
pub enum VersionError {
    /// Invalid version string found in the document
    InvalidVersion { value: String, source: String },
    /// Invalid version requirement in the rule set
    InvalidRequirement { value: String, source: String },
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionError::InvalidVersion { value, source } => {
                write!(f, "invalid document version '{}': {}", value, source)
            }
            VersionError::InvalidRequirement { value, source } => {
                write!(f, "invalid version requirement '{}': {}", value, source)
            }
        }
    }
}

impl std::error::Error for VersionError {}

pub fn parse_requirement(requirement: &str) -> Result<VersionReq, VersionError> {
    VersionReq::parse(requirement.trim()).map_err(|e| VersionError::InvalidRequirement {
        value: requirement.to_string(),
        source: e.to_string(),
    })
}

/// Check if a version matches a requirement string
///
/// # Examples
///
/// ```
/// use traverser::rules::version::matches_requirement;
///
/// assert!(matches_requirement("1.4.0", Some(">=1.0.0")).unwrap());
/// assert!(!matches_requirement("0.9.0", Some(">=1.0.0, <2.0.0")).unwrap());
///
/// // None requirement means "any version"
/// assert!(matches_requirement("3.0.0", None).unwrap());
/// ```
pub fn matches_requirement(
    version: &str,
    requirement: Option<&str>,
) -> Result<bool, VersionError> {
    let Some(req_str) = requirement else {
        return Ok(true);
    };

    let req_str = req_str.trim();
    if req_str.is_empty() {
        return Ok(true);
    }

    let version = Version::parse(version.trim()).map_err(|e| VersionError::InvalidVersion {
        value: version.to_string(),
        source: e.to_string(),
    })?;

    let req = parse_requirement(req_str)?;

    Ok(req.matches(&version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_requirement() {
        assert!(matches_requirement("0.1.0", None).unwrap());
        assert!(matches_requirement("1.0.0", Some("   ")).unwrap());
    }

    #[test]
    fn test_compound_requirement() {
        let req = ">=1.0.0, <2.0.0";

        assert!(matches_requirement("1.0.0", Some(req)).unwrap());
        assert!(matches_requirement("1.9.3", Some(req)).unwrap());
        assert!(!matches_requirement("0.9.0", Some(req)).unwrap());
        assert!(!matches_requirement("2.0.0", Some(req)).unwrap());
    }

    #[test]
    fn test_caret_requirement() {
        let req = "^1.2";
        assert!(matches_requirement("1.2.0", Some(req)).unwrap());
        assert!(matches_requirement("1.7.5", Some(req)).unwrap());
        assert!(!matches_requirement("2.0.0", Some(req)).unwrap());
    }

    #[test]
    fn test_invalid_version() {
        let result = matches_requirement("v-next", Some(">=1.0.0"));
        assert!(matches!(result, Err(VersionError::InvalidVersion { .. })));
    }

    #[test]
    fn test_invalid_requirement() {
        let result = matches_requirement("1.0.0", Some(">=bad-version"));
        assert!(matches!(result, Err(VersionError::InvalidRequirement { .. })));
    }
}
