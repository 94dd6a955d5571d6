//! Glob-style path patterns for rules.
//!
//! Segments are matched exactly, except `*` (any one segment) and `**` (zero
//! or more segments). Segments use the same dotted syntax as
//! [`Path::parse`](crate::Path::parse), so quoted segments may contain dots.

use crate::errors::TraverseError;
use crate::path::Path;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    AnyOne,
    AnyDepth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(input: &str) -> Result<Self, TraverseError> {
        let parsed = Path::parse(input)?;
        if parsed.is_root() {
            return Err(TraverseError::InvalidPath {
                input: input.to_string(),
                message: "empty pattern".to_string(),
            });
        }
        let segments = parsed
            .segments()
            .iter()
            .map(|segment| match segment.as_str() {
                "*" => Segment::AnyOne,
                "**" => Segment::AnyDepth,
                literal => Segment::Literal(literal.to_string()),
            })
            .collect();
        Ok(Self {
            source: input.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, path: &Path) -> bool {
        matches_from(&self.segments, path.segments())
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

// Tracks which path prefixes the pattern consumed so far can match, one
// pattern segment at a time. Runs in O(pattern * path).
fn matches_from(pattern: &[Segment], path: &[String]) -> bool {
    let mut reachable = vec![false; path.len() + 1];
    reachable[0] = true;
    for segment in pattern {
        let mut next = vec![false; path.len() + 1];
        match segment {
            Segment::AnyDepth => {
                let mut seen = false;
                for (end, slot) in next.iter_mut().enumerate() {
                    seen |= reachable[end];
                    *slot = seen;
                }
            }
            Segment::AnyOne => {
                for (index, _) in path.iter().enumerate() {
                    next[index + 1] = reachable[index];
                }
            }
            Segment::Literal(literal) => {
                for (index, head) in path.iter().enumerate() {
                    next[index + 1] = reachable[index] && literal == head;
                }
            }
        }
        if !next.contains(&true) {
            return false;
        }
        reachable = next;
    }
    reachable[path.len()]
}
