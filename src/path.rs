use crate::errors::TraverseError;
use std::fmt;

/// Location of a node from the root, one segment per hop.
///
/// Map entries contribute their key's string form, list elements their
/// original index and record fields their name. Descending always builds a
/// new `Path`, so sibling calls never observe each other's segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Parse a dotted path such as `a.b."c.d"`. The empty string is the root.
    pub fn parse(input: &str) -> Result<Self, TraverseError> {
        Ok(Self {
            segments: parse_dotted_path(input)?,
        })
    }

    /// A new path one segment deeper.
    pub fn child(&self, segment: impl Into<String>) -> Path {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment.into());
        Path { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Dotted form, quoting segments that would not survive a re-parse.
    pub fn as_string(&self) -> String {
        self.segments
            .iter()
            .map(|segment| quote_segment(segment))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl AsRef<[String]> for Path {
    fn as_ref(&self) -> &[String] {
        &self.segments
    }
}

impl From<Vec<String>> for Path {
    fn from(segments: Vec<String>) -> Self {
        Self { segments }
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

fn quote_segment(segment: &str) -> String {
    let needs_quotes = segment.is_empty()
        || segment
            .chars()
            .any(|ch| ch == '.' || ch == '"' || ch == '\'' || ch.is_whitespace());
    if !needs_quotes {
        return segment.to_string();
    }
    let mut quoted = String::with_capacity(segment.len() + 2);
    quoted.push('"');
    for ch in segment.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

fn parse_dotted_path(input: &str) -> Result<Vec<String>, TraverseError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut quote_char = '\0';

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == quote_char {
                in_quotes = false;
                continue;
            }

            if quote_char == '"' && ch == '\\' {
                if let Some(next) = chars.next() {
                    let escaped = match next {
                        '"' => '"',
                        '\\' => '\\',
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    };
                    current.push(escaped);
                    continue;
                }
            }

            current.push(ch);
            continue;
        }

        match ch {
            '.' => {
                if current.is_empty() && !quoted {
                    return Err(TraverseError::InvalidPath {
                        input: input.to_string(),
                        message: "empty path segment".to_string(),
                    });
                }
                parts.push(std::mem::take(&mut current));
                quoted = false;
            }
            '"' | '\'' => {
                if !current.is_empty() || quoted {
                    return Err(TraverseError::InvalidPath {
                        input: input.to_string(),
                        message: "unexpected quote inside segment".to_string(),
                    });
                }
                in_quotes = true;
                quoted = true;
                quote_char = ch;
            }
            ch if ch.is_whitespace() => {
                return Err(TraverseError::InvalidPath {
                    input: input.to_string(),
                    message: "whitespace not allowed outside quotes".to_string(),
                });
            }
            other => {
                if quoted {
                    return Err(TraverseError::InvalidPath {
                        input: input.to_string(),
                        message: "text after closing quote".to_string(),
                    });
                }
                current.push(other);
            }
        }
    }

    if in_quotes {
        return Err(TraverseError::InvalidPath {
            input: input.to_string(),
            message: "unterminated quoted segment".to_string(),
        });
    }

    if !current.is_empty() || quoted {
        parts.push(current);
    } else if !parts.is_empty() {
        return Err(TraverseError::InvalidPath {
            input: input.to_string(),
            message: "trailing dot".to_string(),
        });
    }

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic() {
        let path = Path::parse("a.ac.aca").unwrap();
        assert_eq!(path.segments(), &["a", "ac", "aca"]);
    }

    #[test]
    fn parse_quoted() {
        let path = Path::parse("hosts.\"db.internal\".port").unwrap();
        assert_eq!(path.segments(), &["hosts", "db.internal", "port"]);
    }

    #[test]
    fn parse_empty_is_root() {
        assert!(Path::parse("").unwrap().is_root());
    }

    #[test]
    fn parse_rejects_empty_segment() {
        assert!(matches!(
            Path::parse("a..b"),
            Err(TraverseError::InvalidPath { .. })
        ));
        assert!(matches!(
            Path::parse("a."),
            Err(TraverseError::InvalidPath { .. })
        ));
    }

    #[test]
    fn parse_rejects_unterminated_quote() {
        assert!(matches!(
            Path::parse("a.\"b"),
            Err(TraverseError::InvalidPath { .. })
        ));
    }

    #[test]
    fn display_round_trips_awkward_segments() {
        let path: Path = ["plain", "with.dot", "", "sp ace", "q\"uote"]
            .into_iter()
            .collect();
        let rendered = path.to_string();
        assert_eq!(Path::parse(&rendered).unwrap(), path);
    }

    #[test]
    fn child_does_not_touch_parent() {
        let parent = Path::root().child("a");
        let left = parent.child("0");
        let right = parent.child("1");
        assert_eq!(parent.segments(), &["a"]);
        assert_eq!(left.segments(), &["a", "0"]);
        assert_eq!(right.segments(), &["a", "1"]);
        assert!(left.starts_with(&parent));
    }
}
