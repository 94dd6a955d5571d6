//! Read and write a value by path, following map hops only.
//!
//! References and dynamic wrappers are unwrapped transparently. Lists and
//! records are not traversable here; use [`traverse`](crate::traverse) with a
//! visitor to reach into them.

use crate::errors::TraverseError;
use crate::path::Path;
use crate::value::{Key, Map, Value};

/// Minimum Jaro-Winkler similarity for a key to be offered as a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Return the value at `path`. An empty path returns `root`.
pub fn get_at_path<'a, S: AsRef<str>>(
    root: &'a Value,
    path: &[S],
) -> Result<&'a Value, TraverseError> {
    let mut current = root;
    let mut traversed = Path::root();
    for segment in path {
        let segment = segment.as_ref();
        let map = as_map(current, &traversed)?;
        current = match find_key(map, segment) {
            Some(key) => &map[key],
            None => return Err(key_not_found(map, segment, traversed)),
        };
        traversed = traversed.child(segment);
    }
    Ok(current)
}

/// Mutable counterpart of [`get_at_path`].
pub fn get_at_path_mut<'a, S: AsRef<str>>(
    root: &'a mut Value,
    path: &[S],
) -> Result<&'a mut Value, TraverseError> {
    let mut current = root;
    let mut traversed = Path::root();
    for segment in path {
        let segment = segment.as_ref();
        let map = as_map_mut(current, &traversed)?;
        let Some(key) = find_key(map, segment).cloned() else {
            return Err(key_not_found(map, segment, traversed));
        };
        let Some(value) = map.get_mut(&key) else {
            return Err(TraverseError::KeyNotFound {
                path: traversed,
                key: segment.to_string(),
                suggestion: None,
            });
        };
        current = value;
        traversed = traversed.child(segment);
    }
    Ok(current)
}

/// Set the value at `path`, creating missing intermediate maps.
///
/// The terminal key is overwritten if it already exists. An empty path
/// replaces `root`.
pub fn set_at_path<S: AsRef<str>>(
    root: &mut Value,
    path: &[S],
    value: Value,
) -> Result<(), TraverseError> {
    let Some((last, intermediate)) = path.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut current = root;
    let mut traversed = Path::root();
    for segment in intermediate {
        let segment = segment.as_ref();
        let map = as_map_mut(current, &traversed)?;
        let key = find_key(map, segment)
            .cloned()
            .unwrap_or_else(|| Key::Str(segment.to_string()));
        current = map.entry(key).or_insert_with(Value::empty_map);
        traversed = traversed.child(segment);
    }

    let last = last.as_ref();
    let map = as_map_mut(current, &traversed)?;
    let key = find_key(map, last)
        .cloned()
        .unwrap_or_else(|| Key::Str(last.to_string()));
    map.insert(key, value);
    Ok(())
}

/// Find the key whose canonical string is `segment`, preferring an exact
/// string key over another key type that renders the same way.
fn find_key<'m>(map: &'m Map, segment: &str) -> Option<&'m Key> {
    let exact = Key::Str(segment.to_string());
    if let Some((key, _)) = map.get_key_value(&exact) {
        return Some(key);
    }
    map.keys().find(|key| key.to_string() == segment)
}

fn as_map<'a>(value: &'a Value, traversed: &Path) -> Result<&'a Map, TraverseError> {
    match value.resolve() {
        Some(Value::Map(map)) => Ok(map),
        Some(other) => Err(not_traversable(other, traversed)),
        None => Err(not_traversable(value, traversed)),
    }
}

fn as_map_mut<'a>(value: &'a mut Value, traversed: &Path) -> Result<&'a mut Map, TraverseError> {
    let kind = value.kind();
    match value.resolve_mut() {
        Some(Value::Map(map)) => Ok(map),
        Some(other) => Err(not_traversable(other, traversed)),
        None => Err(TraverseError::NotTraversable {
            kind,
            path: traversed.clone(),
        }),
    }
}

fn not_traversable(value: &Value, traversed: &Path) -> TraverseError {
    TraverseError::NotTraversable {
        kind: match value.resolve() {
            Some(resolved) => resolved.kind(),
            None => crate::value::ShapeKind::Absent,
        },
        path: traversed.clone(),
    }
}

fn key_not_found(map: &Map, segment: &str, traversed: Path) -> TraverseError {
    let suggestion = map
        .keys()
        .map(|key| key.to_string())
        .map(|candidate| (strsim::jaro_winkler(segment, &candidate), candidate))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate);
    TraverseError::KeyNotFound {
        path: traversed,
        key: segment.to_string(),
        suggestion,
    }
}
