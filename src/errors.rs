use crate::path::Path;
use crate::value::ShapeKind;
use thiserror::Error;

/// Opaque error produced by a visitor hook.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum TraverseError {
    #[error("can't traverse {kind} at {}", describe(.path))]
    NotTraversable { kind: ShapeKind, path: Path },

    #[error("key does not exist: {key}{}{}", beyond(.path), hint(.suggestion))]
    KeyNotFound {
        /// Prefix that was successfully traversed before the miss.
        path: Path,
        key: String,
        suggestion: Option<String>,
    },

    #[error("{directive} is not allowed on a {slot} at {}", describe(.path))]
    IllegalDirective {
        directive: &'static str,
        slot: &'static str,
        path: Path,
    },

    #[error("invalid path '{input}': {message}")]
    InvalidPath { input: String, message: String },

    /// Returned unchanged from a visitor hook.
    #[error(transparent)]
    Visitor(BoxError),
}

impl TraverseError {
    pub fn visitor(err: impl Into<BoxError>) -> Self {
        TraverseError::Visitor(err.into())
    }

    /// The visitor's own error, if this is one and it has type `E`.
    pub fn downcast_visitor<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            TraverseError::Visitor(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}

fn describe(path: &Path) -> String {
    if path.is_root() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}

fn beyond(path: &Path) -> String {
    if path.is_root() {
        String::new()
    } else {
        format!(" beyond {path}")
    }
}

fn hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(candidate) => format!(" (did you mean '{candidate}'?)"),
        None => String::new(),
    }
}
