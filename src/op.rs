//! Mutation directives returned by visitor hooks.

use crate::errors::BoxError;
use crate::value::Value;
use std::fmt;

/// What to do with the node currently being visited.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Directive {
    /// Leave the (transformed) copy as is.
    #[default]
    Keep,
    /// Put this value in the node's slot instead.
    Replace(Value),
    /// Remove the node's slot. Record fields are reset to their zero value.
    Delete,
    /// Replace one list element with zero or more elements.
    SpliceIn(Vec<Value>),
    /// Only meaningful from [`Visitor::accept`](crate::Visitor::accept):
    /// copy the subtree verbatim without visiting it.
    SkipSubtree,
}

impl Directive {
    pub fn name(&self) -> &'static str {
        match self {
            Directive::Keep => "keep",
            Directive::Replace(_) => "replace",
            Directive::Delete => "delete",
            Directive::SpliceIn(_) => "splice-in",
            Directive::SkipSubtree => "skip-subtree",
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Directive::Keep)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of [`Visitor::visit`](crate::Visitor::visit): a directive and an
/// optional error.
///
/// Both may be present. The directive is applied to the copy first, then the
/// error aborts the traversal.
#[derive(Debug, Default)]
#[must_use = "a Visit does nothing unless returned to the engine"]
pub struct Visit {
    pub directive: Directive,
    pub error: Option<BoxError>,
}

impl Visit {
    pub fn keep() -> Self {
        Self::default()
    }

    pub fn replace(value: Value) -> Self {
        Directive::Replace(value).into()
    }

    pub fn delete() -> Self {
        Directive::Delete.into()
    }

    pub fn splice(values: Vec<Value>) -> Self {
        Directive::SpliceIn(values).into()
    }

    /// Abort without changing the node.
    pub fn fail(err: impl Into<BoxError>) -> Self {
        Self {
            directive: Directive::Keep,
            error: Some(err.into()),
        }
    }

    /// Attach an error to this visit; the directive is still applied.
    pub fn with_error(mut self, err: impl Into<BoxError>) -> Self {
        self.error = Some(err.into());
        self
    }
}

impl From<Directive> for Visit {
    fn from(directive: Directive) -> Self {
        Self {
            directive,
            error: None,
        }
    }
}

impl<E: Into<BoxError>> From<Result<Directive, E>> for Visit {
    fn from(result: Result<Directive, E>) -> Self {
        match result {
            Ok(directive) => directive.into(),
            Err(err) => Visit::fail(err),
        }
    }
}
