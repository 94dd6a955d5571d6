//! Callback contract between the engine and its caller.
//!
//! Every hook has an identity default, so a visitor only overrides what it
//! needs. Node handles are borrowed for the duration of one call and cannot be
//! retained.

use crate::op::{Directive, Visit};
use crate::path::Path;
use crate::value::Value;

pub trait Visitor {
    /// Called before descending into any non-root node, pre-order.
    ///
    /// Returning [`Directive::SkipSubtree`] copies the subtree verbatim and
    /// suppresses every hook for it. Anything other than `Keep` or
    /// `SkipSubtree` is treated as `Keep`.
    fn accept(&mut self, _path: &Path, _node: &Value) -> Directive {
        Directive::Keep
    }

    /// Called once per map entry, before recursing into the entry's value.
    ///
    /// `path` is the map's path, not the entry's.
    fn enter_collection(&mut self, _path: &Path, _key: &str, _node: &Value) {}

    /// Called once per node, post-order, with the original (unmodified) node.
    fn visit(&mut self, _path: &Path, _node: &Value) -> Visit {
        Visit::keep()
    }
}

impl<V: Visitor + ?Sized> Visitor for &mut V {
    fn accept(&mut self, path: &Path, node: &Value) -> Directive {
        (**self).accept(path, node)
    }

    fn enter_collection(&mut self, path: &Path, key: &str, node: &Value) {
        (**self).enter_collection(path, key, node);
    }

    fn visit(&mut self, path: &Path, node: &Value) -> Visit {
        (**self).visit(path, node)
    }
}

type AcceptFn<'a> = Box<dyn FnMut(&Path, &Value) -> Directive + 'a>;
type EnterFn<'a> = Box<dyn FnMut(&Path, &str, &Value) + 'a>;
type VisitFn<'a> = Box<dyn FnMut(&Path, &Value) -> Visit + 'a>;

/// A visitor assembled from optional closures.
///
/// ```
/// use traverser::{traverse, Hooks, Value, Visit};
///
/// let data = Value::map([("password", Value::str("hunter2"))]);
/// let mut hooks = Hooks::new().on_visit(|path, _node| {
///     if path.last() == Some("password") {
///         Visit::replace(Value::str("***"))
///     } else {
///         Visit::keep()
///     }
/// });
/// let copy = traverse(&data, &mut hooks).into_result().unwrap();
/// assert_eq!(copy, Some(Value::map([("password", Value::str("***"))])));
/// ```
#[derive(Default)]
pub struct Hooks<'a> {
    accept: Option<AcceptFn<'a>>,
    enter: Option<EnterFn<'a>>,
    visit: Option<VisitFn<'a>>,
}

impl<'a> Hooks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_accept(mut self, f: impl FnMut(&Path, &Value) -> Directive + 'a) -> Self {
        self.accept = Some(Box::new(f));
        self
    }

    pub fn on_enter_collection(mut self, f: impl FnMut(&Path, &str, &Value) + 'a) -> Self {
        self.enter = Some(Box::new(f));
        self
    }

    pub fn on_visit(mut self, f: impl FnMut(&Path, &Value) -> Visit + 'a) -> Self {
        self.visit = Some(Box::new(f));
        self
    }
}

impl Visitor for Hooks<'_> {
    fn accept(&mut self, path: &Path, node: &Value) -> Directive {
        match self.accept.as_mut() {
            Some(f) => f(path, node),
            None => Directive::Keep,
        }
    }

    fn enter_collection(&mut self, path: &Path, key: &str, node: &Value) {
        if let Some(f) = self.enter.as_mut() {
            f(path, key, node);
        }
    }

    fn visit(&mut self, path: &Path, node: &Value) -> Visit {
        match self.visit.as_mut() {
            Some(f) => f(path, node),
            None => Visit::keep(),
        }
    }
}

impl std::fmt::Debug for Hooks<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("accept", &self.accept.is_some())
            .field("enter_collection", &self.enter.is_some())
            .field("visit", &self.visit.is_some())
            .finish()
    }
}
