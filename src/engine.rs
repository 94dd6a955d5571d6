//! Copy-on-traverse engine.
//!
//! [`traverse`] walks a [`Value`] depth-first and builds an independent copy
//! bottom-up. Each child's directive is applied to the copy as soon as the
//! child's subtree has been copied; the node's own directive is handed back to
//! its parent, which owns the slot the node lives in.
//!
//! The original is only ever borrowed. A failed traversal still returns the
//! copy built so far: finished siblings carry their edits, unvisited siblings
//! are copied verbatim.

use crate::errors::TraverseError;
use crate::op::{Directive, Visit};
use crate::path::Path;
use crate::value::{Dynamic, Field, Map, Record, Reference, Value};
use crate::visitor::Visitor;
use tracing::{debug, trace, warn};

/// Outcome of [`traverse`].
///
/// `value` is `None` only when the root itself was deleted. When `error` is
/// set the copy is structurally complete but must not be trusted.
#[derive(Debug)]
#[must_use = "the copy and any error are only available from the Traversal"]
pub struct Traversal {
    pub value: Option<Value>,
    pub error: Option<TraverseError>,
}

impl Traversal {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Option<Value>, TraverseError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.value),
        }
    }
}

/// Walk `root`, calling `visitor` at every node, and return the edited copy.
///
/// An absent root (a reference or wrapper with nothing behind it) is copied
/// without invoking any hook.
pub fn traverse<V: Visitor + ?Sized>(root: &Value, visitor: &mut V) -> Traversal {
    let mut walker = Walker {
        visitor,
        error: None,
    };
    let path = Path::root();
    let step = walker.walk(root, &path);
    let value = walker.place_keyed(step, Slot::Root, &path);
    Traversal {
        value,
        error: walker.error,
    }
}

/// A node's finished copy plus the directive its parent must apply.
struct Step {
    copy: Value,
    directive: Directive,
}

impl Step {
    fn keep(copy: Value) -> Self {
        Self {
            copy,
            directive: Directive::Keep,
        }
    }

    /// Re-apply an indirection around the copy and around any replacement.
    fn rewrap(self, wrap: impl Fn(Value) -> Value) -> Self {
        let directive = match self.directive {
            Directive::Replace(value) => Directive::Replace(wrap(value)),
            other => other,
        };
        Self {
            copy: wrap(self.copy),
            directive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Element,
    Entry,
    Field,
    Root,
}

impl Slot {
    fn name(self) -> &'static str {
        match self {
            Slot::Element => "list element",
            Slot::Entry => "map entry",
            Slot::Field => "record field",
            Slot::Root => "root",
        }
    }
}

/// What ends up in a parent's slot once a directive has been applied.
enum Placement {
    One(Value),
    Many(Vec<Value>),
    Nothing,
}

struct Walker<'v, V: ?Sized> {
    visitor: &'v mut V,
    error: Option<TraverseError>,
}

impl<V: Visitor + ?Sized> Walker<'_, V> {
    fn failed(&self) -> bool {
        self.error.is_some()
    }

    fn fail(&mut self, err: TraverseError) {
        if self.error.is_none() {
            debug!(error = %err, "traversal aborted");
            self.error = Some(err);
        }
    }

    /// Accept gate for every non-root node.
    fn walk_child(&mut self, node: &Value, path: &Path) -> Step {
        match self.visitor.accept(path, node) {
            Directive::Keep => {}
            Directive::SkipSubtree => {
                trace!(path = %path, "subtree skipped");
                return Step::keep(node.clone());
            }
            other => {
                warn!(path = %path, directive = other.name(), "accept may only keep or skip; keeping");
            }
        }
        self.walk(node, path)
    }

    fn walk(&mut self, node: &Value, path: &Path) -> Step {
        match node {
            Value::Ref(Reference { target: None }) | Value::Dyn(Dynamic { held: None, .. }) => {
                Step::keep(node.clone())
            }
            Value::Ref(Reference {
                target: Some(target),
            }) => self
                .walk(target, path)
                .rewrap(|value| Value::Ref(Reference::to(value))),
            Value::Dyn(Dynamic {
                type_name,
                held: Some(held),
            }) => self
                .walk(held, path)
                .rewrap(|value| Value::Dyn(Dynamic::new(type_name.clone(), value))),
            Value::Map(map) => self.walk_map(node, map, path),
            Value::List(items) => self.walk_list(node, items, path),
            Value::Record(record) => self.walk_record(node, record, path),
            Value::Scalar(_) => self.visit(node, node.clone(), path),
        }
    }

    fn walk_map(&mut self, node: &Value, map: &Map, path: &Path) -> Step {
        let mut copy = Map::new();
        let mut entries = map.iter();
        while let Some((key, value)) = entries.next() {
            let segment = key.to_string();
            self.visitor.enter_collection(path, &segment, value);
            let child_path = path.child(segment);
            let step = self.walk_child(value, &child_path);
            if let Some(value) = self.place_keyed(step, Slot::Entry, &child_path) {
                copy.insert(key.clone(), value);
            }
            if self.failed() {
                copy.extend(entries.map(|(k, v)| (k.clone(), v.clone())));
                return Step::keep(Value::Map(copy));
            }
        }
        self.visit(node, Value::Map(copy), path)
    }

    // Paths use `index`, the position in the original list. Edits land at the
    // copy cursor, which is `copy.len()`: deletes leave it in place and
    // splices advance it by the number of inserted values, so it drifts from
    // `index` as soon as the list is reshaped.
    fn walk_list(&mut self, node: &Value, items: &[Value], path: &Path) -> Step {
        let mut copy = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let child_path = path.child(index.to_string());
            let step = self.walk_child(item, &child_path);
            match self.place_element(step, &child_path) {
                Placement::One(value) => copy.push(value),
                Placement::Many(values) => copy.extend(values),
                Placement::Nothing => {}
            }
            if self.failed() {
                copy.extend(items[index + 1..].iter().cloned());
                return Step::keep(Value::List(copy));
            }
        }
        self.visit(node, Value::List(copy), path)
    }

    fn walk_record(&mut self, node: &Value, record: &Record, path: &Path) -> Step {
        let mut fields = Vec::with_capacity(record.fields.len());
        let mut remaining = record.fields.iter();
        while let Some(field) = remaining.next() {
            if !field.mutable {
                fields.push(field.clone());
                continue;
            }
            let child_path = path.child(field.name.clone());
            let step = self.walk_child(&field.value, &child_path);
            let value = self.place_field(step, &field.value, &child_path);
            fields.push(Field {
                name: field.name.clone(),
                value,
                mutable: true,
            });
            if self.failed() {
                fields.extend(remaining.cloned());
                return Step::keep(Value::Record(Record {
                    type_name: record.type_name.clone(),
                    fields,
                }));
            }
        }
        let copy = Value::Record(Record {
            type_name: record.type_name.clone(),
            fields,
        });
        self.visit(node, copy, path)
    }

    fn visit(&mut self, original: &Value, copy: Value, path: &Path) -> Step {
        let Visit { directive, error } = self.visitor.visit(path, original);
        if let Some(err) = error {
            self.fail(TraverseError::Visitor(err));
        }
        Step { copy, directive }
    }

    fn trace_directive(directive: &Directive, slot: Slot, path: &Path) {
        if !directive.is_keep() {
            trace!(path = %path, directive = directive.name(), slot = slot.name(), "applying directive");
        }
    }

    /// Illegal directives leave the transformed copy in place and abort.
    fn reject(&mut self, directive: &Directive, slot: Slot, path: &Path, copy: Value) -> Value {
        self.fail(TraverseError::IllegalDirective {
            directive: directive.name(),
            slot: slot.name(),
            path: path.clone(),
        });
        copy
    }

    /// Resolve a list element's directive into the values that land at the
    /// copy cursor.
    fn place_element(&mut self, step: Step, path: &Path) -> Placement {
        let Step { copy, directive } = step;
        Self::trace_directive(&directive, Slot::Element, path);
        match directive {
            Directive::Keep => Placement::One(copy),
            Directive::Replace(value) => Placement::One(value),
            Directive::Delete => Placement::Nothing,
            Directive::SpliceIn(values) => Placement::Many(values),
            directive @ Directive::SkipSubtree => {
                Placement::One(self.reject(&directive, Slot::Element, path, copy))
            }
        }
    }

    /// Map entries and the root: `None` removes the slot.
    fn place_keyed(&mut self, step: Step, slot: Slot, path: &Path) -> Option<Value> {
        let Step { copy, directive } = step;
        Self::trace_directive(&directive, slot, path);
        match directive {
            Directive::Keep => Some(copy),
            Directive::Replace(value) => Some(value),
            Directive::Delete => None,
            directive @ (Directive::SpliceIn(_) | Directive::SkipSubtree) => {
                Some(self.reject(&directive, slot, path, copy))
            }
        }
    }

    /// Record fields cannot be removed, so a delete resets them.
    fn place_field(&mut self, step: Step, original: &Value, path: &Path) -> Value {
        let Step { copy, directive } = step;
        Self::trace_directive(&directive, Slot::Field, path);
        match directive {
            Directive::Keep => copy,
            Directive::Replace(value) => value,
            Directive::Delete => original.zero_like(),
            directive @ (Directive::SpliceIn(_) | Directive::SkipSubtree) => {
                self.reject(&directive, Slot::Field, path, copy)
            }
        }
    }
}
