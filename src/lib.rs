//! Traverser: copy-on-traverse editing of structured values
//!
//! Walks a tree of maps, lists, records, references and dynamic wrappers,
//! calls a [`Visitor`] at every node, and builds an edited copy. The input
//! is only ever borrowed.
//!
//! # Architecture
//!
//! Every edit compiles down to a [`Directive`] returned for one node:
//! keep, replace, delete, splice into the parent list, or skip the subtree.
//! The engine applies a child's directive to its parent's copy as soon as
//! the child has been copied, so a directive only ever touches the slot the
//! node lives in.
//!
//! # Guarantees
//!
//! - The original value is never modified
//! - `visit` sees every node exactly once, children before parents
//! - List edits are addressed by original index, whatever earlier
//!   siblings did to the copy
//! - The first error aborts the walk; the partial copy is still returned
//!
//! # Example
//!
//! ```
//! use traverser::{traverse, Hooks, Value, Visit};
//!
//! let data = Value::map([("a", Value::int(1)), ("b", Value::int(2))]);
//! let mut hooks = Hooks::new().on_visit(|path, _node| match path.last() {
//!     Some("a") => Visit::delete(),
//!     _ => Visit::keep(),
//! });
//!
//! let copy = traverse(&data, &mut hooks).into_result().unwrap().unwrap();
//! assert_eq!(copy, Value::map([("b", Value::int(2))]));
//! ```

pub mod access;
pub mod document;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod op;
pub mod path;
pub mod rules;
pub mod value;
pub mod visitor;

// Re-exports
pub use access::{get_at_path, get_at_path_mut, set_at_path};
pub use engine::{traverse, Traversal};
pub use errors::{BoxError, TraverseError};
pub use op::{Directive, Visit};
pub use path::Path;
pub use rules::{apply_rules, load_from_path, load_from_str, RuleSet, ScrubOutcome};
pub use value::{Dynamic, Field, Key, Map, Record, Reference, Scalar, ShapeKind, Value};
pub use visitor::{Hooks, Visitor};
