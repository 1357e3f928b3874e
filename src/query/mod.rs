//! The abstract syntax of facts, propositions, paths, queries, and
//! query-values, plus the pure functions over them (negation
//! normalization, the derived temporal operators, and the `QueryValue`
//! lattice).
//!
//! Everything in this module is total and synchronous: no I/O, no
//! fallible construction beyond the arity assertions on variadic
//! connectives. Queries and propositions are always kept in negation
//! normal form by construction — `not` is the only way negation enters
//! a tree, and it immediately pushes itself down to the leaves.

pub mod fact;
pub mod formula;
pub mod path;
pub mod proposition;
pub mod value;

pub use fact::{AttrValue, Fact, GroundFact};
pub use formula::{boxed, diamond, end, last, next, until, Query};
pub use path::Path;
pub use proposition::Proposition;
pub use value::{join, meet, QueryValue};
