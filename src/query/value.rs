//! The monitor's output lattice.

use super::formula::Query;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Either a committed verdict or a pending residual obligation.
///
/// Ordering: `Stable(false) < any Unstable < Stable(true)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryValue {
    Stable(bool),
    Unstable(Query),
}

impl QueryValue {
    pub fn is_stable(&self) -> bool {
        matches!(self, QueryValue::Stable(_))
    }

    pub fn as_stable(&self) -> Option<bool> {
        match self {
            QueryValue::Stable(b) => Some(*b),
            QueryValue::Unstable(_) => None,
        }
    }

    /// `complement(Stable(b)) = Stable(!b)`; `complement(Unstable(q)) = Unstable(not(q))`.
    pub fn complement(&self) -> QueryValue {
        match self {
            QueryValue::Stable(b) => QueryValue::Stable(!b),
            QueryValue::Unstable(q) => QueryValue::Unstable(q.not()),
        }
    }
}

/// Lattice meet (`/\`, conjunction) over `QueryValue`:
///
/// | inputs                          | meet                |
/// |----------------------------------|---------------------|
/// | `Stable(a), Stable(b)`           | `Stable(a && b)`     |
/// | `Unstable(x), Unstable(y)`       | `Unstable(And(x,y))` |
/// | `Stable(true), Unstable(y)`      | `Unstable(y)`        |
/// | `Stable(false), Unstable(y)`     | `Stable(false)`      |
///
/// Defined symmetrically in the argument order: a `(Stable(b), Unstable(y))`
/// pair yields the same result regardless of which side holds which.
pub fn meet(a: QueryValue, b: QueryValue) -> QueryValue {
    use QueryValue::*;
    match (a, b) {
        (Stable(a), Stable(b)) => Stable(a && b),
        (Unstable(x), Unstable(y)) => Unstable(Query::and(vec![x, y])),
        (Stable(true), Unstable(y)) | (Unstable(y), Stable(true)) => Unstable(y),
        (Stable(false), Unstable(_)) | (Unstable(_), Stable(false)) => Stable(false),
    }
}

/// Lattice join (`\/`, disjunction) over `QueryValue`, the dual table:
///
/// | inputs                          | join                |
/// |----------------------------------|---------------------|
/// | `Stable(a), Stable(b)`           | `Stable(a || b)`     |
/// | `Unstable(x), Unstable(y)`       | `Unstable(Or(x,y))`  |
/// | `Stable(true), Unstable(y)`      | `Stable(true)`       |
/// | `Stable(false), Unstable(y)`     | `Unstable(y)`        |
pub fn join(a: QueryValue, b: QueryValue) -> QueryValue {
    use QueryValue::*;
    match (a, b) {
        (Stable(a), Stable(b)) => Stable(a || b),
        (Unstable(x), Unstable(y)) => Unstable(Query::or(vec![x, y])),
        (Stable(true), Unstable(_)) | (Unstable(_), Stable(true)) => Stable(true),
        (Stable(false), Unstable(y)) | (Unstable(y), Stable(false)) => Unstable(y),
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Stable(b) => write!(f, "stable({b})"),
            QueryValue::Unstable(q) => write!(f, "unstable({q})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::fact::{AttrValue, GroundFact};
    use crate::query::formula::Query;
    use crate::query::proposition::Proposition;

    fn fact_query(name: &str) -> Query {
        Query::formula(Proposition::fact(GroundFact::new(
            name,
            vec![AttrValue::Str(name.into())],
        )))
    }

    #[test]
    fn meet_join_on_stable_values() {
        assert_eq!(meet(QueryValue::Stable(true), QueryValue::Stable(false)), QueryValue::Stable(false));
        assert_eq!(join(QueryValue::Stable(true), QueryValue::Stable(false)), QueryValue::Stable(true));
    }

    #[test]
    fn meet_absorbs_stable_false() {
        let u = QueryValue::Unstable(fact_query("A"));
        assert_eq!(meet(QueryValue::Stable(false), u.clone()), QueryValue::Stable(false));
        assert_eq!(meet(u, QueryValue::Stable(false)), QueryValue::Stable(false));
    }

    #[test]
    fn join_absorbs_stable_true() {
        let u = QueryValue::Unstable(fact_query("A"));
        assert_eq!(join(QueryValue::Stable(true), u.clone()), QueryValue::Stable(true));
        assert_eq!(join(u, QueryValue::Stable(true)), QueryValue::Stable(true));
    }

    #[test]
    fn complement_is_involutive() {
        let v = QueryValue::Unstable(fact_query("A"));
        assert_eq!(v.complement().complement(), v);
        let s = QueryValue::Stable(true);
        assert_eq!(s.complement().complement(), s);
    }

    #[test]
    fn meet_join_are_idempotent_on_stable() {
        let s = QueryValue::Stable(true);
        assert_eq!(meet(s.clone(), s.clone()), s);
        assert_eq!(join(s.clone(), s.clone()), s);
    }
}
