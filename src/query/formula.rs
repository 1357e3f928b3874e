//! Queries: linear-time dynamic logic formulas over finite traces.

use super::path::Path;
use super::proposition::Proposition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An LDLf formula. `And`/`Or` are variadic with arity >= 2, flattened on
/// construction like [`Proposition::and`]/[`Proposition::or`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Query {
    Formula(Proposition),
    TT,
    FF,
    And(Box<Query>, Box<Query>, Vec<Query>),
    Or(Box<Query>, Box<Query>, Vec<Query>),
    Exists(Box<Path>, Box<Query>),
    All(Box<Path>, Box<Query>),
}

impl Query {
    pub fn formula(p: Proposition) -> Self {
        Query::Formula(p)
    }

    pub fn and(operands: Vec<Query>) -> Self {
        build_variadic(operands, Query::TT, |a, b, rest| {
            Query::And(Box::new(a), Box::new(b), rest)
        }, |q| match q {
            Query::And(a, b, rest) => Ok(flatten(*a, *b, rest)),
            other => Err(other),
        })
    }

    pub fn or(operands: Vec<Query>) -> Self {
        build_variadic(operands, Query::FF, |a, b, rest| {
            Query::Or(Box::new(a), Box::new(b), rest)
        }, |q| match q {
            Query::Or(a, b, rest) => Ok(flatten(*a, *b, rest)),
            other => Err(other),
        })
    }

    pub fn exists(path: Path, q: Query) -> Self {
        Query::Exists(Box::new(path), Box::new(q))
    }

    pub fn all(path: Path, q: Query) -> Self {
        Query::All(Box::new(path), Box::new(q))
    }

    /// Negation normal form negation. Dualizes `And`/`Or` and
    /// `Exists`/`All`; pushes through `Formula` via
    /// [`Proposition::not`]. Size-linear in `self`.
    pub fn not(&self) -> Query {
        match self {
            Query::Formula(p) => Query::Formula(p.not()),
            Query::TT => Query::FF,
            Query::FF => Query::TT,
            Query::And(a, b, rest) => Query::or(
                std::iter::once(a.not())
                    .chain(std::iter::once(b.not()))
                    .chain(rest.iter().map(Query::not))
                    .collect(),
            ),
            Query::Or(a, b, rest) => Query::and(
                std::iter::once(a.not())
                    .chain(std::iter::once(b.not()))
                    .chain(rest.iter().map(Query::not))
                    .collect(),
            ),
            Query::Exists(path, q) => Query::all((**path).clone(), q.not()),
            Query::All(path, q) => Query::exists((**path).clone(), q.not()),
        }
    }

    /// Structural size, used by the size-linear-negation property test.
    pub fn size(&self) -> usize {
        match self {
            Query::TT | Query::FF => 1,
            Query::Formula(p) => 1 + p.size(),
            Query::And(a, b, rest) | Query::Or(a, b, rest) => {
                1 + a.size() + b.size() + rest.iter().map(Query::size).sum::<usize>()
            }
            Query::Exists(path, q) | Query::All(path, q) => 1 + path_size(path) + q.size(),
        }
    }
}

fn path_size(p: &Path) -> usize {
    match p {
        Path::AssertFact(prop) => 1 + prop.size(),
        Path::Test(q) => 1 + q.size(),
        Path::Choice(a, b, rest) | Path::Sequence(a, b, rest) => {
            1 + path_size(a) + path_size(b) + rest.iter().map(path_size).sum::<usize>()
        }
        Path::Repeat(p) => 1 + path_size(p),
    }
}

fn build_variadic(
    operands: Vec<Query>,
    identity: Query,
    make: impl Fn(Query, Query, Vec<Query>) -> Query,
    unwrap_same_kind: impl Fn(Query) -> Result<Vec<Query>, Query>,
) -> Query {
    assert!(operands.len() >= 2, "variadic connective needs >= 2 operands");
    let mut flat = Vec::with_capacity(operands.len());
    for op in operands {
        if op == identity {
            continue;
        }
        match unwrap_same_kind(op) {
            Ok(children) => flat.extend(children),
            Err(leaf) => flat.push(leaf),
        }
    }
    if flat.is_empty() {
        return identity;
    }
    if flat.len() == 1 {
        return flat.into_iter().next().expect("checked len == 1");
    }
    let mut iter = flat.into_iter();
    let a = iter.next().expect("checked len >= 2");
    let b = iter.next().expect("checked len >= 2");
    make(a, b, iter.collect())
}

fn flatten(a: Query, b: Query, rest: Vec<Query>) -> Vec<Query> {
    std::iter::once(a).chain(std::iter::once(b)).chain(rest).collect()
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Formula(p) => write!(f, "{p}"),
            Query::TT => write!(f, "tt"),
            Query::FF => write!(f, "ff"),
            Query::And(a, b, rest) => {
                write!(f, "({a} /\\ {b}")?;
                for q in rest {
                    write!(f, " /\\ {q}")?;
                }
                write!(f, ")")
            }
            Query::Or(a, b, rest) => {
                write!(f, "({a} \\/ {b}")?;
                for q in rest {
                    write!(f, " \\/ {q}")?;
                }
                write!(f, ")")
            }
            Query::Exists(path, q) => write!(f, "<{path}>{q}"),
            Query::All(path, q) => write!(f, "[{path}]{q}"),
        }
    }
}

// --- Derived abbreviations -------------------------------------------

/// `end() = All(Test(Formula(True)), FF)` — the trace has ended.
pub fn end() -> Query {
    Query::all(Path::test(Query::formula(Proposition::True)), Query::FF)
}

/// `last() = All(AssertFact(True), end())` — this is the last step.
pub fn last() -> Query {
    Query::all(Path::assert(Proposition::True), end())
}

/// `next(q) = Exists(AssertFact(True), q)`.
pub fn next(q: Query) -> Query {
    Query::exists(Path::assert(Proposition::True), q)
}

/// `diamond(q) = Exists(Repeat(AssertFact(True)), q)`.
pub fn diamond(q: Query) -> Query {
    Query::exists(Path::repeat(Path::assert(Proposition::True)), q)
}

/// `boxed(q) = All(Repeat(AssertFact(True)), q)`.
pub fn boxed(q: Query) -> Query {
    Query::all(Path::repeat(Path::assert(Proposition::True)), q)
}

/// `until(q1, q2) = Exists(Repeat(Sequence(Test(q1), AssertFact(True))), q2)`.
pub fn until(q1: Query, q2: Query) -> Query {
    Query::exists(
        Path::repeat(Path::sequence(vec![
            Path::test(q1),
            Path::assert(Proposition::True),
        ])),
        q2,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::fact::{AttrValue, GroundFact};

    fn fact_query(name: &str) -> Query {
        Query::formula(Proposition::fact(GroundFact::new(
            name,
            vec![AttrValue::Str(name.into())],
        )))
    }

    #[test]
    fn not_is_involutive_on_formula() {
        let q = fact_query("A");
        assert_eq!(q.not().not(), q);
    }

    #[test]
    fn not_dualizes_exists_all() {
        let q = Query::exists(Path::assert(Proposition::True), fact_query("A"));
        let expected = Query::all(Path::assert(Proposition::True), fact_query("A").not());
        assert_eq!(q.not(), expected);
    }

    #[test]
    fn and_flattens_and_drops_identity() {
        let q = Query::and(vec![Query::TT, fact_query("A"), fact_query("B")]);
        match q {
            Query::And(_, _, rest) => assert_eq!(rest.len(), 0),
            other => panic!("expected a 2-ary And, got {other:?}"),
        }
    }

    #[test]
    fn size_is_linear_in_negation() {
        let q = until(fact_query("A"), fact_query("B"));
        let negated = q.not();
        assert!(negated.size() <= 4 * q.size());
    }
}
