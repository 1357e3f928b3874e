//! Paths: regular expressions over propositions and inline query tests.

use super::formula::Query;
use super::proposition::Proposition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A regular expression over trace steps (`AssertFact`) and zero-length
/// tests (`Test`). `Choice`/`Sequence` are variadic with arity >= 2, built
/// through the same flatten-on-construction discipline as
/// [`crate::query::proposition::Proposition::and`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Path {
    AssertFact(Proposition),
    Test(Box<Query>),
    Choice(Box<Path>, Box<Path>, Vec<Path>),
    Sequence(Box<Path>, Box<Path>, Vec<Path>),
    Repeat(Box<Path>),
}

impl Path {
    pub fn assert(p: Proposition) -> Self {
        Path::AssertFact(p)
    }

    pub fn test(q: Query) -> Self {
        Path::Test(Box::new(q))
    }

    pub fn choice(operands: Vec<Path>) -> Self {
        build_variadic(operands, |a, b, rest| {
            Path::Choice(Box::new(a), Box::new(b), rest)
        }, |p| match p {
            Path::Choice(a, b, rest) => Ok(flatten(*a, *b, rest)),
            other => Err(other),
        })
    }

    pub fn sequence(operands: Vec<Path>) -> Self {
        build_variadic(operands, |a, b, rest| {
            Path::Sequence(Box::new(a), Box::new(b), rest)
        }, |p| match p {
            Path::Sequence(a, b, rest) => Ok(flatten(*a, *b, rest)),
            other => Err(other),
        })
    }

    pub fn repeat(p: Path) -> Self {
        Path::Repeat(Box::new(p))
    }

    /// True iff this path contains no `AssertFact` — i.e. it consumes no
    /// trace steps and is built only from `Test`/`Choice`/`Sequence`/
    /// `Repeat`. Used by the evaluator to short-circuit `Repeat`
    /// unwinding: a test-only loop body needs exactly one fixed-point
    /// iteration.
    pub fn test_only(&self) -> bool {
        match self {
            Path::AssertFact(_) => false,
            Path::Test(_) => true,
            Path::Choice(a, b, rest) | Path::Sequence(a, b, rest) => {
                a.test_only() && b.test_only() && rest.iter().all(Path::test_only)
            }
            Path::Repeat(p) => p.test_only(),
        }
    }
}

fn build_variadic(
    operands: Vec<Path>,
    make: impl Fn(Path, Path, Vec<Path>) -> Path,
    unwrap_same_kind: impl Fn(Path) -> Result<Vec<Path>, Path>,
) -> Path {
    assert!(operands.len() >= 2, "variadic path connective needs >= 2 operands");
    let mut flat = Vec::with_capacity(operands.len());
    for op in operands {
        match unwrap_same_kind(op) {
            Ok(children) => flat.extend(children),
            Err(leaf) => flat.push(leaf),
        }
    }
    let mut iter = flat.into_iter();
    let a = iter.next().expect("checked len >= 2");
    let b = iter.next().expect("checked len >= 2");
    make(a, b, iter.collect())
}

fn flatten(a: Path, b: Path, rest: Vec<Path>) -> Vec<Path> {
    std::iter::once(a).chain(std::iter::once(b)).chain(rest).collect()
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::AssertFact(p) => write!(f, "{p}?"),
            Path::Test(q) => write!(f, "[{q}]"),
            Path::Choice(a, b, rest) => {
                write!(f, "({a} + {b}")?;
                for p in rest {
                    write!(f, " + {p}")?;
                }
                write!(f, ")")
            }
            Path::Sequence(a, b, rest) => {
                write!(f, "({a}; {b}")?;
                for p in rest {
                    write!(f, "; {p}")?;
                }
                write!(f, ")")
            }
            Path::Repeat(p) => write!(f, "({p})*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::fact::{AttrValue, GroundFact};
    use crate::query::formula::Query;

    fn fact_prop(name: &str) -> Proposition {
        Proposition::fact(GroundFact::new(name, vec![AttrValue::Str(name.into())]))
    }

    #[test]
    fn test_only_is_false_when_any_branch_asserts() {
        let p = Path::sequence(vec![
            Path::test(Query::TT),
            Path::assert(fact_prop("A")),
        ]);
        assert!(!p.test_only());
    }

    #[test]
    fn test_only_is_true_for_pure_tests() {
        let p = Path::choice(vec![Path::test(Query::TT), Path::test(Query::FF)]);
        assert!(p.test_only());
    }
}
