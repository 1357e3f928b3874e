//! Propositions: finite trees of facts evaluated at a single trace position.

use super::fact::{Fact, GroundFact};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A propositional combination of facts, evaluated at one trace position.
///
/// `Conjunction`/`Disjunction` are variadic with arity >= 2 by
/// construction (`first`, `second`, `rest`); smart constructors flatten
/// nested connectives of the same kind so structural hashing stays
/// stable across equivalent trees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Proposition {
    True,
    False,
    Assert(Fact),
    Conjunction(Box<Proposition>, Box<Proposition>, Vec<Proposition>),
    Disjunction(Box<Proposition>, Box<Proposition>, Vec<Proposition>),
}

impl Proposition {
    pub fn assert(f: Fact) -> Self {
        Proposition::Assert(f)
    }

    pub fn fact(g: GroundFact) -> Self {
        Proposition::Assert(Fact::Pos(g))
    }

    /// Build a (possibly flattened) conjunction from >= 2 operands.
    pub fn and(operands: Vec<Proposition>) -> Self {
        build_variadic(operands, Proposition::True, |a, b, rest| {
            Proposition::Conjunction(Box::new(a), Box::new(b), rest)
        }, |p| match p {
            Proposition::Conjunction(a, b, rest) => Ok(flatten(*a, *b, rest)),
            other => Err(other),
        })
    }

    /// Build a (possibly flattened) disjunction from >= 2 operands.
    pub fn or(operands: Vec<Proposition>) -> Self {
        build_variadic(operands, Proposition::False, |a, b, rest| {
            Proposition::Disjunction(Box::new(a), Box::new(b), rest)
        }, |p| match p {
            Proposition::Disjunction(a, b, rest) => Ok(flatten(*a, *b, rest)),
            other => Err(other),
        })
    }

    /// Negation normal form negation: pushes through connectives,
    /// collapses double negation on facts. Size-linear in `self`.
    pub fn not(&self) -> Proposition {
        match self {
            Proposition::True => Proposition::False,
            Proposition::False => Proposition::True,
            Proposition::Assert(f) => Proposition::Assert(f.negate()),
            Proposition::Conjunction(a, b, rest) => Proposition::or(
                std::iter::once(a.not())
                    .chain(std::iter::once(b.not()))
                    .chain(rest.iter().map(Proposition::not))
                    .collect(),
            ),
            Proposition::Disjunction(a, b, rest) => Proposition::and(
                std::iter::once(a.not())
                    .chain(std::iter::once(b.not()))
                    .chain(rest.iter().map(Proposition::not))
                    .collect(),
            ),
        }
    }

    /// Inductive propositional evaluation against a fact set.
    /// Short-circuits on `Conjunction`/`Disjunction`.
    pub fn eval(&self, facts: &HashSet<GroundFact>) -> bool {
        match self {
            Proposition::True => true,
            Proposition::False => false,
            Proposition::Assert(f) => f.holds(facts),
            Proposition::Conjunction(a, b, rest) => {
                a.eval(facts) && b.eval(facts) && rest.iter().all(|p| p.eval(facts))
            }
            Proposition::Disjunction(a, b, rest) => {
                a.eval(facts) || b.eval(facts) || rest.iter().any(|p| p.eval(facts))
            }
        }
    }

    /// Structural size, used by the size-linear-negation property test.
    pub fn size(&self) -> usize {
        match self {
            Proposition::True | Proposition::False => 1,
            Proposition::Assert(_) => 1,
            Proposition::Conjunction(a, b, rest) | Proposition::Disjunction(a, b, rest) => {
                1 + a.size() + b.size() + rest.iter().map(Proposition::size).sum::<usize>()
            }
        }
    }
}

/// Shared helper for `and`/`or`: folds a list of >= 2 operands into a
/// variadic connective, flattening same-kind children and collapsing the
/// connective's own identity element (`True` for `and`, `False` for `or`)
/// when it appears redundantly among operands.
fn build_variadic(
    operands: Vec<Proposition>,
    identity: Proposition,
    make: impl Fn(Proposition, Proposition, Vec<Proposition>) -> Proposition,
    unwrap_same_kind: impl Fn(Proposition) -> Result<Vec<Proposition>, Proposition>,
) -> Proposition {
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
    // The loop above discards identity-valued operands; if everything was
    // the identity, keep one so the connective is still well-formed.
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

fn flatten(a: Proposition, b: Proposition, rest: Vec<Proposition>) -> Vec<Proposition> {
    std::iter::once(a).chain(std::iter::once(b)).chain(rest).collect()
}

impl fmt::Display for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Proposition::True => write!(f, "true"),
            Proposition::False => write!(f, "false"),
            Proposition::Assert(fact) => write!(f, "{fact}"),
            Proposition::Conjunction(a, b, rest) => {
                write!(f, "({a} & {b}")?;
                for p in rest {
                    write!(f, " & {p}")?;
                }
                write!(f, ")")
            }
            Proposition::Disjunction(a, b, rest) => {
                write!(f, "({a} | {b}")?;
                for p in rest {
                    write!(f, " | {p}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::fact::AttrValue;

    fn fact(name: &str) -> GroundFact {
        GroundFact::new(name, vec![AttrValue::Str(name.to_string())])
    }

    #[test]
    fn not_is_involutive_on_atoms() {
        let p = Proposition::fact(fact("A"));
        assert_eq!(p.not().not(), p);
    }

    #[test]
    fn not_pushes_through_conjunction() {
        let p = Proposition::and(vec![
            Proposition::fact(fact("A")),
            Proposition::fact(fact("B")),
        ]);
        let expected = Proposition::or(vec![
            Proposition::fact(fact("A")).not(),
            Proposition::fact(fact("B")).not(),
        ]);
        assert_eq!(p.not(), expected);
    }

    #[test]
    fn and_flattens_nested_conjunctions() {
        let inner = Proposition::and(vec![
            Proposition::fact(fact("A")),
            Proposition::fact(fact("B")),
        ]);
        let outer = Proposition::and(vec![inner, Proposition::fact(fact("C"))]);
        match outer {
            Proposition::Conjunction(_, _, rest) => assert_eq!(rest.len(), 1),
            _ => panic!("expected conjunction"),
        }
    }

    #[test]
    fn eval_short_circuits_on_facts() {
        let mut facts = HashSet::new();
        facts.insert(fact("A"));
        let p = Proposition::and(vec![
            Proposition::fact(fact("A")),
            Proposition::fact(fact("B")),
        ]);
        assert!(!p.eval(&facts));
    }
}
