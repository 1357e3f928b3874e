//! The one-step semantic unwinding of an LDLf query against a set of
//! ground facts holding at the current trace position.
//!
//! `evaluate` is pure and total: no I/O, no allocation beyond building the
//! residual `Query` returned inside an `Unstable` value. It is implemented
//! as direct structural recursion over the query/path tree rather than by
//! rebuilding and re-evaluating `And`/`Or` query trees for
//! `Choice`/`Sequence`/`Repeat`, which keeps recursion depth tied to
//! path/query size instead of doubling allocations at every
//! `Choice`/`Sequence` node.

use crate::query::{join, meet, Fact, GroundFact, Path, Proposition, Query, QueryValue};
use std::collections::HashSet;

/// Evaluate `q` one step, given the ground facts holding now and whether
/// this is the final trace position.
pub fn evaluate(q: &Query, facts: &HashSet<GroundFact>, last: bool) -> QueryValue {
    match q {
        Query::Formula(p) => QueryValue::Stable(p.eval(facts)),
        Query::TT => QueryValue::Stable(true),
        Query::FF => QueryValue::Stable(false),
        Query::And(a, b, rest) => {
            fold_connective(a, b, rest, facts, last, QueryValue::Stable(true), meet)
        }
        Query::Or(a, b, rest) => {
            fold_connective(a, b, rest, facts, last, QueryValue::Stable(false), join)
        }
        Query::Exists(path, cont) => eval_exists(path, cont, facts, last),
        Query::All(path, cont) => eval_all(path, cont, facts, last),
    }
}

fn fold_connective(
    a: &Query,
    b: &Query,
    rest: &[Query],
    facts: &HashSet<GroundFact>,
    last: bool,
    identity: QueryValue,
    combine: impl Fn(QueryValue, QueryValue) -> QueryValue,
) -> QueryValue {
    std::iter::once(a)
        .chain(std::iter::once(b))
        .chain(rest.iter())
        .map(|q| evaluate(q, facts, last))
        .fold(identity, combine)
}

/// Propositional truth at a position, delegating to [`Proposition::eval`].
pub fn eval_prop(p: &Proposition, facts: &HashSet<GroundFact>) -> bool {
    p.eval(facts)
}

/// Evaluate `Exists(path, cont)`. `cont` is the continuation query that
/// must hold once `path` has matched a (possibly empty) prefix.
fn eval_exists(path: &Path, cont: &Query, facts: &HashSet<GroundFact>, last: bool) -> QueryValue {
    match path {
        Path::AssertFact(p) => {
            if last {
                QueryValue::Stable(false)
            } else if p.eval(facts) {
                QueryValue::Unstable(cont.clone())
            } else {
                QueryValue::Stable(false)
            }
        }
        Path::Test(q1) => meet(evaluate(q1, facts, last), evaluate(cont, facts, last)),
        Path::Choice(a, b, rest) => std::iter::once(a.as_ref())
            .chain(std::iter::once(b.as_ref()))
            .chain(rest.iter())
            .map(|p| eval_exists(p, cont, facts, last))
            .fold(QueryValue::Stable(false), join),
        Path::Sequence(a, b, rest) => {
            let inner = sequence_continuation(b, rest, cont, Query::exists);
            eval_exists(a, &inner, facts, last)
        }
        Path::Repeat(p) => {
            if p.test_only() {
                evaluate(cont, facts, last)
            } else {
                let inner = Query::exists(Path::repeat((**p).clone()), cont.clone());
                join(evaluate(cont, facts, last), eval_exists(p, &inner, facts, last))
            }
        }
    }
}

/// Evaluate `All(path, cont)`, the dual of `eval_exists`: `AssertFact` at
/// the last position yields `Stable(true)` instead of `Stable(false)`,
/// `Choice`/`Sequence`/`Repeat` fold with `meet` instead of `join`, and
/// `Test` asserts `not(q1)` rather than `q1`.
fn eval_all(path: &Path, cont: &Query, facts: &HashSet<GroundFact>, last: bool) -> QueryValue {
    match path {
        Path::AssertFact(p) => {
            if last {
                QueryValue::Stable(true)
            } else if p.eval(facts) {
                QueryValue::Unstable(cont.clone())
            } else {
                QueryValue::Stable(true)
            }
        }
        Path::Test(q1) => join(evaluate(&q1.not(), facts, last), evaluate(cont, facts, last)),
        Path::Choice(a, b, rest) => std::iter::once(a.as_ref())
            .chain(std::iter::once(b.as_ref()))
            .chain(rest.iter())
            .map(|p| eval_all(p, cont, facts, last))
            .fold(QueryValue::Stable(true), meet),
        Path::Sequence(a, b, rest) => {
            let inner = sequence_continuation(b, rest, cont, Query::all);
            eval_all(a, &inner, facts, last)
        }
        Path::Repeat(p) => {
            if p.test_only() {
                evaluate(cont, facts, last)
            } else {
                let inner = Query::all(Path::repeat((**p).clone()), cont.clone());
                meet(evaluate(cont, facts, last), eval_all(p, &inner, facts, last))
            }
        }
    }
}

/// Build the continuation query for the tail `[b, ...rest]` of a
/// `Sequence`, wrapped by the given modality constructor (`Query::exists`
/// or `Query::all`), i.e. `Exists(Sequence(b,...rest), cont)` collapsed to
/// `Exists(b, cont)` when the tail has exactly one element.
pub(crate) fn sequence_continuation(
    b: &Path,
    rest: &[Path],
    cont: &Query,
    modality: impl Fn(Path, Query) -> Query,
) -> Query {
    if rest.is_empty() {
        modality(b.clone(), cont.clone())
    } else {
        let tail = std::iter::once(b.clone()).chain(rest.iter().cloned()).collect();
        modality(Path::sequence(tail), cont.clone())
    }
}
