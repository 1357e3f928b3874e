//! Encodes [`Query`]/[`Proposition`] trees into SMT-LIB2 scripts over
//! nullary uninterpreted (Bool) predicates.
//!
//! `Exists`/`All` over path expressions are unrolled into a finite
//! disjunction/conjunction of per-step encodings, sharing one `fuel`
//! budget across both `AssertFact` step-advances and `Repeat` unwind
//! attempts. Exhausting the budget before the formula bottoms out marks
//! the encoding `exhausted`, which the backend treats as the solver
//! returning "unknown" — not valid, but satisfiable — without spending a
//! subprocess round-trip on it.

use crate::evaluator::sequence_continuation;
use crate::query::{Fact, Path, Proposition, Query};

/// The result of encoding one query: either a full SMT-LIB2 script ready
/// to hand to a solver, or `exhausted`, meaning the configured unrolling
/// bound was hit and the caller should short-circuit to "unknown"
/// without invoking the solver.
pub struct EncodeOutcome {
    pub script: String,
    pub exhausted: bool,
}

struct Ctx {
    declared: std::collections::BTreeSet<String>,
    step: u64,
    exhausted: bool,
}

impl Ctx {
    fn declare(&mut self, name: String) -> String {
        self.declared.insert(name.clone());
        name
    }
}

/// Encode `q` as a satisfiability query: `(check-sat)` on `phi` directly.
pub fn encode_for_satisfiability(q: &Query, bound: usize) -> EncodeOutcome {
    encode(q, bound)
}

/// Encode `q` as a validity query: `(check-sat)` on `not(phi)` — `q` is
/// valid iff that script is UNSAT.
pub fn encode_for_validity(q: &Query, bound: usize) -> EncodeOutcome {
    encode(&q.not(), bound)
}

fn encode(q: &Query, bound: usize) -> EncodeOutcome {
    let mut ctx = Ctx {
        declared: std::collections::BTreeSet::new(),
        step: 0,
        exhausted: false,
    };
    let phi = encode_query(&mut ctx, q, bound);
    let mut script = String::new();
    for name in &ctx.declared {
        script.push_str(&format!("(declare-const {name} Bool)\n"));
    }
    script.push_str(&format!("(assert {phi})\n(check-sat)\n"));
    EncodeOutcome {
        script,
        exhausted: ctx.exhausted,
    }
}

fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn atom_at(ctx: &mut Ctx, predicate_key: &str, step: u64) -> String {
    ctx.declare(format!("p_{}_{}", sanitize(predicate_key), step))
}

fn encode_prop(ctx: &mut Ctx, p: &Proposition) -> String {
    match p {
        Proposition::True => "true".to_string(),
        Proposition::False => "false".to_string(),
        Proposition::Assert(Fact::Pos(g)) => atom_at(ctx, &g.predicate_key(), ctx.step),
        Proposition::Assert(Fact::Neg(g)) => {
            format!("(not {})", atom_at(ctx, &g.predicate_key(), ctx.step))
        }
        Proposition::Conjunction(a, b, rest) => {
            let mut s = format!("(and {} {}", encode_prop(ctx, a), encode_prop(ctx, b));
            for p in rest {
                s.push(' ');
                s.push_str(&encode_prop(ctx, p));
            }
            s.push(')');
            s
        }
        Proposition::Disjunction(a, b, rest) => {
            let mut s = format!("(or {} {}", encode_prop(ctx, a), encode_prop(ctx, b));
            for p in rest {
                s.push(' ');
                s.push_str(&encode_prop(ctx, p));
            }
            s.push(')');
            s
        }
    }
}

fn encode_query(ctx: &mut Ctx, q: &Query, fuel: usize) -> String {
    match q {
        Query::Formula(p) => encode_prop(ctx, p),
        Query::TT => "true".to_string(),
        Query::FF => "false".to_string(),
        Query::And(a, b, rest) => {
            let mut s = format!(
                "(and {} {}",
                encode_query(ctx, a, fuel),
                encode_query(ctx, b, fuel)
            );
            for q in rest {
                s.push(' ');
                s.push_str(&encode_query(ctx, q, fuel));
            }
            s.push(')');
            s
        }
        Query::Or(a, b, rest) => {
            let mut s = format!(
                "(or {} {}",
                encode_query(ctx, a, fuel),
                encode_query(ctx, b, fuel)
            );
            for q in rest {
                s.push(' ');
                s.push_str(&encode_query(ctx, q, fuel));
            }
            s.push(')');
            s
        }
        Query::Exists(path, cont) => encode_exists(ctx, path, cont, fuel),
        Query::All(path, cont) => encode_all(ctx, path, cont, fuel),
    }
}

fn encode_exists(ctx: &mut Ctx, path: &Path, cont: &Query, fuel: usize) -> String {
    match path {
        Path::AssertFact(p) => {
            if fuel == 0 {
                ctx.exhausted = true;
                return "false".to_string();
            }
            let here = encode_prop(ctx, p);
            ctx.step += 1;
            let there = encode_query(ctx, cont, fuel - 1);
            ctx.step -= 1;
            format!("(and {here} {there})")
        }
        Path::Test(q1) => format!(
            "(and {} {})",
            encode_query(ctx, q1, fuel),
            encode_query(ctx, cont, fuel)
        ),
        Path::Choice(a, b, rest) => {
            let mut s = format!(
                "(or {} {}",
                encode_exists(ctx, a, cont, fuel),
                encode_exists(ctx, b, cont, fuel)
            );
            for p in rest {
                s.push(' ');
                s.push_str(&encode_exists(ctx, p, cont, fuel));
            }
            s.push(')');
            s
        }
        Path::Sequence(a, b, rest) => {
            let inner = sequence_continuation(b, rest, cont, Query::exists);
            encode_exists(ctx, a, &inner, fuel)
        }
        Path::Repeat(p) => {
            if p.test_only() {
                return encode_query(ctx, cont, fuel);
            }
            if fuel == 0 {
                ctx.exhausted = true;
                return "false".to_string();
            }
            let zero = encode_query(ctx, cont, fuel);
            let inner = Query::exists(Path::repeat((**p).clone()), cont.clone());
            let more = encode_exists(ctx, p, &inner, fuel - 1);
            format!("(or {zero} {more})")
        }
    }
}

fn encode_all(ctx: &mut Ctx, path: &Path, cont: &Query, fuel: usize) -> String {
    match path {
        Path::AssertFact(p) => {
            if fuel == 0 {
                ctx.exhausted = true;
                return "true".to_string();
            }
            let here = encode_prop(ctx, p);
            ctx.step += 1;
            let there = encode_query(ctx, cont, fuel - 1);
            ctx.step -= 1;
            format!("(or (not {here}) {there})")
        }
        Path::Test(q1) => format!(
            "(or {} {})",
            encode_query(ctx, &q1.not(), fuel),
            encode_query(ctx, cont, fuel)
        ),
        Path::Choice(a, b, rest) => {
            let mut s = format!(
                "(and {} {}",
                encode_all(ctx, a, cont, fuel),
                encode_all(ctx, b, cont, fuel)
            );
            for p in rest {
                s.push(' ');
                s.push_str(&encode_all(ctx, p, cont, fuel));
            }
            s.push(')');
            s
        }
        Path::Sequence(a, b, rest) => {
            let inner = sequence_continuation(b, rest, cont, Query::all);
            encode_all(ctx, a, &inner, fuel)
        }
        Path::Repeat(p) => {
            if p.test_only() {
                return encode_query(ctx, cont, fuel);
            }
            if fuel == 0 {
                ctx.exhausted = true;
                return "true".to_string();
            }
            let zero = encode_query(ctx, cont, fuel);
            let inner = Query::all(Path::repeat((**p).clone()), cont.clone());
            let more = encode_all(ctx, p, &inner, fuel - 1);
            format!("(and {zero} {more})")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{diamond, AttrValue, GroundFact};

    fn fact_query(name: &str) -> Query {
        Query::formula(Proposition::fact(GroundFact::new(
            name,
            vec![AttrValue::Str(name.into())],
        )))
    }

    #[test]
    fn encodes_without_exhausting_within_bound() {
        let q = diamond(fact_query("curl"));
        let outcome = encode_for_satisfiability(&q, 8);
        assert!(!outcome.exhausted);
        assert!(outcome.script.contains("check-sat"));
    }

    #[test]
    fn exhausts_when_bound_is_zero_and_a_step_is_required() {
        let q = crate::query::next(fact_query("curl"));
        let outcome = encode_for_satisfiability(&q, 0);
        assert!(outcome.exhausted);
    }

    #[test]
    fn tt_needs_no_declarations() {
        let outcome = encode_for_satisfiability(&Query::TT, 4);
        assert!(!outcome.script.contains("declare-const"));
    }
}
