//! `InMemorySmtBackend`: a brute-force [`SmtBackend`] for tests, so the
//! pipeline and its property tests can run without a `z3` binary on
//! `$PATH`. Collects every ground-fact predicate a query depends on as a
//! Boolean atom, then enumerates all truth assignments (bounded to a safe
//! atom count), fully re-evaluating the query's `Exists`/`All` structure
//! under each one rather than treating nested modalities as opaque.

use crate::error::{SmtError, SmtResult};
use crate::query::{Fact, Path, Proposition, Query};
use crate::smt::{SmtBackend, SmtStatistics};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Above this many distinct atoms, brute-force enumeration would be
/// impractical even for tests; callers should keep fixtures small.
const MAX_ATOMS: usize = 20;

#[derive(Default)]
pub struct InMemorySmtBackend {
    calls: AtomicU64,
}

impl InMemorySmtBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Collects every ground-fact predicate key reachable from `q`, across
/// `Formula` leaves and `Exists`/`All` path bodies alike.
fn collect_atoms(q: &Query, atoms: &mut BTreeSet<String>) {
    match q {
        Query::Formula(p) => collect_prop_atoms(p, atoms),
        Query::TT | Query::FF => {}
        Query::And(a, b, rest) | Query::Or(a, b, rest) => {
            collect_atoms(a, atoms);
            collect_atoms(b, atoms);
            rest.iter().for_each(|q| collect_atoms(q, atoms));
        }
        Query::Exists(path, cont) | Query::All(path, cont) => {
            collect_path_atoms(path, atoms);
            collect_atoms(cont, atoms);
        }
    }
}

fn collect_path_atoms(p: &Path, atoms: &mut BTreeSet<String>) {
    match p {
        Path::AssertFact(prop) => collect_prop_atoms(prop, atoms),
        Path::Test(q) => collect_atoms(q, atoms),
        Path::Choice(a, b, rest) | Path::Sequence(a, b, rest) => {
            collect_path_atoms(a, atoms);
            collect_path_atoms(b, atoms);
            rest.iter().for_each(|p| collect_path_atoms(p, atoms));
        }
        Path::Repeat(p) => collect_path_atoms(p, atoms),
    }
}

fn collect_prop_atoms(p: &Proposition, atoms: &mut BTreeSet<String>) {
    match p {
        Proposition::True | Proposition::False => {}
        Proposition::Assert(Fact::Pos(g)) | Proposition::Assert(Fact::Neg(g)) => {
            atoms.insert(g.predicate_key());
        }
        Proposition::Conjunction(a, b, rest) | Proposition::Disjunction(a, b, rest) => {
            collect_prop_atoms(a, atoms);
            collect_prop_atoms(b, atoms);
            rest.iter().for_each(|p| collect_prop_atoms(p, atoms));
        }
    }
}

/// This backend has no notion of trace steps — one assignment stands for
/// a single world — so `Repeat` has no natural base case to bottom out
/// on. `EVAL_FUEL` bounds how many times a `Repeat` body is unwound,
/// mirroring the encoder's bounded unrolling (`smt::encode`) so a
/// non-`test_only` loop can't recurse forever.
const EVAL_FUEL: usize = 16;

fn eval_query(q: &Query, assignment: &std::collections::HashMap<&str, bool>) -> bool {
    eval_query_fueled(q, assignment, EVAL_FUEL)
}

fn eval_query_fueled(q: &Query, assignment: &std::collections::HashMap<&str, bool>, fuel: usize) -> bool {
    match q {
        Query::Formula(p) => eval_prop(p, assignment),
        Query::TT => true,
        Query::FF => false,
        Query::And(a, b, rest) => {
            eval_query_fueled(a, assignment, fuel)
                && eval_query_fueled(b, assignment, fuel)
                && rest.iter().all(|q| eval_query_fueled(q, assignment, fuel))
        }
        Query::Or(a, b, rest) => {
            eval_query_fueled(a, assignment, fuel)
                || eval_query_fueled(b, assignment, fuel)
                || rest.iter().any(|q| eval_query_fueled(q, assignment, fuel))
        }
        Query::Exists(path, cont) => eval_path_exists(path, cont, assignment, fuel),
        Query::All(path, cont) => eval_path_all(path, cont, assignment, fuel),
    }
}

fn eval_path_exists(p: &Path, cont: &Query, assignment: &std::collections::HashMap<&str, bool>, fuel: usize) -> bool {
    match p {
        Path::AssertFact(prop) => eval_prop(prop, assignment) && eval_query_fueled(cont, assignment, fuel),
        Path::Test(q) => eval_query_fueled(q, assignment, fuel) && eval_query_fueled(cont, assignment, fuel),
        Path::Choice(a, b, rest) => {
            eval_path_exists(a, cont, assignment, fuel)
                || eval_path_exists(b, cont, assignment, fuel)
                || rest.iter().any(|p| eval_path_exists(p, cont, assignment, fuel))
        }
        Path::Sequence(a, b, rest) => {
            let inner = crate::evaluator::sequence_continuation(b, rest, cont, Query::exists);
            eval_path_exists(a, &inner, assignment, fuel)
        }
        Path::Repeat(p) => {
            if p.test_only() {
                return eval_query_fueled(cont, assignment, fuel);
            }
            if fuel == 0 {
                return false;
            }
            let zero = eval_query_fueled(cont, assignment, fuel);
            let inner = Query::exists(Path::repeat((**p).clone()), cont.clone());
            zero || eval_path_exists(p, &inner, assignment, fuel - 1)
        }
    }
}

fn eval_path_all(p: &Path, cont: &Query, assignment: &std::collections::HashMap<&str, bool>, fuel: usize) -> bool {
    match p {
        Path::AssertFact(prop) => !eval_prop(prop, assignment) || eval_query_fueled(cont, assignment, fuel),
        Path::Test(q) => !eval_query_fueled(q, assignment, fuel) || eval_query_fueled(cont, assignment, fuel),
        Path::Choice(a, b, rest) => {
            eval_path_all(a, cont, assignment, fuel)
                && eval_path_all(b, cont, assignment, fuel)
                && rest.iter().all(|p| eval_path_all(p, cont, assignment, fuel))
        }
        Path::Sequence(a, b, rest) => {
            let inner = crate::evaluator::sequence_continuation(b, rest, cont, Query::all);
            eval_path_all(a, &inner, assignment, fuel)
        }
        Path::Repeat(p) => {
            if p.test_only() {
                return eval_query_fueled(cont, assignment, fuel);
            }
            if fuel == 0 {
                return true;
            }
            let zero = eval_query_fueled(cont, assignment, fuel);
            let inner = Query::all(Path::repeat((**p).clone()), cont.clone());
            zero && eval_path_all(p, &inner, assignment, fuel - 1)
        }
    }
}

fn eval_prop(p: &Proposition, assignment: &std::collections::HashMap<&str, bool>) -> bool {
    match p {
        Proposition::True => true,
        Proposition::False => false,
        Proposition::Assert(Fact::Pos(g)) => *assignment.get(g.predicate_key().as_str()).unwrap_or(&false),
        Proposition::Assert(Fact::Neg(g)) => !*assignment.get(g.predicate_key().as_str()).unwrap_or(&false),
        Proposition::Conjunction(a, b, rest) => {
            eval_prop(a, assignment) && eval_prop(b, assignment) && rest.iter().all(|p| eval_prop(p, assignment))
        }
        Proposition::Disjunction(a, b, rest) => {
            eval_prop(a, assignment) || eval_prop(b, assignment) || rest.iter().any(|p| eval_prop(p, assignment))
        }
    }
}

fn for_each_assignment(atoms: &[&str], mut visit: impl FnMut(&std::collections::HashMap<&str, bool>) -> bool) -> bool {
    let n = atoms.len();
    for mask in 0u64..(1u64 << n) {
        let assignment: std::collections::HashMap<&str, bool> = atoms
            .iter()
            .enumerate()
            .map(|(i, a)| (*a, mask & (1 << i) != 0))
            .collect();
        if visit(&assignment) {
            return true;
        }
    }
    false
}

#[async_trait]
impl SmtBackend for InMemorySmtBackend {
    async fn valid(&self, q: &Query) -> SmtResult<bool> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let mut atom_set = BTreeSet::new();
        collect_atoms(q, &mut atom_set);
        if atom_set.len() > MAX_ATOMS {
            return Err(SmtError::ParseError(format!(
                "in-memory backend cannot brute-force {} atoms",
                atom_set.len()
            )));
        }
        let atoms: Vec<&str> = atom_set.iter().map(String::as_str).collect();
        let any_false = for_each_assignment(&atoms, |assignment| !eval_query(q, assignment));
        Ok(!any_false)
    }

    async fn satisfiable(&self, q: &Query) -> SmtResult<bool> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let mut atom_set = BTreeSet::new();
        collect_atoms(q, &mut atom_set);
        if atom_set.len() > MAX_ATOMS {
            return Err(SmtError::ParseError(format!(
                "in-memory backend cannot brute-force {} atoms",
                atom_set.len()
            )));
        }
        let atoms: Vec<&str> = atom_set.iter().map(String::as_str).collect();
        Ok(for_each_assignment(&atoms, |assignment| eval_query(q, assignment)))
    }

    async fn simplify(&self, q: &Query) -> SmtResult<Query> {
        if self.valid(q).await? {
            Ok(Query::TT)
        } else if !self.satisfiable(q).await? {
            Ok(Query::FF)
        } else {
            Ok(q.clone())
        }
    }

    fn statistics(&self) -> SmtStatistics {
        SmtStatistics {
            solver_calls: self.calls.load(Ordering::Relaxed),
            ..SmtStatistics::default()
        }
    }
}
