//! The external SMT solver integration.
//!
//! `SmtBackend` is the trait the monitor pipeline consults once the
//! structural evaluator produces a non-trivial residual query; the
//! backend decides validity/satisfiability by handing a bounded SMT-LIB2
//! encoding to an external solver subprocess. `ProcessSmtBackend` is the
//! production implementation; `InMemorySmtBackend` is a brute-force
//! in-process stand-in used by tests that don't want a `z3` binary on
//! `$PATH`.

pub mod encode;
pub mod mock;
pub mod process_backend;

pub use mock::InMemorySmtBackend;
pub use process_backend::ProcessSmtBackend;

use crate::error::SmtResult;
use crate::query::Query;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Decides validity/satisfiability/simplification of LDLf queries,
/// bounded by an unrolling horizon configured on the implementation.
#[async_trait]
pub trait SmtBackend: Send + Sync {
    /// True iff `q` holds under every assignment to its free predicates,
    /// within the configured unrolling bound. Beyond the bound, a query
    /// that cannot be shown valid is treated as not valid.
    async fn valid(&self, q: &Query) -> SmtResult<bool>;

    /// True iff some assignment to `q`'s free predicates satisfies it,
    /// within the configured unrolling bound. Beyond the bound, a query
    /// that cannot be shown unsatisfiable is treated as satisfiable.
    async fn satisfiable(&self, q: &Query) -> SmtResult<bool>;

    /// Structurally simplify `q`: collapse to `TT`/`FF` when the backend
    /// can prove it valid/unsatisfiable, otherwise return a deduplicated
    /// `q` unchanged in meaning.
    async fn simplify(&self, q: &Query) -> SmtResult<Query>;

    /// A snapshot of this backend's cache/circuit-breaker counters.
    fn statistics(&self) -> SmtStatistics;
}

/// Point-in-time counters surfaced by a backend, independent of which
/// concrete implementation is in use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtStatistics {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub solver_calls: u64,
    pub solver_failures: u64,
    pub circuit_open_rejections: u64,
}
