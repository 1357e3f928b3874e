//! `ProcessSmtBackend`: the production [`SmtBackend`] implementation,
//! spawning a solver subprocess per call (a Z3/CVC4/Yices-style piped
//! subprocess), cached by structural key in a [`DashMap`] hot cache, and
//! guarded by a consecutive-failure circuit breaker.

use crate::config::SmtBackendConfig;
use crate::error::{SmtError, SmtResult};
use crate::query::Query;
use crate::smt::encode::{encode_for_satisfiability, encode_for_validity};
use crate::smt::{SmtBackend, SmtStatistics};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncWriteExt, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Semaphore;

/// Consecutive-failure circuit breaker: once `breaker_threshold` calls in
/// a row fail, reject further solver calls with [`SmtError::CircuitOpen`]
/// until `breaker_cooldown` has elapsed since the last failure.
struct Breaker {
    consecutive_failures: u32,
    open_until: Option<Instant>,
}

impl Breaker {
    fn new() -> Self {
        Self {
            consecutive_failures: 0,
            open_until: None,
        }
    }
}

#[derive(Default)]
struct Counters {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    solver_calls: AtomicU64,
    solver_failures: AtomicU64,
    circuit_open_rejections: AtomicU64,
}

/// Spawns a fresh solver subprocess per uncached call, sharing one
/// connection-pool-style [`Semaphore`] to bound concurrency at
/// `config.pool_size`.
pub struct ProcessSmtBackend {
    config: SmtBackendConfig,
    valid_cache: DashMap<String, bool>,
    sat_cache: DashMap<String, bool>,
    simplify_cache: DashMap<String, Query>,
    breaker: Mutex<Breaker>,
    pool: Arc<Semaphore>,
    counters: Counters,
}

impl ProcessSmtBackend {
    pub fn new(config: SmtBackendConfig) -> Self {
        let pool = Arc::new(Semaphore::new(config.pool_size));
        Self {
            config,
            valid_cache: DashMap::new(),
            sat_cache: DashMap::new(),
            simplify_cache: DashMap::new(),
            breaker: Mutex::new(Breaker::new()),
            pool,
            counters: Counters::default(),
        }
    }

    fn cache_key(q: &Query) -> String {
        q.to_string()
    }

    fn check_breaker(&self) -> SmtResult<()> {
        let breaker = self.breaker.lock();
        if let Some(until) = breaker.open_until {
            if Instant::now() < until {
                self.counters
                    .circuit_open_rejections
                    .fetch_add(1, Ordering::Relaxed);
                return Err(SmtError::CircuitOpen);
            }
        }
        Ok(())
    }

    fn record_success(&self) {
        let mut breaker = self.breaker.lock();
        breaker.consecutive_failures = 0;
        breaker.open_until = None;
    }

    fn record_failure(&self) {
        let mut breaker = self.breaker.lock();
        breaker.consecutive_failures += 1;
        if breaker.consecutive_failures >= self.config.breaker_threshold {
            breaker.open_until = Some(Instant::now() + self.config.breaker_cooldown);
        }
    }

    /// Runs `script` through the configured solver, applying the
    /// configured timeout, and returns whether it reported `unsat`.
    /// Evicting the cache entries that referenced a cleared pool slot is
    /// unnecessary: the cache key is purely structural and the subprocess
    /// itself carries no state across calls.
    async fn run_unsat_check(&self, script: &str) -> SmtResult<bool> {
        self.check_breaker()?;
        let _permit = self
            .pool
            .acquire()
            .await
            .map_err(|e| SmtError::SpawnFailed(e.to_string()))?;

        self.counters.solver_calls.fetch_add(1, Ordering::Relaxed);

        let result = tokio::time::timeout(self.config.timeout, self.spawn_and_solve(script)).await;

        match result {
            Ok(Ok(is_unsat)) => {
                self.record_success();
                Ok(is_unsat)
            }
            Ok(Err(e)) => {
                self.record_failure();
                self.counters.solver_failures.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
            Err(_) => {
                self.record_failure();
                self.counters.solver_failures.fetch_add(1, Ordering::Relaxed);
                Err(SmtError::Timeout(self.config.timeout))
            }
        }
    }

    async fn spawn_and_solve(&self, script: &str) -> SmtResult<bool> {
        let mut child = Command::new(&self.config.solver_path)
            .args(["-in"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SmtError::SpawnFailed(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(script.as_bytes()).await?;
        }

        let status = child.wait().await?;
        let mut stdout = String::new();
        if let Some(mut out) = child.stdout.take() {
            out.read_to_string(&mut stdout).await?;
        }

        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut err) = child.stderr.take() {
                err.read_to_string(&mut stderr).await?;
            }
            return Err(SmtError::SolverExited {
                status: status.to_string(),
                stderr,
            });
        }

        parse_check_sat(&stdout)
    }
}

fn parse_check_sat(output: &str) -> SmtResult<bool> {
    for line in output.lines() {
        let line = line.trim();
        if line == "unsat" {
            return Ok(true);
        }
        if line == "sat" {
            return Ok(false);
        }
        if line == "unknown" {
            return Ok(false);
        }
    }
    Err(SmtError::ParseError(format!(
        "no sat/unsat/unknown verdict in solver output: {output:?}"
    )))
}

#[async_trait]
impl SmtBackend for ProcessSmtBackend {
    async fn valid(&self, q: &Query) -> SmtResult<bool> {
        let key = Self::cache_key(q);
        if let Some(cached) = self.valid_cache.get(&key) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(*cached);
        }
        self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);

        let outcome = encode_for_validity(q, self.config.unrolling_bound);
        let is_valid = if outcome.exhausted {
            false
        } else {
            self.run_unsat_check(&outcome.script).await?
        };

        if self.valid_cache.len() < self.config.cache_size {
            self.valid_cache.insert(key, is_valid);
        }
        Ok(is_valid)
    }

    async fn satisfiable(&self, q: &Query) -> SmtResult<bool> {
        let key = Self::cache_key(q);
        if let Some(cached) = self.sat_cache.get(&key) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(*cached);
        }
        self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);

        let outcome = encode_for_satisfiability(q, self.config.unrolling_bound);
        let is_sat = if outcome.exhausted {
            true
        } else {
            !self.run_unsat_check(&outcome.script).await?
        };

        if self.sat_cache.len() < self.config.cache_size {
            self.sat_cache.insert(key, is_sat);
        }
        Ok(is_sat)
    }

    async fn simplify(&self, q: &Query) -> SmtResult<Query> {
        let key = Self::cache_key(q);
        if let Some(cached) = self.simplify_cache.get(&key) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached.clone());
        }
        self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);

        let simplified = if self.valid(q).await? {
            Query::TT
        } else if !self.satisfiable(q).await? {
            Query::FF
        } else {
            q.clone()
        };

        if self.simplify_cache.len() < self.config.cache_size {
            self.simplify_cache.insert(key, simplified.clone());
        }
        Ok(simplified)
    }

    fn statistics(&self) -> SmtStatistics {
        SmtStatistics {
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.counters.cache_misses.load(Ordering::Relaxed),
            solver_calls: self.counters.solver_calls.load(Ordering::Relaxed),
            solver_failures: self.counters.solver_failures.load(Ordering::Relaxed),
            circuit_open_rejections: self.counters.circuit_open_rejections.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unsat_sat_unknown() {
        assert_eq!(parse_check_sat("unsat\n").unwrap(), true);
        assert_eq!(parse_check_sat("sat\n").unwrap(), false);
        assert_eq!(parse_check_sat("unknown\n").unwrap(), false);
    }

    #[test]
    fn parse_error_on_garbage() {
        assert!(parse_check_sat("not a solver response").is_err());
    }

    #[test]
    fn breaker_opens_after_threshold_failures() {
        let backend = ProcessSmtBackend::new(SmtBackendConfig {
            breaker_threshold: 2,
            ..SmtBackendConfig::default()
        });
        assert!(backend.check_breaker().is_ok());
        backend.record_failure();
        assert!(backend.check_breaker().is_ok());
        backend.record_failure();
        assert!(backend.check_breaker().is_err());
    }

    #[test]
    fn breaker_resets_on_success() {
        let backend = ProcessSmtBackend::new(SmtBackendConfig {
            breaker_threshold: 1,
            ..SmtBackendConfig::default()
        });
        backend.record_failure();
        assert!(backend.check_breaker().is_err());
        backend.record_success();
        assert!(backend.check_breaker().is_ok());
    }
}
