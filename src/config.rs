//! Layered configuration: defaults, then an optional file, then
//! environment variable overrides, with a `validate()` pass per
//! sub-config. Mirrors the originating workspace's
//! `ConfigLoader`/`AppConfig` shape.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub smt: SmtBackendConfig,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.service.validate()?;
        self.smt.validate()?;
        self.pipeline.validate()?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            smt: SmtBackendConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

/// Service metadata, used for trace/metric tagging only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub version: String,
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.name.is_empty() {
            return Err(PipelineError::Config("service.name must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "ldl-monitor".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// SMT backend subprocess configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtBackendConfig {
    /// Path (or bare name resolved via `$PATH`) to the solver executable.
    pub solver_path: String,
    /// Bound on `Exists`/`All` path unrolling during encoding.
    pub unrolling_bound: usize,
    /// Per-call timeout.
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
    /// Structural-key cache capacity.
    pub cache_size: usize,
    /// Number of solver subprocesses to pool for concurrent calls.
    pub pool_size: usize,
    /// Consecutive solver failures before the circuit breaker opens.
    pub breaker_threshold: u32,
    /// Cooldown before the circuit breaker allows another solver call.
    #[serde(with = "duration_millis")]
    pub breaker_cooldown: Duration,
}

impl SmtBackendConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.solver_path.is_empty() {
            return Err(PipelineError::Config("smt.solver_path must not be empty".into()));
        }
        if self.pool_size == 0 {
            return Err(PipelineError::Config("smt.pool_size must be >= 1".into()));
        }
        if self.breaker_threshold == 0 {
            return Err(PipelineError::Config("smt.breaker_threshold must be >= 1".into()));
        }
        Ok(())
    }
}

impl Default for SmtBackendConfig {
    fn default() -> Self {
        Self {
            solver_path: "z3".to_string(),
            unrolling_bound: 32,
            timeout: Duration::from_secs(2),
            cache_size: 10_000,
            pool_size: 1,
            breaker_threshold: 5,
            breaker_cooldown: Duration::from_secs(30),
        }
    }
}

/// Monitor pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Bounded backpressure buffer capacity.
    pub max_buffer_size: usize,
    /// Required sampling rate for all incoming sensor streams.
    pub sampling_rate_hz: u32,
    /// Timeout for a single listener send before it is logged and dropped.
    #[serde(with = "duration_millis")]
    pub listener_send_timeout: Duration,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.max_buffer_size == 0 {
            return Err(PipelineError::Config("pipeline.max_buffer_size must be >= 1".into()));
        }
        if self.sampling_rate_hz == 0 {
            return Err(PipelineError::Config("pipeline.sampling_rate_hz must be >= 1".into()));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_buffer_size: 1024,
            sampling_rate_hz: 50,
            listener_send_timeout: Duration::from_millis(500),
        }
    }
}

/// Loads configuration from defaults, an optional file, and environment
/// variable overrides (`LDL_*`), in that precedence order.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<AppConfig, PipelineError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("failed to read config file: {e}")))?;
        Self::load_from_str(&content)
    }

    pub fn load_from_str(content: &str) -> Result<AppConfig, PipelineError> {
        let config: AppConfig = serde_json::from_str(content)
            .map_err(|e| PipelineError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_env() -> Result<AppConfig, PipelineError> {
        let mut config = AppConfig::default();

        if let Ok(val) = std::env::var("LDL_SERVICE_NAME") {
            config.service.name = val;
        }
        if let Ok(val) = std::env::var("LDL_SMT_SOLVER_PATH") {
            config.smt.solver_path = val;
        }
        if let Ok(val) = std::env::var("LDL_SMT_UNROLLING_BOUND") {
            config.smt.unrolling_bound = val
                .parse()
                .map_err(|_| PipelineError::Config("LDL_SMT_UNROLLING_BOUND must be an integer".into()))?;
        }
        if let Ok(val) = std::env::var("LDL_PIPELINE_MAX_BUFFER_SIZE") {
            config.pipeline.max_buffer_size = val
                .parse()
                .map_err(|_| PipelineError::Config("LDL_PIPELINE_MAX_BUFFER_SIZE must be an integer".into()))?;
        }

        config.validate()?;
        Ok(config)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}
