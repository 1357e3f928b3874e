//! Error taxonomy for the monitor pipeline and SMT backend.
//!
//! Mirrors the originating workspace's flat `thiserror` enum + blanket
//! `Result` alias shape rather than `anyhow` inside library code;
//! `anyhow` is reserved for the CLI binary's `main()`.

use thiserror::Error;

/// Result alias for SMT backend operations.
pub type SmtResult<T> = Result<T, SmtError>;

/// Failures from the external SMT solver integration.
#[derive(Error, Debug)]
pub enum SmtError {
    #[error("solver subprocess failed to start: {0}")]
    SpawnFailed(String),

    #[error("solver subprocess exited with status {status}: {stderr}")]
    SolverExited { status: String, stderr: String },

    #[error("solver call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("failed to parse solver output: {0}")]
    ParseError(String),

    #[error("solver circuit breaker open; too many consecutive failures")]
    CircuitOpen,

    #[error("I/O error talking to solver subprocess: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for sensor-net ingestion.
pub type IngestResult<T> = Result<T, IngestError>;

/// Ingress validation failures — fatal precondition violations, raised
/// immediately with no recovery attempted.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("sensor net has no streams at location {0}")]
    EmptyLocation(String),

    #[error("sensor stream at location {location} has no values")]
    EmptyStream { location: String },

    #[error("inconsistent block size: location {location} has {found}, expected {expected}")]
    InconsistentBlockSize {
        location: String,
        found: usize,
        expected: usize,
    },

    #[error("unexpected sampling rate at location {location}: got {found}, configured {expected}")]
    WrongSamplingRate {
        location: String,
        found: u32,
        expected: u32,
    },
}

/// Result alias for downstream listener delivery (`ExerciseSink`).
pub type SinkResult<T> = Result<T, SinkError>;

/// Failures sending a `ClassifiedExercise` to a listener.
/// Always logged and swallowed by the pipeline — never retried.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("listener {0} is gone")]
    ListenerGone(String),

    #[error("send to listener timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Result alias for pipeline-level operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Top-level pipeline error, composing the other taxonomies plus
/// pipeline-specific failure modes.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Smt(#[from] SmtError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("configuration error: {0}")]
    Config(String),
}
