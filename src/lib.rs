//! Streaming monitor for a linear-time dynamic logic (LDL) over finite
//! sensor traces.
//!
//! Four components, leaves first: [`query`] (the formula algebra),
//! [`smt`] (the external solver integration), [`evaluator`] (the
//! one-step semantic unwinding), and [`pipeline`] (the streaming
//! driver). [`config`], [`error`], and [`observability`] are the ambient
//! scaffolding every production crate in this style carries alongside
//! its core.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod observability;
pub mod pipeline;
pub mod query;
pub mod smt;

pub use config::{AppConfig, ConfigLoader, PipelineConfig, SmtBackendConfig};
pub use error::{IngestError, PipelineError, PipelineResult, SinkError, SmtError};
pub use evaluator::evaluate;
pub use query::{Fact, GroundFact, Proposition, Query, QueryValue};
