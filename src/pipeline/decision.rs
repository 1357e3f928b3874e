//! The downstream sink API and the per-query decision layer.

use crate::pipeline::sensor::ListenerId;
use crate::query::QueryValue;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A recognized exercise, as emitted by the (out-of-scope) SVM gesture
/// classifier collaborator. Kept as an opaque name here — the core never
/// interprets it beyond carrying it to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
}

impl Exercise {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The message the pipeline delivers to a listener once a watched
/// query's monitor produces a decision worth reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedExercise {
    pub confidence: f64,
    pub exercise: Option<Exercise>,
}

/// Downstream sink API: accepts a `ClassifiedExercise` addressed to the
/// listener identity that accompanied the inducing sensor event. The
/// pipeline does not wait for acknowledgement beyond the call returning.
#[async_trait]
pub trait ExerciseSink: Send + Sync {
    async fn send(
        &self,
        listener: ListenerId,
        exercise: ClassifiedExercise,
    ) -> crate::error::SinkResult<()>;
}

/// Per-query decision transform: maps an emitted `QueryValue` to an
/// optional decision. User-supplied; the pipeline only guarantees that a
/// `Some` result reaches the listener that accompanied the originating
/// event.
pub type DecisionFn = dyn Fn(&QueryValue) -> Option<ClassifiedExercise> + Send + Sync;

/// Convenience constructor mirroring [`crate::pipeline::workflow::workflow_fn`].
pub fn decision_fn<F>(f: F) -> Arc<DecisionFn>
where
    F: Fn(&QueryValue) -> Option<ClassifiedExercise> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The obvious decision rule: report a fixed exercise/confidence exactly
/// when the monitor has stabilized to `true`, and stay silent otherwise
/// (both on `Stable(false)` and on any `Unstable` residual).
pub fn on_stable_true(exercise: Exercise, confidence: f64) -> Arc<DecisionFn> {
    decision_fn(move |value| match value {
        QueryValue::Stable(true) => Some(ClassifiedExercise {
            confidence,
            exercise: Some(exercise.clone()),
        }),
        _ => None,
    })
}
