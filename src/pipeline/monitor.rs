//! Per-query monitors and the driver that wires ingress, the workflow,
//! the sliding window, the monitors, and the decision layer together.

use crate::error::{PipelineResult, SinkResult};
use crate::evaluator::evaluate;
use crate::observability::PipelineMetrics;
use crate::pipeline::buffer::bounded;
use crate::pipeline::decision::{ClassifiedExercise, DecisionFn, ExerciseSink};
use crate::pipeline::reshape::reshape;
use crate::pipeline::sensor::{ListenerId, SensorSource};
use crate::pipeline::workflow::{run_workflow, BindToSensors, SlidingWindow, Workflow};
use crate::query::{GroundFact, Query, QueryValue};
use crate::smt::SmtBackend;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Opaque handle for a watched query, so logs/metrics can name "the
/// monitor for query N" without re-serializing the whole `Query` tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(pub u64);

/// One watched query plus the decision transform its monitor's output
/// feeds. Registered with the pipeline once at construction.
pub struct WatchedQuery {
    pub id: QueryId,
    pub query: Query,
    pub decision: Arc<DecisionFn>,
}

impl WatchedQuery {
    pub fn new(id: QueryId, query: Query, decision: Arc<DecisionFn>) -> Self {
        Self { id, query, decision }
    }
}

struct MonitorState {
    current: Query,
    stable: Option<QueryValue>,
}

/// One executing instance of the evaluator for one watched query, on one
/// trace. Holds its residual state behind its own lock so at most one
/// `step` call is in flight against it at a time; a different monitor's
/// `step` proceeds fully independently.
pub struct Monitor {
    id: QueryId,
    state: Mutex<MonitorState>,
}

impl Monitor {
    pub fn new(id: QueryId, query: Query) -> Self {
        Self {
            id,
            state: Mutex::new(MonitorState {
                current: query,
                stable: None,
            }),
        }
    }

    pub fn id(&self) -> QueryId {
        self.id
    }

    /// Advance this monitor by one windowed event:
    ///
    /// 1. a latched monitor returns its latch immediately, with no
    ///    further evaluation;
    /// 2. otherwise, `evaluate` the residual; a `Stable` result latches
    ///    (this monitor latches on every `Stable` output, including the
    ///    `valid(next) ⇒ Stable(true)` case, so output stays idempotent
    ///    after the first commit);
    /// 3. an `Unstable` result consults the SMT backend: `valid`/
    ///    `satisfiable`/`simplify` run concurrently; a solver failure on
    ///    `valid`/`satisfiable` is treated as "unknown" — `valid = false`,
    ///    `satisfiable = true` — so evaluation proceeds with the
    ///    unsimplified residual rather than failing the step.
    #[tracing::instrument(skip(self, facts, smt), fields(query_id = self.id.0))]
    pub async fn step(
        &self,
        facts: &std::collections::HashSet<GroundFact>,
        last: bool,
        smt: &dyn SmtBackend,
    ) -> QueryValue {
        let mut guard = self.state.lock().await;
        if let Some(latched) = &guard.stable {
            return latched.clone();
        }

        match evaluate(&guard.current, facts, last) {
            QueryValue::Stable(v) => {
                let value = QueryValue::Stable(v);
                guard.stable = Some(value.clone());
                value
            }
            QueryValue::Unstable(next) => {
                let (valid, satisfiable, simplified) =
                    futures::join!(smt.valid(&next), smt.satisfiable(&next), smt.simplify(&next));
                let valid = valid.unwrap_or(false);
                let satisfiable = satisfiable.unwrap_or(true);

                if valid {
                    let value = QueryValue::Stable(true);
                    guard.stable = Some(value.clone());
                    value
                } else if satisfiable {
                    guard.current = simplified.unwrap_or_else(|_| next.clone());
                    QueryValue::Unstable(next)
                } else {
                    let value = QueryValue::Stable(false);
                    guard.stable = Some(value.clone());
                    value
                }
            }
        }
    }
}

/// Per-trace state: the sliding window and one [`Monitor`] per watched
/// query, all sharing the same event stream.
struct TraceState {
    window: SlidingWindow,
    monitors: Vec<Arc<Monitor>>,
}

impl TraceState {
    fn new(queries: &[WatchedQuery]) -> Self {
        Self {
            window: SlidingWindow::new(),
            monitors: queries
                .iter()
                .map(|wq| Arc::new(Monitor::new(wq.id, wq.query.clone())))
                .collect(),
        }
    }
}

/// The streaming driver: reshapes ingested `SensorNet` snapshots,
/// labels each with ground facts via the configured `workflow`, windows
/// them, and runs every watched query's monitor, forwarding decisions to
/// the sink.
pub struct MonitorPipeline {
    sampling_rate_hz: u32,
    max_buffer_size: usize,
    smt: Arc<dyn SmtBackend>,
    sink: Arc<dyn ExerciseSink>,
    workflow: Arc<Workflow>,
    queries: Vec<WatchedQuery>,
    metrics: PipelineMetrics,
}

impl MonitorPipeline {
    pub fn new(
        sampling_rate_hz: u32,
        max_buffer_size: usize,
        smt: Arc<dyn SmtBackend>,
        sink: Arc<dyn ExerciseSink>,
        workflow: Arc<Workflow>,
        queries: Vec<WatchedQuery>,
    ) -> Self {
        Self {
            sampling_rate_hz,
            max_buffer_size,
            smt,
            sink,
            workflow,
            queries,
            metrics: PipelineMetrics::new(),
        }
    }

    pub fn metrics(&self) -> PipelineMetrics {
        self.metrics.clone()
    }

    /// Drives `source` to completion: reshapes and buffers every batch,
    /// then dispatches windowed events through the monitors and decision
    /// layer until the source is exhausted and every trace has drained.
    /// A reshape failure is a fatal ingress violation and aborts the run
    /// immediately.
    pub async fn run(&self, mut source: Box<dyn SensorSource>) -> PipelineResult<()> {
        let (producer, mut consumer) = bounded(self.max_buffer_size, self.metrics.clone());

        let ingress = async {
            while let Some((net, listener)) = source.next_batch().await {
                let events = reshape(&net, self.sampling_rate_hz)?;
                for event in events {
                    producer.offer((event, listener));
                }
            }
            producer.stop();
            Ok::<(), crate::error::PipelineError>(())
        };

        let mut traces: HashMap<ListenerId, TraceState> = HashMap::new();
        let dispatch = async {
            while let Some((event, listener)) = consumer.recv().await {
                self.metrics.record_event_in();
                let trace = traces
                    .entry(listener)
                    .or_insert_with(|| TraceState::new(&self.queries));

                let Some(bound) = run_workflow(&*self.workflow, event) else {
                    self.metrics.record_workflow_drop();
                    continue;
                };

                if let Some((bound, last)) = trace.window.push(bound) {
                    self.dispatch_to_monitors(listener, trace, bound, last).await;
                }
            }

            for (listener, mut trace) in traces.drain() {
                if let Some((bound, last)) = trace.window.drain_final() {
                    self.dispatch_to_monitors(listener, &mut trace, bound, last)
                        .await;
                }
            }
        };

        let (ingress_result, ()) = tokio::join!(ingress, dispatch);
        ingress_result
    }

    /// Evaluates every watched query's monitor against one windowed
    /// event concurrently, then runs each query's decision transform
    /// and forwards non-empty decisions to the sink. Monitors
    /// run independently of each other; this trace's own events remain
    /// ordered because `dispatch_to_monitors` is only ever called
    /// sequentially per trace from the single dispatch loop above.
    async fn dispatch_to_monitors(
        &self,
        listener: ListenerId,
        trace: &mut TraceState,
        bound: BindToSensors,
        last: bool,
    ) {
        let facts = &bound.facts;
        let steps = trace
            .monitors
            .iter()
            .map(|monitor| monitor.step(facts, last, self.smt.as_ref()));
        let results = futures::future::join_all(steps).await;

        for (watched, value) in self.queries.iter().zip(results.iter()) {
            if let Some(exercise) = (watched.decision)(value) {
                self.send_decision(listener, exercise).await;
            }
        }
    }

    async fn send_decision(&self, listener: ListenerId, exercise: ClassifiedExercise) {
        match self.sink.send(listener, exercise).await {
            Ok(()) => self.metrics.record_decision_out(),
            Err(err) => {
                tracing::error!(%err, "listener send failed; decision dropped");
                self.metrics.record_sink_send_failure();
            }
        }
    }
}

/// An `ExerciseSink` that forwards decisions into an `mpsc` channel, for
/// tests and the CLI harness — stands in for whatever real transport
/// eventually notifies a listener.
pub struct ChannelSink {
    tx: tokio::sync::mpsc::UnboundedSender<(ListenerId, ClassifiedExercise)>,
}

impl ChannelSink {
    pub fn new() -> (
        Self,
        tokio::sync::mpsc::UnboundedReceiver<(ListenerId, ClassifiedExercise)>,
    ) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait::async_trait]
impl ExerciseSink for ChannelSink {
    async fn send(&self, listener: ListenerId, exercise: ClassifiedExercise) -> SinkResult<()> {
        self.tx
            .send((listener, exercise))
            .map_err(|_| crate::error::SinkError::ListenerGone(format!("{listener:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::decision::{on_stable_true, Exercise};
    use crate::pipeline::sensor::{Location, SensorNet, SensorNetValue, SensorStream, SensorValue};
    use crate::query::{diamond, AttrValue};
    use crate::smt::InMemorySmtBackend;
    use std::collections::HashSet;

    fn gesture(name: &str) -> GroundFact {
        GroundFact::new(
            "Gesture",
            vec![AttrValue::Str(name.to_string()), AttrValue::Location("Wrist".into())],
        )
    }

    struct ScriptedSource {
        batches: Vec<(SensorNet, ListenerId)>,
    }

    #[async_trait::async_trait]
    impl SensorSource for ScriptedSource {
        async fn next_batch(&mut self) -> Option<(SensorNet, ListenerId)> {
            if self.batches.is_empty() {
                None
            } else {
                Some(self.batches.remove(0))
            }
        }
    }

    fn one_sample_net(accel: (f64, f64, f64)) -> SensorNet {
        let mut net = SensorNet::new();
        net.insert(
            Location::Wrist,
            vec![SensorStream {
                sampling_rate_hz: 50,
                values: vec![SensorValue::Accelerometer {
                    x: accel.0,
                    y: accel.1,
                    z: accel.2,
                }],
            }],
        );
        net
    }

    #[tokio::test]
    async fn monitor_latches_after_first_stable() {
        let monitor = Monitor::new(QueryId(0), diamond(Query::formula(crate::query::Proposition::fact(gesture("curl")))));
        let smt = InMemorySmtBackend::new();
        let empty: std::collections::HashSet<GroundFact> = HashSet::new();
        let step1 = monitor.step(&empty, false, &smt).await;
        assert!(matches!(step1, QueryValue::Unstable(_)));

        let mut matched = HashSet::new();
        matched.insert(gesture("curl"));
        let step2 = monitor.step(&matched, true, &smt).await;
        assert_eq!(step2, QueryValue::Stable(true));

        // Once latched, further steps return the same value regardless
        // of input.
        let step3 = monitor.step(&empty, true, &smt).await;
        assert_eq!(step3, step2);
    }

    #[tokio::test]
    async fn pipeline_emits_decision_once_curl_gesture_observed() {
        let watched = WatchedQuery::new(
            QueryId(0),
            diamond(Query::formula(crate::query::Proposition::fact(gesture("curl")))),
            on_stable_true(Exercise::new("biceps-curl"), 0.9),
        );

        let workflow = crate::pipeline::workflow::workflow_fn(|value: &SensorNetValue| {
            let mut facts = HashSet::new();
            if let Some(samples) = value.values.get(&Location::Wrist) {
                if let Some(SensorValue::Accelerometer { x, .. }) = samples.first() {
                    if *x > 0.5 {
                        facts.insert(gesture("curl"));
                    }
                }
            }
            BindToSensors {
                facts,
                value: value.clone(),
            }
        });

        let (sink, mut rx) = ChannelSink::new();
        let pipeline = MonitorPipeline::new(
            50,
            16,
            Arc::new(InMemorySmtBackend::new()),
            Arc::new(sink),
            workflow,
            vec![watched],
        );

        let listener = ListenerId::new();
        let source = ScriptedSource {
            batches: vec![
                (one_sample_net((0.0, 0.0, 0.0)), listener),
                (one_sample_net((1.0, 0.0, 0.0)), listener),
            ],
        };

        pipeline.run(Box::new(source)).await.unwrap();

        let (recv_listener, exercise) = rx.try_recv().expect("expected one decision");
        assert_eq!(recv_listener, listener);
        assert_eq!(exercise.exercise.as_ref().unwrap().name, "biceps-curl");
        assert!(rx.try_recv().is_err());
        assert_eq!(pipeline.metrics().snapshot().decisions_out, 1);
    }
}
