//! `ldl-monitor-bench`: replays a JSON-encoded sensor trace through a
//! configured monitor pipeline and prints the emitted `QueryValue`/
//! `ClassifiedExercise` sequence, for manual smoke-testing without the
//! rest of the distributed exercise-tracking system.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use ldl_monitor::config::ConfigLoader;
use ldl_monitor::observability::init_tracing;
use ldl_monitor::pipeline::{
    on_stable_true, ChannelSink, Exercise, ListenerId, MonitorPipeline, QueryId, SensorNet,
    SensorSource, WatchedQuery,
};
use ldl_monitor::query::{diamond, AttrValue, GroundFact, Proposition, Query};
use ldl_monitor::smt::{InMemorySmtBackend, SmtBackend};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ldl-monitor-bench")]
#[command(about = "Replay a JSON sensor trace through the LDLf monitor pipeline")]
#[command(version)]
struct Cli {
    /// Path to a JSON file containing a `Vec<SensorNet>` trace.
    #[arg(short, long)]
    trace: PathBuf,

    /// Optional layered config file (defaults + env overrides still apply).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the real external solver subprocess instead of the in-memory
    /// brute-force backend (requires the configured solver on `$PATH`).
    #[arg(long)]
    real_solver: bool,
}

struct JsonTraceSource {
    batches: std::vec::IntoIter<SensorNet>,
    listener: ListenerId,
}

#[async_trait]
impl SensorSource for JsonTraceSource {
    async fn next_batch(&mut self) -> Option<(SensorNet, ListenerId)> {
        self.batches.next().map(|net| (net, self.listener))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path).context("loading config file")?,
        None => ConfigLoader::load_from_env().context("loading config from environment")?,
    };

    let trace_json = std::fs::read_to_string(&cli.trace)
        .with_context(|| format!("reading trace file {}", cli.trace.display()))?;
    let batches: Vec<SensorNet> =
        serde_json::from_str(&trace_json).context("parsing trace JSON as Vec<SensorNet>")?;

    let smt: Arc<dyn SmtBackend> = if cli.real_solver {
        Arc::new(ldl_monitor::smt::ProcessSmtBackend::new(config.smt.clone()))
    } else {
        Arc::new(InMemorySmtBackend::new())
    };

    let watched_query = diamond(Query::formula(Proposition::fact(GroundFact::new(
        "Gesture",
        vec![
            AttrValue::Str("biceps-curl".to_string()),
            AttrValue::Fixed(80),
            AttrValue::Location("Wrist".to_string()),
        ],
    ))));

    let (sink, mut decisions) = ChannelSink::new();
    let pipeline = MonitorPipeline::new(
        config.pipeline.sampling_rate_hz,
        config.pipeline.max_buffer_size,
        smt,
        Arc::new(sink),
        ldl_monitor::pipeline::workflow_fn(|value| {
            // Demo workflow: a wrist accelerometer sample whose magnitude
            // exceeds a fixed threshold is taken as a "biceps-curl" gesture.
            let mut facts = std::collections::HashSet::new();
            if let Some(samples) = value.values.get(&ldl_monitor::pipeline::Location::Wrist) {
                for sample in samples {
                    if let ldl_monitor::pipeline::SensorValue::Accelerometer { x, y, z } = sample {
                        if (x * x + y * y + z * z).sqrt() > 1.5 {
                            facts.insert(GroundFact::new(
                                "Gesture",
                                vec![
                                    AttrValue::Str("biceps-curl".to_string()),
                                    AttrValue::Fixed(80),
                                    AttrValue::Location("Wrist".to_string()),
                                ],
                            ));
                        }
                    }
                }
            }
            ldl_monitor::pipeline::BindToSensors {
                facts,
                value: value.clone(),
            }
        }),
        vec![WatchedQuery::new(
            QueryId(0),
            watched_query,
            on_stable_true(Exercise::new("biceps-curl"), 0.8),
        )],
    );

    let source = JsonTraceSource {
        batches: batches.into_iter(),
        listener: ListenerId::new(),
    };

    pipeline.run(Box::new(source)).await?;

    while let Ok((listener, exercise)) = decisions.try_recv() {
        println!(
            "listener={:?} confidence={:.2} exercise={:?}",
            listener, exercise.confidence, exercise.exercise
        );
    }

    let snapshot = pipeline.metrics().snapshot();
    eprintln!(
        "events_in={} decisions_out={} buffer_drops={} workflow_drops={}",
        snapshot.events_in, snapshot.decisions_out, snapshot.buffer_drops, snapshot.workflow_drops
    );

    Ok(())
}
