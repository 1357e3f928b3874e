//! The streaming monitor pipeline: ingress reshaping, the backpressure
//! buffer, the workflow/sliding-window stage, per-query monitors, and the
//! decision layer that reaches the downstream sink.

pub mod buffer;
pub mod decision;
pub mod monitor;
pub mod reshape;
pub mod sensor;
pub mod workflow;

pub use decision::{decision_fn, on_stable_true, ClassifiedExercise, DecisionFn, Exercise, ExerciseSink};
pub use monitor::{ChannelSink, Monitor, MonitorPipeline, QueryId, WatchedQuery};
pub use sensor::{ListenerId, Location, SensorNet, SensorNetValue, SensorSource, SensorStream, SensorValue};
pub use workflow::{workflow_fn, BindToSensors, SlidingWindow, Workflow};
