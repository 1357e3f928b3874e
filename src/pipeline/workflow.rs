//! The workflow plug-in and the 2-element sliding window that turns a
//! stream of `SensorNetValue`s into a stream of `(BindToSensors, last)`
//! pairs the monitor loop can consume.

use crate::pipeline::sensor::SensorNetValue;
use crate::query::GroundFact;
use std::collections::{HashSet, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// A raw sensor value paired with the ground facts the workflow inferred
/// hold for it. Ephemeral — built fresh for every windowed event.
#[derive(Debug, Clone, PartialEq)]
pub struct BindToSensors {
    pub facts: HashSet<GroundFact>,
    pub value: SensorNetValue,
}

/// A user-supplied, pure labeling function from a raw event to its fact
/// set. Modeled as a boxed closure rather than a trait so pipeline
/// construction stays a one-liner for callers.
pub type Workflow = dyn Fn(&SensorNetValue) -> BindToSensors + Send + Sync;

/// Runs `workflow` against `value`, catching a panicking plug-in: the
/// event is dropped and `None` is returned rather than the panic
/// unwinding into the pipeline's driver task.
pub fn run_workflow(workflow: &Workflow, value: SensorNetValue) -> Option<BindToSensors> {
    match catch_unwind(AssertUnwindSafe(|| workflow(&value))) {
        Ok(bound) => Some(bound),
        Err(_) => None,
    }
}

/// A 2-element sliding window over `BindToSensors` events within one
/// trace: buffers at most two events, and yields the older one tagged
/// with whether a successor has arrived yet.
///
/// - window length 1 at end-of-stream ⇒ the sole buffered event is the
///   last step (`last = true`);
/// - window length 2 ⇒ the older event is emitted with `last = false`.
#[derive(Default)]
pub struct SlidingWindow {
    buf: VecDeque<BindToSensors>,
}

impl SlidingWindow {
    pub fn new() -> Self {
        Self {
            buf: VecDeque::with_capacity(2),
        }
    }

    /// Push the next windowed event. Returns the event that fell out the
    /// back of the window (with `last = false`, since a successor just
    /// arrived), or `None` if the window isn't full yet.
    pub fn push(&mut self, event: BindToSensors) -> Option<(BindToSensors, bool)> {
        self.buf.push_back(event);
        if self.buf.len() > 2 {
            unreachable!("sliding window capacity is enforced by push/drain");
        }
        if self.buf.len() == 2 {
            let older = self.buf.pop_front().expect("len == 2");
            Some((older, false))
        } else {
            None
        }
    }

    /// Call once the upstream event source is exhausted: flushes the
    /// final buffered event, if any, tagged `last = true`.
    pub fn drain_final(&mut self) -> Option<(BindToSensors, bool)> {
        self.buf.pop_front().map(|event| (event, true))
    }
}

/// Convenience constructor for a `Workflow` from a plain closure, so
/// callers don't need to spell out the `Arc<dyn Fn...>` themselves.
pub fn workflow_fn<F>(f: F) -> Arc<Workflow>
where
    F: Fn(&SensorNetValue) -> BindToSensors + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::sensor::SensorNetValue;

    fn event() -> BindToSensors {
        BindToSensors {
            facts: HashSet::new(),
            value: SensorNetValue::default(),
        }
    }

    #[test]
    fn single_event_trace_is_last_on_drain() {
        let mut window = SlidingWindow::new();
        assert_eq!(window.push(event()), None);
        let (_, last) = window.drain_final().unwrap();
        assert!(last);
    }

    #[test]
    fn two_event_trace_marks_first_not_last() {
        let mut window = SlidingWindow::new();
        assert_eq!(window.push(event()), None);
        let (_, last) = window.push(event()).unwrap();
        assert!(!last);
        let (_, last) = window.drain_final().unwrap();
        assert!(last);
    }

    #[test]
    fn panicking_workflow_is_caught_as_dropped_event() {
        let workflow: Arc<Workflow> = workflow_fn(|_v| panic!("boom"));
        let result = run_workflow(&*workflow, SensorNetValue::default());
        assert!(result.is_none());
    }

    #[test]
    fn well_behaved_workflow_binds_facts() {
        let workflow: Arc<Workflow> = workflow_fn(|v| BindToSensors {
            facts: HashSet::new(),
            value: v.clone(),
        });
        let result = run_workflow(&*workflow, SensorNetValue::default());
        assert!(result.is_some());
    }
}
