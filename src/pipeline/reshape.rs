//! Ingress validation and event reshaping: splits one heterogeneous
//! `SensorNet` snapshot into its per-block-index `SensorNetValue` events,
//! in block order.

use crate::error::{IngestError, IngestResult};
use crate::pipeline::sensor::{Location, SensorNet, SensorNetValue};

/// Validates a snapshot against the ingress preconditions and splits it
/// into `SensorNetValue` events, one per block index, in order.
///
/// Preconditions (fatal, no recovery):
///   - every location has at least one stream, every stream at least one
///     value;
///   - all streams in the snapshot share one `block_size`;
///   - all streams match the configured `sampling_rate_hz`.
pub fn reshape(net: &SensorNet, sampling_rate_hz: u32) -> IngestResult<Vec<SensorNetValue>> {
    if net.streams.is_empty() {
        return Err(IngestError::EmptyLocation("<snapshot>".to_string()));
    }

    let mut block_size: Option<usize> = None;
    for (location, streams) in &net.streams {
        if streams.is_empty() {
            return Err(IngestError::EmptyLocation(location.to_string()));
        }
        for stream in streams {
            if stream.values.is_empty() {
                return Err(IngestError::EmptyStream {
                    location: location.to_string(),
                });
            }
            if stream.sampling_rate_hz != sampling_rate_hz {
                return Err(IngestError::WrongSamplingRate {
                    location: location.to_string(),
                    found: stream.sampling_rate_hz,
                    expected: sampling_rate_hz,
                });
            }
            match block_size {
                None => block_size = Some(stream.values.len()),
                Some(expected) if expected != stream.values.len() => {
                    return Err(IngestError::InconsistentBlockSize {
                        location: location.to_string(),
                        found: stream.values.len(),
                        expected,
                    });
                }
                Some(_) => {}
            }
        }
    }

    let block_size = block_size.expect("non-empty snapshot has at least one stream");
    let mut events = Vec::with_capacity(block_size);
    for i in 0..block_size {
        let mut values: std::collections::HashMap<Location, Vec<_>> =
            std::collections::HashMap::with_capacity(net.streams.len());
        for (location, streams) in &net.streams {
            let point_samples = streams.iter().map(|s| s.values[i].clone()).collect();
            values.insert(location.clone(), point_samples);
        }
        events.push(SensorNetValue { values });
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::sensor::{SensorStream, SensorValue};

    fn stream(rate: u32, len: usize) -> SensorStream {
        SensorStream {
            sampling_rate_hz: rate,
            values: (0..len)
                .map(|i| SensorValue::Accelerometer { x: i as f64, y: 0.0, z: 0.0 })
                .collect(),
        }
    }

    #[test]
    fn reshapes_into_one_event_per_block_index() {
        let mut net = SensorNet::new();
        net.insert(Location::Wrist, vec![stream(50, 3)]);
        let events = reshape(&net, 50).unwrap();
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn rejects_empty_snapshot() {
        let net = SensorNet::new();
        assert!(matches!(reshape(&net, 50), Err(IngestError::EmptyLocation(_))));
    }

    #[test]
    fn rejects_empty_stream_list() {
        let mut net = SensorNet::new();
        net.insert(Location::Wrist, vec![]);
        assert!(matches!(reshape(&net, 50), Err(IngestError::EmptyLocation(_))));
    }

    #[test]
    fn rejects_mismatched_sampling_rate() {
        let mut net = SensorNet::new();
        net.insert(Location::Wrist, vec![stream(100, 3)]);
        assert!(matches!(reshape(&net, 50), Err(IngestError::WrongSamplingRate { .. })));
    }

    #[test]
    fn rejects_inconsistent_block_size() {
        let mut net = SensorNet::new();
        net.insert(Location::Wrist, vec![stream(50, 3), stream(50, 4)]);
        assert!(matches!(reshape(&net, 50), Err(IngestError::InconsistentBlockSize { .. })));
    }

    #[test]
    fn preserves_block_order() {
        let mut net = SensorNet::new();
        net.insert(Location::Wrist, vec![stream(50, 3)]);
        let events = reshape(&net, 50).unwrap();
        for (i, event) in events.iter().enumerate() {
            let sample = &event.values[&Location::Wrist][0];
            match sample {
                SensorValue::Accelerometer { x, .. } => assert_eq!(*x, i as f64),
                _ => panic!("unexpected sample kind"),
            }
        }
    }
}
