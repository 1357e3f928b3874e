//! The upstream sensor surface: `SensorNet` snapshots, the per-location
//! streams they carry, and the listener identity sensor samples travel
//! with for reply routing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Opaque identity of the downstream listener a trace of events belongs
/// to; carried alongside every event so decisions can be routed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// An enumerated sensor placement. `Other` absorbs placements the
/// pipeline wasn't built with a named variant for, so ingress never has
/// to reject a snapshot merely for using an unlisted location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Location {
    Wrist,
    Waist,
    Ankle,
    Chest,
    Other(String),
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Wrist => write!(f, "wrist"),
            Location::Waist => write!(f, "waist"),
            Location::Ankle => write!(f, "ankle"),
            Location::Chest => write!(f, "chest"),
            Location::Other(s) => write!(f, "{s}"),
        }
    }
}

/// One sensor sample. `Other` leaves room for sensor kinds this crate
/// wasn't built with a named variant for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SensorValue {
    Accelerometer { x: f64, y: f64, z: f64 },
    Rotation { x: f64, y: f64, z: f64 },
    Other { kind: String, values: Vec<f64> },
}

/// A single sensor point's samples over one snapshot, all taken at the
/// configured `sampling_rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorStream {
    pub sampling_rate_hz: u32,
    pub values: Vec<SensorValue>,
}

/// A heterogeneous snapshot: every sensor location's streams, as received
/// from upstream in one ingestion batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorNet {
    pub streams: HashMap<Location, Vec<SensorStream>>,
}

impl SensorNet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, location: Location, streams: Vec<SensorStream>) -> &mut Self {
        self.streams.insert(location, streams);
        self
    }
}

/// One time-sliced event split out of a `SensorNet`: for every location,
/// the vector of that location's point-samples at a single block index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorNetValue {
    pub values: HashMap<Location, Vec<SensorValue>>,
}

/// Produces `(SensorNet, ListenerId)` batches from whatever upstream
/// transport is in play; modeled as a trait so the monitor core carries
/// no transport dependency.
#[async_trait]
pub trait SensorSource: Send {
    async fn next_batch(&mut self) -> Option<(SensorNet, ListenerId)>;
}
