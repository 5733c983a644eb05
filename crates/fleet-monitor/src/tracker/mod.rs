//! Per-vehicle state: last known position and cumulative distance.
//!
//! [`VehicleTracker`] is a plain owned map. Whether a stream gets its own
//! tracker or joins a process-wide one is decided by [`TrackerScope`] and
//! expressed through [`TrackerHandle`], which hands out `&mut VehicleTracker`
//! for the duration of a single sample either way.
//!
//! Entries are never evicted. A tracker grows with the number of distinct
//! vehicle ids it has seen and is released together with its owner.

#[cfg(test)]
mod tests;

use crate::{ParseScopeError, Position};
use core::{fmt, str::FromStr};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};

/// What the monitor remembers about one vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleState {
    pub last_latitude: f64,
    pub last_longitude: f64,
    pub cumulative_distance_km: f64,
}

impl VehicleState {
    pub const fn last_position(&self) -> Position {
        Position::new(self.last_latitude, self.last_longitude)
    }
}

/// Map from vehicle id to [`VehicleState`].
#[derive(Clone, Debug, Default)]
pub struct VehicleTracker {
    vehicles: HashMap<String, VehicleState>,
}

impl VehicleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored state, or `None` if no sample has been recorded for
    /// `vehicle_id`.
    pub fn lookup(&self, vehicle_id: &str) -> Option<VehicleState> {
        self.vehicles.get(vehicle_id).copied()
    }

    /// Moves `vehicle_id` to the given position and adds `distance_delta` to
    /// its running total. A vehicle seen for the first time starts with a
    /// total of `distance_delta`.
    pub fn record(&mut self, vehicle_id: &str, latitude: f64, longitude: f64, distance_delta: f64) {
        match self.vehicles.get_mut(vehicle_id) {
            Some(state) => {
                state.last_latitude = latitude;
                state.last_longitude = longitude;
                state.cumulative_distance_km += distance_delta;
            }
            None => {
                self.vehicles.insert(
                    vehicle_id.to_owned(),
                    VehicleState {
                        last_latitude: latitude,
                        last_longitude: longitude,
                        cumulative_distance_km: distance_delta,
                    },
                );
            }
        }
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VehicleState)> {
        self.vehicles.iter().map(|(id, state)| (id.as_str(), state))
    }
}

/// A [`VehicleTracker`] shared between streams.
///
/// Cloning is cheap and yields a handle to the same map.
#[derive(Clone, Debug, Default)]
pub struct SharedTracker {
    inner: Arc<Mutex<VehicleTracker>>,
}

impl SharedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with exclusive access to the tracker.
    pub fn with<R>(&self, f: impl FnOnce(&mut VehicleTracker) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut *guard)
    }

    pub fn lookup(&self, vehicle_id: &str) -> Option<VehicleState> {
        self.inner.lock().lookup(vehicle_id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Where a stream keeps its vehicle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrackerScope {
    /// Each stream owns a private tracker that is dropped with the stream. A
    /// vehicle that reconnects starts again from zero.
    #[default]
    PerStream,
    /// All streams update one process-wide tracker. A vehicle keeps its total
    /// across reconnects and across concurrent streams.
    Shared,
}

impl TrackerScope {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PerStream => "per-stream",
            Self::Shared => "shared",
        }
    }
}

impl fmt::Display for TrackerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackerScope {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-stream" | "per_stream" => Ok(Self::PerStream),
            "shared" => Ok(Self::Shared),
            _ => Err(ParseScopeError {
                what: "tracker scope",
                value: s.to_string(),
                expected: "per-stream, shared",
            }),
        }
    }
}

/// The tracker a single stream writes to.
#[derive(Debug)]
pub enum TrackerHandle {
    Owned(VehicleTracker),
    Shared(SharedTracker),
}

impl TrackerHandle {
    /// Runs `f` against the underlying tracker. For a shared tracker the lock
    /// is held for the whole call, so a lookup followed by a record inside `f`
    /// cannot interleave with another stream.
    pub fn with<R>(&mut self, f: impl FnOnce(&mut VehicleTracker) -> R) -> R {
        match self {
            Self::Owned(tracker) => f(tracker),
            Self::Shared(shared) => shared.with(f),
        }
    }

    pub fn lookup(&mut self, vehicle_id: &str) -> Option<VehicleState> {
        self.with(|tracker| tracker.lookup(vehicle_id))
    }
}

impl From<VehicleTracker> for TrackerHandle {
    fn from(tracker: VehicleTracker) -> Self {
        Self::Owned(tracker)
    }
}

impl From<SharedTracker> for TrackerHandle {
    fn from(shared: SharedTracker) -> Self {
        Self::Shared(shared)
    }
}
