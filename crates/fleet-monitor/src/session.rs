//! The per-stream state machine.
//!
//! A [`StreamSession`] is created when a client opens a telemetry stream and is
//! fed one [`TelemetrySample`] at a time. For every sample it:
//!
//! 1. looks up the vehicle's previous fix and measures the leg to the new one,
//! 2. raises a speeding alert if the reported speed is over the limit,
//! 3. raises a distance summary if the vehicle had a previous fix, the cadence
//!    counter lands on a summary slot, and the leg is non-zero,
//! 4. records the new position and running total,
//! 5. advances the cadence counter.
//!
//! The alerts are returned in that order and must be delivered before the next
//! sample is observed.

use crate::{
    Alert, AlertPolicy, CadenceScope, TelemetrySample, TrackerHandle, VehicleTracker, haversine_km,
};
use std::collections::HashMap;

/// What a single call to [`StreamSession::observe`] produced.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    /// Distance from the vehicle's previous fix, or `0.0` for a first fix.
    pub distance_delta_km: f64,
    /// Running total after this sample.
    pub total_distance_km: f64,
    /// Alerts to emit, speeding first.
    pub alerts: Vec<Alert>,
}

/// State carried across one telemetry stream.
#[derive(Debug)]
pub struct StreamSession {
    tracker: TrackerHandle,
    policy: AlertPolicy,
    samples_seen: u64,
    // Only populated for `CadenceScope::PerVehicle`.
    vehicle_ticks: HashMap<String, u64>,
}

impl StreamSession {
    pub fn new(tracker: impl Into<TrackerHandle>, policy: AlertPolicy) -> Self {
        Self {
            tracker: tracker.into(),
            policy,
            samples_seen: 0,
            vehicle_ticks: HashMap::new(),
        }
    }

    /// A session with a private tracker and the default policy.
    pub fn standalone() -> Self {
        Self::new(VehicleTracker::new(), AlertPolicy::default())
    }

    /// Number of samples observed so far on this stream.
    pub const fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    pub const fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    pub fn tracker_mut(&mut self) -> &mut TrackerHandle {
        &mut self.tracker
    }

    /// Processes one sample and returns the alerts it triggers.
    ///
    /// Never fails: NaN or out-of-range input flows through the arithmetic and
    /// shows up in the returned figures and alert text.
    pub fn observe(&mut self, sample: &TelemetrySample) -> Observation {
        let tick = match self.policy.cadence {
            CadenceScope::Global => self.samples_seen,
            CadenceScope::PerVehicle => self
                .vehicle_ticks
                .get(&sample.vehicle_id)
                .copied()
                .unwrap_or(0),
        };

        let policy = &self.policy;
        let observation = self
            .tracker
            .with(|tracker| apply_sample(tracker, policy, tick, sample));

        self.samples_seen += 1;
        if self.policy.cadence == CadenceScope::PerVehicle {
            *self
                .vehicle_ticks
                .entry(sample.vehicle_id.clone())
                .or_insert(0) += 1;
        }

        observation
    }
}

fn apply_sample(
    tracker: &mut VehicleTracker,
    policy: &AlertPolicy,
    tick: u64,
    sample: &TelemetrySample,
) -> Observation {
    let prior = tracker.lookup(&sample.vehicle_id);

    let distance_delta_km = prior.map_or(0.0, |state| {
        haversine_km(state.last_position(), sample.position())
    });
    let prior_total = prior.map_or(0.0, |state| state.cumulative_distance_km);
    let total_distance_km = prior_total + distance_delta_km;

    let mut alerts = Vec::with_capacity(2);

    if policy.is_speeding(sample.speed) {
        alerts.push(Alert::speeding(&sample.vehicle_id, sample.speed));
    }

    if prior.is_some() && policy.summary_due(tick) && distance_delta_km > 0.0 {
        alerts.push(Alert::distance_summary(
            &sample.vehicle_id,
            distance_delta_km,
            total_distance_km,
        ));
    }

    tracker.record(
        &sample.vehicle_id,
        sample.latitude,
        sample.longitude,
        distance_delta_km,
    );

    Observation {
        distance_delta_km,
        total_distance_km,
        alerts,
    }
}
