//! Synthetic telemetry source.
//!
//! [`TelemetryProducer`] simulates a single vehicle wandering around a
//! starting point. It is an endless [`Iterator`], so callers decide how many
//! samples to pull and at what pace. With a fixed seed the sequence is fully
//! reproducible, and [`TelemetryProducer::reset`] replays it from the start.

use crate::{Position, TelemetrySample};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Where simulated vehicles start.
pub const DEFAULT_ORIGIN: Position = Position::new(16.0, 20.0);

/// Largest per-step change applied to latitude and longitude, in degrees.
pub const DEFAULT_JITTER_DEG: f64 = 0.01;

/// Inclusive range of simulated speeds, in km/h.
pub const DEFAULT_SPEED_RANGE_KMH: (u32, u32) = (40, 100);

/// Endless, seedable generator of [`TelemetrySample`]s for one vehicle.
#[derive(Clone, Debug)]
pub struct TelemetryProducer {
    vehicle_id: String,
    origin: Position,
    position: Position,
    seed: u64,
    rng: StdRng,
}

impl TelemetryProducer {
    /// Creates a producer seeded from the thread-local RNG.
    pub fn new(vehicle_id: impl Into<String>) -> Self {
        Self::with_seed(vehicle_id, rand::rng().random())
    }

    pub fn with_seed(vehicle_id: impl Into<String>, seed: u64) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            origin: DEFAULT_ORIGIN,
            position: DEFAULT_ORIGIN,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Moves the starting point and restarts the walk from it.
    pub fn with_origin(mut self, origin: Position) -> Self {
        self.origin = origin;
        self.reset();
        self
    }

    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Rewinds to the origin and the initial RNG state.
    pub fn reset(&mut self) {
        self.position = self.origin;
        self.rng = StdRng::seed_from_u64(self.seed);
    }
}

impl Iterator for TelemetryProducer {
    type Item = TelemetrySample;

    fn next(&mut self) -> Option<Self::Item> {
        self.position.latitude += self
            .rng
            .random_range(-DEFAULT_JITTER_DEG..DEFAULT_JITTER_DEG);
        self.position.longitude += self
            .rng
            .random_range(-DEFAULT_JITTER_DEG..DEFAULT_JITTER_DEG);
        let (min, max) = DEFAULT_SPEED_RANGE_KMH;
        let speed = self.rng.random_range(min..=max);

        Some(TelemetrySample {
            vehicle_id: self.vehicle_id.clone(),
            latitude: self.position.latitude,
            longitude: self.position.longitude,
            speed: f64::from(speed),
        })
    }
}
