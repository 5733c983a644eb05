//! Alert-triggering policy.
//!
//! The policy decides, for one processed sample, whether a speeding alert
//! and/or a distance summary is due. It holds no per-stream state itself; the
//! tick it is asked about is supplied by the [`StreamSession`].
//!
//! [`StreamSession`]: crate::StreamSession

use crate::ParseScopeError;
use core::{fmt, num::NonZeroU64, str::FromStr};

/// Speed above which a speeding alert is raised, in km/h.
pub const DEFAULT_SPEED_LIMIT_KMH: f64 = 80.0;

/// A distance summary is considered every this many samples.
pub const DEFAULT_SUMMARY_INTERVAL: NonZeroU64 = NonZeroU64::new(10).unwrap();

/// Which counter drives the distance-summary cadence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CadenceScope {
    /// One counter for every sample on the stream, whatever vehicle sent it.
    /// Interleaved vehicles shift each other's summary slots.
    #[default]
    Global,
    /// One counter per vehicle id, so each vehicle reports on its own rhythm.
    PerVehicle,
}

impl CadenceScope {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::PerVehicle => "per-vehicle",
        }
    }
}

impl fmt::Display for CadenceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CadenceScope {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "per-vehicle" | "per_vehicle" => Ok(Self::PerVehicle),
            _ => Err(ParseScopeError {
                what: "cadence",
                value: s.to_string(),
                expected: "global, per-vehicle",
            }),
        }
    }
}

/// Thresholds applied to every sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlertPolicy {
    pub speed_limit_kmh: f64,
    pub summary_interval: NonZeroU64,
    pub cadence: CadenceScope,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            speed_limit_kmh: DEFAULT_SPEED_LIMIT_KMH,
            summary_interval: DEFAULT_SUMMARY_INTERVAL,
            cadence: CadenceScope::Global,
        }
    }
}

impl AlertPolicy {
    pub const fn with_speed_limit(mut self, speed_limit_kmh: f64) -> Self {
        self.speed_limit_kmh = speed_limit_kmh;
        self
    }

    pub const fn with_summary_interval(mut self, summary_interval: NonZeroU64) -> Self {
        self.summary_interval = summary_interval;
        self
    }

    pub const fn with_cadence(mut self, cadence: CadenceScope) -> Self {
        self.cadence = cadence;
        self
    }

    /// Strictly greater than the limit. NaN is never speeding.
    pub fn is_speeding(&self, speed: f64) -> bool {
        speed > self.speed_limit_kmh
    }

    /// Whether `tick` lands on a summary slot.
    pub const fn summary_due(&self, tick: u64) -> bool {
        tick % self.summary_interval.get() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speeding_threshold_is_exclusive() {
        let policy = AlertPolicy::default();
        assert!(!policy.is_speeding(80.0));
        assert!(policy.is_speeding(80.01));
        assert!(!policy.is_speeding(0.0));
        assert!(!policy.is_speeding(f64::NAN));
    }

    #[test]
    fn summary_slots_follow_interval() {
        let policy = AlertPolicy::default();
        let due: Vec<u64> = (0..35).filter(|t| policy.summary_due(*t)).collect();
        assert_eq!(due, vec![0, 10, 20, 30]);
    }

    #[test]
    fn interval_of_one_fires_every_tick() {
        let policy = AlertPolicy::default().with_summary_interval(NonZeroU64::MIN);
        assert!((0..5).all(|t| policy.summary_due(t)));
    }

    #[test]
    fn custom_interval_moves_the_slots() {
        let policy = AlertPolicy::default().with_summary_interval(NonZeroU64::new(4).unwrap());
        let due: Vec<u64> = (0..13).filter(|t| policy.summary_due(*t)).collect();
        assert_eq!(due, vec![0, 4, 8, 12]);
    }

    #[test]
    fn cadence_parses_from_cli_names() {
        assert_eq!("global".parse(), Ok(CadenceScope::Global));
        assert_eq!("Per-Vehicle".parse(), Ok(CadenceScope::PerVehicle));
        assert_eq!("per_vehicle".parse(), Ok(CadenceScope::PerVehicle));

        let err = "sometimes".parse::<CadenceScope>().unwrap_err();
        assert_eq!(err.value, "sometimes");
        assert_eq!(CadenceScope::PerVehicle.to_string(), "per-vehicle");
    }
}
