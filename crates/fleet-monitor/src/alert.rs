//! Alerts raised while processing a telemetry stream.
//!
//! An [`Alert`] keeps a typed [`AlertKind`] so callers can inspect the numbers
//! that triggered it. Its [`Display`](core::fmt::Display) output is the
//! human-readable message sent to clients.

use core::fmt;

/// What triggered an [`Alert`], along with the values it reports.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum AlertKind {
    /// The reported speed exceeded the configured limit.
    Speeding { speed_kmh: f64 },
    /// Periodic report of the last leg and the running total.
    DistanceSummary { delta_km: f64, total_km: f64 },
}

impl AlertKind {
    /// Short, stable label used for metric attributes and structured logs.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Speeding { .. } => "speeding",
            Self::DistanceSummary { .. } => "distance_summary",
        }
    }
}

/// A message addressed back to the reporting client.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alert {
    pub vehicle_id: String,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: AlertKind,
}

impl Alert {
    pub fn speeding(vehicle_id: impl Into<String>, speed_kmh: f64) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            kind: AlertKind::Speeding { speed_kmh },
        }
    }

    pub fn distance_summary(vehicle_id: impl Into<String>, delta_km: f64, total_km: f64) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            kind: AlertKind::DistanceSummary { delta_km, total_km },
        }
    }

    /// Renders the wire message for this alert.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AlertKind::Speeding { speed_kmh } => {
                write!(
                    f,
                    "Speeding alert for {}: {speed_kmh:.2} KM/h",
                    self.vehicle_id
                )
            }
            AlertKind::DistanceSummary { delta_km, total_km } => write!(
                f,
                "{} moved {delta_km:.2} KM (Total:{total_km:.2} KM)",
                self.vehicle_id
            ),
        }
    }
}
