//! # Wire and Domain Conversions
//!
//! The protobuf messages are kept deliberately small: `TelemetryData` carries
//! an integer speed and `Alert` carries only a rendered message. This module
//! converts them to and from the richer [`fleet_monitor`] types so that the
//! server logic never touches generated structs directly.
//!
//! ## Constants
//!
//! - [`DEFAULT_SERVER_ADDR`] - Address the server binds by default.
//! - [`DEFAULT_SERVER_URL`] - URL the client connects to by default.

use crate::proto;
use fleet_monitor::{Alert, TelemetrySample};

/// Default listen address for the server.
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:50051";

/// Default endpoint for clients running on the same host.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:50051";

impl From<proto::TelemetryData> for TelemetrySample {
    fn from(data: proto::TelemetryData) -> Self {
        Self {
            vehicle_id: data.van_id,
            latitude: data.latitude,
            longitude: data.longitude,
            speed: f64::from(data.speed),
        }
    }
}

impl From<&TelemetrySample> for proto::TelemetryData {
    /// Speed is rounded to whole km/h; NaN becomes 0 and out-of-range values
    /// saturate.
    fn from(sample: &TelemetrySample) -> Self {
        Self {
            van_id: sample.vehicle_id.clone(),
            latitude: sample.latitude,
            longitude: sample.longitude,
            speed: sample.speed.round() as i32,
        }
    }
}

impl From<&Alert> for proto::Alert {
    fn from(alert: &Alert) -> Self {
        Self {
            message: alert.message(),
        }
    }
}
