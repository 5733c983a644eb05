use crate::Position;

/// One position/speed observation reported by a vehicle.
///
/// Fields are taken as reported. Coordinates are expected in degrees and speed
/// in km/h, but nothing here rejects out-of-range or NaN values.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TelemetrySample {
    pub vehicle_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f64,
}

impl TelemetrySample {
    pub fn new(vehicle_id: impl Into<String>, latitude: f64, longitude: f64, speed: f64) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            latitude,
            longitude,
            speed,
        }
    }

    pub const fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }
}
