//! Great-circle distance between two GPS fixes.

/// Mean Earth radius used by [`haversine_km`], in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Returns the haversine distance in kilometers between `from` and `to`.
///
/// The central angle is computed as `2 * asin(sqrt(a))` where
/// `a = sin²(Δlat/2) + cos(lat1)·cos(lat2)·sin²(Δlon/2)`. Inputs are not
/// validated: out-of-range degrees still produce a number, and NaN inputs
/// propagate to a NaN result.
///
/// # Example
///
/// ```
/// use fleet_monitor::{haversine_km, Position};
///
/// let here = Position::new(40.0, -74.0);
/// assert_eq!(haversine_km(here, here), 0.0);
/// ```
pub fn haversine_km(from: Position, to: Position) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}
