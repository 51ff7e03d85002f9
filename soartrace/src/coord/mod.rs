//! Geographic coordinate types and distance approximation.
//!
//! Provides the `GeoPoint` type shared by the trace stores and the flight
//! log writer, plus a flat-earth distance approximation that is cheap
//! enough to run inside the trace decimation loop. For the short
//! inter-sample distances involved (seconds of flight) the flat-earth
//! model is accurate to well under a metre.

/// Approximate metres per degree of latitude (WGS-84 mean).
const METRES_PER_DEGREE: f64 = 111_320.0;

/// A geographic location in decimal degrees.
///
/// Positive latitude is north, positive longitude is east.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees (-90.0 to 90.0).
    pub latitude: f64,
    /// Longitude in degrees (-180.0 to 180.0).
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new geographic point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Approximate distance in metres to another point.
    ///
    /// Uses a flat-earth projection centred between the two points.
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        let ref_lat = (self.latitude + other.latitude) * 0.5;
        distance_at(ref_lat, self, other)
    }
}

/// Approximate distance in metres between two points, projected onto a
/// flat plane whose longitude scale is fixed by `ref_lat_deg`.
///
/// Filtered trace snapshots pass the query origin's latitude here so that
/// every pairwise distance in one pass uses the same projection.
pub fn distance_at(ref_lat_deg: f64, a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lon_scale = ref_lat_deg.to_radians().cos();
    let dlat = (b.latitude - a.latitude) * METRES_PER_DEGREE;
    let dlon = (b.longitude - a.longitude) * METRES_PER_DEGREE * lon_scale;
    (dlat * dlat + dlon * dlon).sqrt()
}
