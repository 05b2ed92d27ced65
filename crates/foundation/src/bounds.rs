use crate::lonlat::LonLat;

/// Geographic bounding box accumulated from feature coordinates.
///
/// Starts empty; `extend` grows it one vertex at a time. Non-finite
/// vertices are ignored so one malformed coordinate cannot poison the
/// whole accumulation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    pub const EMPTY: Self = Self {
        min_lon: f64::INFINITY,
        min_lat: f64::INFINITY,
        max_lon: f64::NEG_INFINITY,
        max_lat: f64::NEG_INFINITY,
    };

    pub fn extend(&mut self, lon: f64, lat: f64) {
        if !lon.is_finite() || !lat.is_finite() {
            return;
        }
        self.min_lon = self.min_lon.min(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lon = self.max_lon.max(lon);
        self.max_lat = self.max_lat.max(lat);
    }

    pub fn is_empty(&self) -> bool {
        self.min_lon > self.max_lon || self.min_lat > self.max_lat
    }

    /// A single point or a zero-area box. Framing falls back to an
    /// explicit coordinate target for these.
    pub fn is_degenerate(&self) -> bool {
        self.is_empty() || (self.max_lon - self.min_lon) * (self.max_lat - self.min_lat) <= 0.0
    }

    pub fn center(&self) -> Option<LonLat> {
        if self.is_empty() {
            return None;
        }
        Some(LonLat::new(
            (self.min_lon + self.max_lon) * 0.5,
            (self.min_lat + self.max_lat) * 0.5,
        ))
    }

    /// Approximate diagonal length in meters (1 degree ~ 111 km, longitude
    /// shrunk by the cosine of the mid latitude).
    pub fn diagonal_m(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let mid_lat = (self.min_lat + self.max_lat) * 0.5;
        let dx = (self.max_lon - self.min_lon) * mid_lat.to_radians().cos().abs();
        let dy = self.max_lat - self.min_lat;
        (dx * dx + dy * dy).sqrt() * 111_000.0
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::EMPTY
    }
}
