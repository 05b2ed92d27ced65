use crate::lonlat::LonLat;

/// Altitude at which zoom level 0 shows the whole world; each zoom level
/// halves it.
const ZOOM0_ALTITUDE_M: f64 = 20_000_000.0;

const MAX_ZOOM: f64 = 19.0;

/// Normalized web-mercator world coordinate in [0, 1] x [0, 1].
///
/// Latitude is clamped to the mercator limit so poles do not produce
/// infinities.
pub fn project(pos: LonLat) -> [f64; 2] {
    let x = (pos.lon + 180.0) / 360.0;
    let lat = pos.lat.clamp(-85.051_128, 85.051_128).to_radians();
    let y = 0.5 - ((std::f64::consts::FRAC_PI_4 + lat * 0.5).tan().ln()) / (2.0 * std::f64::consts::PI);
    [x, y]
}

/// Map a camera altitude to an equivalent tile zoom level.
pub fn zoom_for_altitude(altitude_m: f64) -> f64 {
    (ZOOM0_ALTITUDE_M / altitude_m.max(1.0)).log2().clamp(0.0, MAX_ZOOM)
}
