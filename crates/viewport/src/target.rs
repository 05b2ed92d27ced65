use foundation::LonLat;
use geodata::FeatureCollection;
use thematic::Profile;

/// Conservative altitude used when framing an explicit coordinate with no
/// usable geometry behind it.
pub const FALLBACK_ALTITUDE_M: f64 = 500_000.0;

const MAX_ALTITUDE_M: f64 = 20_000_000.0;

/// Extra room around the bounds so geometry is not flush with the viewport
/// edge.
const PADDING_FACTOR: f64 = 1.2;

const BOUNDS_DURATION_MS: u32 = 1_500;
const EXPLICIT_DURATION_MS: u32 = 2_000;

/// Computed viewpoint applied to every active backend adapter. 2D adapters
/// convert the altitude to a zoom level themselves.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraTarget {
    pub center: LonLat,
    pub altitude_m: f64,
    pub duration_ms: u32,
}

impl CameraTarget {
    /// Targets built from untrusted payloads must be finite before an
    /// adapter applies them.
    pub fn is_valid(&self) -> bool {
        self.center.is_finite() && self.altitude_m.is_finite() && self.altitude_m > 0.0
    }
}

/// Derive the camera target for one update cycle.
///
/// The bounding region of the rendered collection takes precedence; an
/// explicit coordinate is the fallback when geometry is absent or
/// degenerate. With neither, the camera stays where it is (`None`).
pub fn target_for(
    collection: Option<&FeatureCollection>,
    explicit: Option<LonLat>,
    profile: &Profile,
) -> Option<CameraTarget> {
    if let Some(fc) = collection {
        let bounds = fc.bounds();
        if !bounds.is_degenerate() {
            let center = bounds.center()?;
            let altitude_m = (bounds.diagonal_m() * PADDING_FACTOR)
                .clamp(profile.framing_floor_m, MAX_ALTITUDE_M);
            return Some(CameraTarget {
                center,
                altitude_m,
                duration_ms: BOUNDS_DURATION_MS,
            });
        }
    }

    let center = explicit.filter(LonLat::is_finite)?;
    Some(CameraTarget {
        center,
        altitude_m: FALLBACK_ALTITUDE_M,
        duration_ms: EXPLICIT_DURATION_MS,
    })
}

#[cfg(test)]
mod tests {
    use super::{CameraTarget, FALLBACK_ALTITUDE_M, target_for};
    use foundation::LonLat;
    use geodata::{Feature, FeatureCollection, Geometry, LayerMetadata};
    use std::collections::BTreeMap;

    fn grid_collection(layer_type: &str) -> FeatureCollection {
        let ring = vec![[37.0, 55.0], [38.0, 55.0], [38.0, 56.0], [37.0, 55.0]];
        FeatureCollection::new(
            vec![Feature::new(Geometry::Polygon(vec![ring]), BTreeMap::new())],
            LayerMetadata {
                layer_type: Some(layer_type.to_string()),
                ..LayerMetadata::default()
            },
        )
    }

    #[test]
    fn bounds_take_precedence_over_explicit_coordinate() {
        let fc = grid_collection("weather");
        let profile = thematic::profile(thematic::Theme::Weather);
        let target = target_for(Some(&fc), Some(LonLat::new(0.0, 0.0)), profile).unwrap();
        assert!((target.center.lon - 37.5).abs() < 1e-9);
        assert!((target.center.lat - 55.5).abs() < 1e-9);
        assert_eq!(target.duration_ms, 1_500);
    }

    #[test]
    fn empty_collection_falls_back_to_explicit_coordinate() {
        let fc = FeatureCollection::new(Vec::new(), LayerMetadata::default());
        let profile = thematic::profile(thematic::Theme::Default);
        let target = target_for(Some(&fc), Some(LonLat::new(139.7, 35.7)), profile).unwrap();
        assert_eq!(target.altitude_m, FALLBACK_ALTITUDE_M);
        assert_eq!(target.duration_ms, 2_000);
        assert!((target.center.lon - 139.7).abs() < 1e-12);
    }

    #[test]
    fn single_point_is_degenerate_and_uses_the_fallback_path() {
        let fc = FeatureCollection::new(
            vec![Feature::new(Geometry::Point([10.0, 10.0]), BTreeMap::new())],
            LayerMetadata::default(),
        );
        let profile = thematic::profile(thematic::Theme::Default);
        assert!(target_for(Some(&fc), None, profile).is_none());
        let target = target_for(Some(&fc), Some(LonLat::new(10.0, 10.0)), profile).unwrap();
        assert_eq!(target.altitude_m, FALLBACK_ALTITUDE_M);
    }

    #[test]
    fn profile_floor_keeps_small_extents_from_zooming_in_too_far() {
        let fc = grid_collection("roads");
        let roads = thematic::profile(thematic::Theme::Roads);
        let country = thematic::profile(thematic::Theme::Country);
        let near = target_for(Some(&fc), None, roads).unwrap();
        let far = target_for(Some(&fc), None, country).unwrap();
        // Same geometry, but the country profile frames from much higher.
        assert!(far.altitude_m >= country.framing_floor_m);
        assert!(near.altitude_m < far.altitude_m);
    }

    #[test]
    fn non_finite_explicit_coordinates_are_rejected() {
        let profile = thematic::profile(thematic::Theme::Default);
        assert!(target_for(None, Some(LonLat::new(f64::NAN, 0.0)), profile).is_none());
        assert!(target_for(None, None, profile).is_none());
    }

    #[test]
    fn validity_check_covers_altitude() {
        let bad = CameraTarget {
            center: LonLat::new(0.0, 0.0),
            altitude_m: f64::NAN,
            duration_ms: 1_000,
        };
        assert!(!bad.is_valid());
    }
}
