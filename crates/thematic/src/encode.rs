use foundation::Rgba;
use geodata::{Feature, FeatureCollection, first_display, first_number, first_text};

use crate::classify::classify;
use crate::profile::{Profile, Ramp, Theme, profile};

/// Concrete per-feature rendering attributes, derived from one profile.
///
/// Adapters translate these into their engine's own primitive vocabulary
/// but never re-decide color, elevation, or popup content.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualEncoding {
    pub fill: Rgba,
    pub stroke: Rgba,
    pub stroke_width: f32,
    pub elevation_m: Option<f64>,
    pub point_size_px: Option<f32>,
    pub popup_html: String,
}

/// Encode one feature under one profile. Total and deterministic: missing
/// properties fall back to profile constants, never to an error.
pub fn encode(feature: &Feature, profile: &Profile) -> VisualEncoding {
    let props = &feature.properties;

    let (fill, class_key) = match &profile.ramp {
        Ramp::Categorical { .. } => {
            let key = first_text(props, profile.drivers).unwrap_or("residential");
            (profile.ramp.color_for_key(key), Some(key.to_string()))
        }
        ramp => {
            let value = first_number(props, profile.drivers).unwrap_or(profile.driver_fallback);
            (ramp.color_for_number(value), None)
        }
    };

    let driving = first_number(props, profile.drivers).unwrap_or(profile.driver_fallback);

    let stroke_width = match &class_key {
        Some(key) => profile.stroke_width_for(key),
        None => profile.stroke_width,
    };

    VisualEncoding {
        fill,
        stroke: profile.stroke,
        stroke_width,
        elevation_m: profile.elevation.map(|rule| rule.meters(driving)),
        point_size_px: profile.point_size.map(|rule| rule.pixels(driving)),
        popup_html: popup(feature, profile.theme),
    }
}

/// Classify + encode a whole collection against the shared profile table.
/// Output order is 1:1 with the input features.
pub fn encode_collection(collection: &FeatureCollection) -> (&'static Profile, Vec<VisualEncoding>) {
    let theme = classify(collection.metadata.layer_type.as_deref());
    let profile = profile(theme);
    let encodings = collection
        .features
        .iter()
        .map(|f| encode(f, profile))
        .collect();
    (profile, encodings)
}

fn popup(feature: &Feature, theme: Theme) -> String {
    let props = &feature.properties;
    let mut lines: Vec<String> = Vec::new();

    match theme {
        Theme::Weather => {
            let temp = first_display(props, &["temperature", "temp"])
                .unwrap_or_else(|| "unknown".to_string());
            lines.push(format!("<strong>Temperature: {temp}&deg;C</strong>"));
            if let Some(wind) = first_display(props, &["wind_speed"]) {
                lines.push(format!("Wind: {wind} km/h"));
            }
        }
        Theme::Density => {
            let value = first_display(props, &["formatted", "value", "density"])
                .unwrap_or_else(|| "unknown".to_string());
            lines.push(format!("<strong>Population: {value}</strong>"));
            if let Some(region) = first_display(props, &["region"]) {
                lines.push(region);
            }
        }
        Theme::Earthquake => {
            let mag = first_display(props, &["magnitude", "mag"])
                .unwrap_or_else(|| "unknown".to_string());
            lines.push(format!("<strong>Magnitude {mag}</strong>"));
            if let Some(place) = first_display(props, &["location", "place"]) {
                lines.push(place);
            }
            if let Some(time) = first_display(props, &["time_readable"]) {
                lines.push(time);
            }
        }
        Theme::Roads => {
            let class = first_text(props, &["highway"]).unwrap_or("residential");
            lines.push(format!("<strong>{class}</strong>"));
            if let Some(name) = first_display(props, &["name"]) {
                lines.push(name);
            }
        }
        Theme::Country => {
            let name = first_display(props, &["country", "name"])
                .unwrap_or_else(|| "unknown".to_string());
            lines.push(format!("<strong>{name}</strong>"));
            if let Some(pop) = first_display(props, &["population"]) {
                lines.push(format!("Population: {pop}"));
            }
            if let Some(capital) = first_display(props, &["capital"]) {
                lines.push(format!("Capital: {capital}"));
            }
        }
        Theme::Vegetation | Theme::Hydrology | Theme::PointOfInterest | Theme::Default => {
            // No dedicated template: show the first few properties as-is.
            for (key, value) in props.iter().take(3) {
                lines.push(format!("<strong>{key}:</strong> {value}"));
            }
        }
    }

    format!("<div class=\"feature-popup\">{}</div>", lines.join("<br/>"))
}

#[cfg(test)]
mod tests {
    use super::{encode, encode_collection};
    use crate::profile::{Theme, profile};
    use foundation::Rgba;
    use geodata::{Feature, FeatureCollection, Geometry, LayerMetadata, PropertyValue};
    use std::collections::BTreeMap;

    fn feature(geometry: Geometry, pairs: &[(&str, PropertyValue)]) -> Feature {
        let props: BTreeMap<String, PropertyValue> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Feature::new(geometry, props)
    }

    #[test]
    fn magnitude_six_and_a_half_hits_the_top_bucket() {
        let f = feature(
            Geometry::Point([142.3, 38.1]),
            &[("magnitude", PropertyValue::Number(6.5))],
        );
        let e = encode(&f, profile(Theme::Earthquake));
        assert_eq!(e.fill, Rgba::with_alpha(0xff0000, 204));
        assert_eq!(e.point_size_px, Some(32.5));
        assert_eq!(e.elevation_m, Some(65_000.0));
        assert!(e.popup_html.contains("6.5"));
    }

    #[test]
    fn cold_polygon_gets_coldest_bucket_and_absolute_extrusion() {
        let f = feature(
            Geometry::Polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]),
            &[("temperature", PropertyValue::Number(-15.0))],
        );
        let e = encode(&f, profile(Theme::Weather));
        assert_eq!(e.fill, Rgba::with_alpha(0x0033ff, 179));
        assert_eq!(e.elevation_m, Some(15_000.0));
    }

    #[test]
    fn default_theme_ignores_properties_entirely() {
        let hot = feature(
            Geometry::Point([0.0, 0.0]),
            &[("temperature", PropertyValue::Number(45.0))],
        );
        let cold = feature(
            Geometry::Point([0.0, 0.0]),
            &[("temperature", PropertyValue::Number(-40.0))],
        );
        let p = profile(Theme::Default);
        assert_eq!(encode(&hot, p).fill, encode(&cold, p).fill);
        assert_eq!(encode(&hot, p).fill, Rgba::with_alpha(0x64c8ff, 179));
    }

    #[test]
    fn encoding_is_deterministic() {
        let f = feature(
            Geometry::Point([10.0, 10.0]),
            &[("mag", PropertyValue::Number(4.7))],
        );
        let p = profile(Theme::Earthquake);
        assert_eq!(encode(&f, p), encode(&f, p));
    }

    #[test]
    fn missing_driver_uses_the_profile_fallback() {
        // No temperature property: the 20.0 fallback lands in the 20..30 bucket.
        let f = feature(Geometry::Polygon(vec![vec![[0.0, 0.0]]]), &[]);
        let e = encode(&f, profile(Theme::Weather));
        assert_eq!(e.fill, Rgba::with_alpha(0xffff00, 179));
        assert!(e.popup_html.contains("unknown"));
    }

    #[test]
    fn road_class_drives_color_and_width() {
        let f = feature(
            Geometry::LineString(vec![[0.0, 0.0], [1.0, 1.0]]),
            &[("highway", PropertyValue::Text("motorway".into()))],
        );
        let e = encode(&f, profile(Theme::Roads));
        assert_eq!(e.fill, Rgba::with_alpha(0xff0066, 230));
        assert_eq!(e.stroke_width, 5.0);
        assert!(e.elevation_m.is_none());
    }

    #[test]
    fn collection_encoding_is_aligned_one_to_one() {
        let features = vec![
            feature(
                Geometry::Point([1.0, 1.0]),
                &[("magnitude", PropertyValue::Number(6.5))],
            ),
            feature(
                Geometry::Point([2.0, 2.0]),
                &[("magnitude", PropertyValue::Number(3.0))],
            ),
        ];
        let fc = FeatureCollection::new(
            features,
            LayerMetadata {
                layer_type: Some("earthquakes".into()),
                ..LayerMetadata::default()
            },
        );
        let (p, encodings) = encode_collection(&fc);
        assert_eq!(p.theme, Theme::Earthquake);
        assert_eq!(encodings.len(), 2);
        assert_ne!(encodings[0].fill, encodings[1].fill);
    }
}
