use std::sync::Arc;

use geodata::FeatureCollection;
use thematic::encode_collection;

use crate::backend::LayerUpdate;
use crate::generation::Generation;

pub(crate) const QUAKES: &str = r#"{
    "type": "FeatureCollection",
    "features": [{
        "type": "Feature",
        "geometry": { "type": "Point", "coordinates": [142.3, 38.1] },
        "properties": { "magnitude": 6.5, "location": "off the coast of Honshu" }
    }],
    "metadata": { "layer_type": "earthquakes", "feature_count": 1 }
}"#;

pub(crate) const WEATHER_GRID: &str = r#"{
    "type": "FeatureCollection",
    "features": [{
        "type": "Feature",
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[37.0, 55.0], [38.0, 55.0], [38.0, 56.0], [37.0, 56.0], [37.0, 55.0]]]
        },
        "properties": { "temperature": -15.0, "wind_speed": 20.0 }
    }],
    "metadata": { "layer_type": "weather", "feature_count": 1 }
}"#;

pub(crate) const ROADS: &str = r#"{
    "type": "FeatureCollection",
    "features": [{
        "type": "Feature",
        "geometry": { "type": "LineString", "coordinates": [[2.29, 48.86], [2.35, 48.85]] },
        "properties": { "highway": "motorway" }
    }],
    "metadata": { "layer_type": "roads", "feature_count": 1 }
}"#;

pub(crate) fn layer_update(json: &str, generation: u64) -> LayerUpdate {
    let collection = FeatureCollection::from_json_str(json).expect("test fixture parses");
    let (profile, encodings) = encode_collection(&collection);
    LayerUpdate {
        collection: Arc::new(collection),
        profile,
        encodings: encodings.into(),
        generation: Generation(generation),
    }
}
