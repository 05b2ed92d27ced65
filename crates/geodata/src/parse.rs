use serde_json::{Map, Value, json};

use crate::feature::{Feature, FeatureCollection, Geometry};
use crate::metadata::LayerMetadata;
use crate::properties::{Properties, PropertyValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    NotAnObject,
    NotAFeatureCollection(String),
    MissingFeatures,
    Json(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::NotAnObject => write!(f, "payload is not a JSON object"),
            ParseError::NotAFeatureCollection(t) => {
                write!(f, "expected type FeatureCollection, got {t:?}")
            }
            ParseError::MissingFeatures => write!(f, "missing features array"),
            ParseError::Json(msg) => write!(f, "invalid JSON: {msg}"),
        }
    }
}

impl std::error::Error for ParseError {}

impl FeatureCollection {
    pub fn from_json_str(raw: &str) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| ParseError::Json(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Parse a GeoJSON feature collection.
    ///
    /// Structurally broken documents are errors; individually malformed or
    /// unsupported features are dropped so one bad feature cannot take the
    /// layer down. `feature_count` is normalized to the surviving count.
    pub fn from_value(value: &Value) -> Result<Self, ParseError> {
        let obj = value.as_object().ok_or(ParseError::NotAnObject)?;

        let kind = obj.get("type").and_then(Value::as_str).unwrap_or("");
        if kind != "FeatureCollection" {
            return Err(ParseError::NotAFeatureCollection(kind.to_string()));
        }

        let raw_features = obj
            .get("features")
            .and_then(Value::as_array)
            .ok_or(ParseError::MissingFeatures)?;

        let features = raw_features.iter().filter_map(feature_from_value).collect();

        let metadata = obj
            .get("metadata")
            .cloned()
            .and_then(|m| serde_json::from_value::<LayerMetadata>(m).ok())
            .unwrap_or_default();

        Ok(FeatureCollection::new(features, metadata))
    }

    /// Serialize back to GeoJSON, e.g. for saved-layer payloads.
    pub fn to_value(&self) -> Value {
        json!({
            "type": "FeatureCollection",
            "features": self.features.iter().map(feature_to_value).collect::<Vec<_>>(),
            "metadata": serde_json::to_value(&self.metadata).unwrap_or(Value::Null),
        })
    }
}

fn feature_from_value(value: &Value) -> Option<Feature> {
    let obj = value.as_object()?;
    let geometry = geometry_from_value(obj.get("geometry")?)?;
    let properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .map(properties_from_object)
        .unwrap_or_default();
    Some(Feature::new(geometry, properties))
}

fn geometry_from_value(value: &Value) -> Option<Geometry> {
    let obj = value.as_object()?;
    let coords = obj.get("coordinates")?;
    match obj.get("type").and_then(Value::as_str)? {
        "Point" => Some(Geometry::Point(pair(coords)?)),
        "LineString" => Some(Geometry::LineString(pairs(coords)?)),
        "Polygon" => Some(Geometry::Polygon(rings(coords)?)),
        "MultiPolygon" => {
            let polys = coords
                .as_array()?
                .iter()
                .map(rings)
                .collect::<Option<Vec<_>>>()?;
            Some(Geometry::MultiPolygon(polys))
        }
        _ => None,
    }
}

fn pair(value: &Value) -> Option<[f64; 2]> {
    let arr = value.as_array()?;
    // Trailing members (altitude) are tolerated and ignored.
    if arr.len() < 2 {
        return None;
    }
    Some([arr[0].as_f64()?, arr[1].as_f64()?])
}

fn pairs(value: &Value) -> Option<Vec<[f64; 2]>> {
    value.as_array()?.iter().map(pair).collect()
}

fn rings(value: &Value) -> Option<Vec<Vec<[f64; 2]>>> {
    value.as_array()?.iter().map(pairs).collect()
}

fn properties_from_object(obj: &Map<String, Value>) -> Properties {
    let mut props = Properties::new();
    for (key, value) in obj {
        let scalar = match value {
            Value::Number(n) => n.as_f64().map(PropertyValue::Number),
            Value::String(s) => Some(PropertyValue::Text(s.clone())),
            Value::Bool(b) => Some(PropertyValue::Text(b.to_string())),
            // Nested structures are not scalar properties; dropped.
            _ => None,
        };
        if let Some(v) = scalar {
            props.insert(key.clone(), v);
        }
    }
    props
}

fn feature_to_value(feature: &Feature) -> Value {
    let properties: Map<String, Value> = feature
        .properties
        .iter()
        .map(|(k, v)| {
            let value = match v {
                PropertyValue::Number(n) => json!(n),
                PropertyValue::Text(s) => json!(s),
            };
            (k.clone(), value)
        })
        .collect();

    let geometry = match &feature.geometry {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": p }),
        Geometry::LineString(pts) => json!({ "type": "LineString", "coordinates": pts }),
        Geometry::Polygon(r) => json!({ "type": "Polygon", "coordinates": r }),
        Geometry::MultiPolygon(p) => json!({ "type": "MultiPolygon", "coordinates": p }),
    };

    json!({ "type": "Feature", "geometry": geometry, "properties": properties })
}

#[cfg(test)]
mod tests {
    use super::ParseError;
    use crate::feature::{FeatureCollection, Geometry};
    use crate::properties::PropertyValue;

    const QUAKES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [142.3, 38.1, 29.0] },
                "properties": { "mag": 6.5, "place": "off the coast of Honshu" }
            },
            {
                "type": "Feature",
                "geometry": { "type": "GeometryCollection", "geometries": [] },
                "properties": {}
            }
        ],
        "metadata": { "layer_type": "earthquakes", "feature_count": 2, "source": "USGS" }
    }"#;

    #[test]
    fn parses_features_and_normalizes_count() {
        let fc = FeatureCollection::from_json_str(QUAKES).unwrap();
        // The unsupported GeometryCollection feature is dropped and the
        // declared feature_count repaired to match.
        assert_eq!(fc.len(), 1);
        assert_eq!(fc.metadata.feature_count, 1);
        assert_eq!(fc.metadata.layer_type.as_deref(), Some("earthquakes"));

        let feature = &fc.features[0];
        assert_eq!(feature.geometry, Geometry::Point([142.3, 38.1]));
        assert_eq!(
            feature.properties.get("mag"),
            Some(&PropertyValue::Number(6.5))
        );
    }

    #[test]
    fn rejects_non_collections() {
        let err = FeatureCollection::from_json_str(r#"{"type":"Feature"}"#).unwrap_err();
        assert_eq!(err, ParseError::NotAFeatureCollection("Feature".into()));

        let err = FeatureCollection::from_json_str("[1,2,3]").unwrap_err();
        assert_eq!(err, ParseError::NotAnObject);

        assert!(matches!(
            FeatureCollection::from_json_str("not json"),
            Err(ParseError::Json(_))
        ));
    }

    #[test]
    fn polygon_rings_round_trip() {
        let src = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,0.0]]]
                },
                "properties": { "temperature": -15.0 }
            }]
        }"#;
        let fc = FeatureCollection::from_json_str(src).unwrap();
        let back = FeatureCollection::from_value(&fc.to_value()).unwrap();
        assert_eq!(fc, back);
    }
}
