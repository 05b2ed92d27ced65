//! Vector-tile style backend: the engine is driven by a style document of
//! GeoJSON sources plus paint layers whose properties read the resolved
//! encoding off each feature (`["get", "fill_color"]` and friends).

use std::collections::BTreeMap;

use foundation::math::mercator;
use foundation::LonLat;
use geodata::GeometryKind;
use serde_json::{Value, json};
use tracing::debug;
use viewport::CameraTarget;

use crate::backend::{LayerUpdate, RenderBackend, RenderError, checked_target};
use crate::generation::{Generation, PendingLoad};

#[derive(Debug, Clone, PartialEq)]
pub struct StyleLayer {
    pub id: String,
    pub source: String,
    /// Engine layer kind: "fill", "line", or "circle".
    pub kind: &'static str,
    pub paint: Value,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FlyTo {
    pub center: LonLat,
    pub zoom: f64,
    pub duration_ms: u32,
}

/// The engine instance this adapter exclusively owns.
#[derive(Debug, Default)]
pub struct StyleMap {
    pub sources: BTreeMap<String, Value>,
    pub layers: Vec<StyleLayer>,
    pub camera: Option<FlyTo>,
}

#[derive(Debug)]
struct StagedStyle {
    source_id: String,
    geojson: Value,
    layers: Vec<StyleLayer>,
}

/// Source loads go through the engine's async load path: staged with a
/// generation tag, committed by `resolve_loads` only while still current.
#[derive(Debug, Default)]
pub struct VectorTileAdapter {
    engine: Option<StyleMap>,
    pending: Vec<PendingLoad<StagedStyle>>,
    current: Option<Generation>,
}

impl VectorTileAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style(&self) -> Option<&StyleMap> {
        self.engine.as_ref()
    }

    fn stage(update: &LayerUpdate) -> StagedStyle {
        let source_id = format!("data-{}", update.generation.0);

        // Bake the resolved encoding into feature properties so paint
        // expressions stay data-driven without re-deriving any ramp.
        let mut geojson = update.collection.to_value();
        if let Some(features) = geojson
            .get_mut("features")
            .and_then(Value::as_array_mut)
        {
            for (feature, encoding) in features.iter_mut().zip(update.encodings.iter()) {
                if let Some(props) = feature
                    .get_mut("properties")
                    .and_then(Value::as_object_mut)
                {
                    props.insert("fill_color".into(), json!(encoding.fill.css_rgba()));
                    props.insert("stroke_color".into(), json!(encoding.stroke.css_rgba()));
                    props.insert("stroke_width".into(), json!(encoding.stroke_width));
                    if let Some(radius) = encoding.point_size_px {
                        props.insert("circle_radius".into(), json!(radius));
                    }
                    if let Some(elevation) = encoding.elevation_m {
                        props.insert("extrusion_height".into(), json!(elevation));
                    }
                }
            }
        }

        let mut kinds = [false; 3];
        for feature in &update.collection.features {
            match feature.geometry.kind() {
                GeometryKind::Point => kinds[0] = true,
                GeometryKind::Line => kinds[1] = true,
                GeometryKind::Area => kinds[2] = true,
            }
        }

        let mut layers = Vec::new();
        if kinds[2] {
            layers.push(StyleLayer {
                id: format!("{source_id}-fill"),
                source: source_id.clone(),
                kind: "fill",
                paint: json!({
                    "fill-color": ["get", "fill_color"],
                }),
            });
            layers.push(StyleLayer {
                id: format!("{source_id}-outline"),
                source: source_id.clone(),
                kind: "line",
                paint: json!({
                    "line-color": ["get", "stroke_color"],
                    "line-width": ["get", "stroke_width"],
                }),
            });
        }
        if kinds[1] {
            layers.push(StyleLayer {
                id: format!("{source_id}-line"),
                source: source_id.clone(),
                kind: "line",
                paint: json!({
                    "line-color": ["get", "fill_color"],
                    "line-width": ["get", "stroke_width"],
                }),
            });
        }
        if kinds[0] {
            layers.push(StyleLayer {
                id: format!("{source_id}-circle"),
                source: source_id.clone(),
                kind: "circle",
                paint: json!({
                    "circle-radius": ["get", "circle_radius"],
                    "circle-color": ["get", "fill_color"],
                    "circle-stroke-color": ["get", "stroke_color"],
                    "circle-stroke-width": ["get", "stroke_width"],
                }),
            });
        }

        StagedStyle {
            source_id,
            geojson,
            layers,
        }
    }
}

impl RenderBackend for VectorTileAdapter {
    fn name(&self) -> &'static str {
        "vector-tile"
    }

    fn initialize(&mut self) -> Result<(), RenderError> {
        if self.engine.is_none() {
            self.engine = Some(StyleMap::default());
        }
        Ok(())
    }

    fn apply_layer(&mut self, update: Option<&LayerUpdate>) -> Result<(), RenderError> {
        let Some(engine) = self.engine.as_mut() else {
            return Err(RenderError::EngineUnavailable);
        };

        match update {
            None => {
                engine.sources.clear();
                engine.layers.clear();
                self.pending.clear();
                self.current = None;
            }
            Some(update) => {
                self.current = Some(update.generation);
                self.pending.push(PendingLoad {
                    generation: update.generation,
                    payload: Self::stage(update),
                });
            }
        }
        Ok(())
    }

    fn resolve_loads(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            self.pending.clear();
            return;
        };

        for load in self.pending.drain(..) {
            if Some(load.generation) != self.current {
                debug!(
                    adapter = "vector-tile",
                    generation = load.generation.0,
                    "discarding stale source load"
                );
                continue;
            }
            // Previous source and its layers are removed before the new
            // ones land; the surface never shows both.
            engine.sources.clear();
            engine.layers.clear();
            engine
                .sources
                .insert(load.payload.source_id.clone(), load.payload.geojson);
            engine.layers = load.payload.layers;
        }
    }

    fn frame_camera(&mut self, target: &CameraTarget) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if let Some(target) = checked_target("vector-tile", target) {
            engine.camera = Some(FlyTo {
                center: target.center,
                zoom: mercator::zoom_for_altitude(target.altitude_m),
                duration_ms: target.duration_ms,
            });
        }
    }

    fn teardown(&mut self) {
        self.engine = None;
        self.pending.clear();
        self.current = None;
    }

    fn primitive_count(&self) -> usize {
        self.engine.as_ref().map(|e| e.layers.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::VectorTileAdapter;
    use crate::backend::RenderBackend;
    use crate::testutil::{QUAKES, WEATHER_GRID, layer_update};

    #[test]
    fn staged_source_carries_baked_paint_properties() {
        let mut adapter = VectorTileAdapter::new();
        adapter.initialize().unwrap();
        adapter.apply_layer(Some(&layer_update(WEATHER_GRID, 7))).unwrap();
        adapter.resolve_loads();

        let style = adapter.style().unwrap();
        let source = style.sources.get("data-7").unwrap();
        let props = &source["features"][0]["properties"];
        assert_eq!(
            props["fill_color"].as_str(),
            Some("rgba(0, 51, 255, 0.70)")
        );

        let ids: Vec<&str> = style.layers.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["data-7-fill", "data-7-outline"]);
        assert_eq!(style.layers[0].paint["fill-color"][1], "fill_color");
    }

    #[test]
    fn point_collections_build_a_circle_layer() {
        let mut adapter = VectorTileAdapter::new();
        adapter.initialize().unwrap();
        adapter.apply_layer(Some(&layer_update(QUAKES, 1))).unwrap();
        adapter.resolve_loads();

        let style = adapter.style().unwrap();
        assert_eq!(style.layers.len(), 1);
        assert_eq!(style.layers[0].kind, "circle");
    }

    #[test]
    fn stale_source_load_never_lands() {
        let mut adapter = VectorTileAdapter::new();
        adapter.initialize().unwrap();
        adapter.apply_layer(Some(&layer_update(WEATHER_GRID, 1))).unwrap();
        adapter.apply_layer(Some(&layer_update(QUAKES, 2))).unwrap();
        adapter.resolve_loads();

        let style = adapter.style().unwrap();
        assert_eq!(style.sources.len(), 1);
        assert!(style.sources.contains_key("data-2"));
    }

    #[test]
    fn clear_empties_sources_and_layers() {
        let mut adapter = VectorTileAdapter::new();
        adapter.initialize().unwrap();
        adapter.apply_layer(Some(&layer_update(QUAKES, 1))).unwrap();
        adapter.resolve_loads();
        adapter.apply_layer(None).unwrap();
        adapter.resolve_loads();
        assert_eq!(adapter.primitive_count(), 0);
        assert!(adapter.style().unwrap().sources.is_empty());
    }
}
