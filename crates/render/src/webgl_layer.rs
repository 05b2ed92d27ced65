//! WebGL layer-stack backend: the engine consumes typed layers with flat
//! per-vertex position buffers and per-feature attribute arrays, the way a
//! GPU instancing pipeline wants them.

use foundation::math::mercator;
use geodata::Geometry;
use viewport::CameraTarget;

use crate::backend::{LayerUpdate, RenderBackend, RenderError, checked_target};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GpuLayerKind {
    SolidPolygon { extruded: bool },
    Scatterplot,
    Path,
}

/// One typed layer: flat `[lon, lat, elevation]` vertex triplets plus
/// per-feature attributes aligned with `feature_starts`.
#[derive(Debug, Clone, PartialEq)]
pub struct GpuLayer {
    pub id: String,
    pub kind: GpuLayerKind,
    pub positions: Vec<f32>,
    /// First vertex index of each feature; `feature_starts.len()` is the
    /// feature count of this layer.
    pub feature_starts: Vec<u32>,
    /// RGBA bytes, one quadruple per feature.
    pub colors: Vec<u8>,
    /// Per-feature size attribute: point radius or line width in pixels.
    pub sizes: Vec<f32>,
    pub tooltips: Vec<String>,
}

impl GpuLayer {
    fn new(id: String, kind: GpuLayerKind) -> Self {
        Self {
            id,
            kind,
            positions: Vec::new(),
            feature_starts: Vec::new(),
            colors: Vec::new(),
            sizes: Vec::new(),
            tooltips: Vec::new(),
        }
    }

    pub fn feature_count(&self) -> usize {
        self.feature_starts.len()
    }

    fn push_feature(
        &mut self,
        vertices: impl IntoIterator<Item = [f64; 3]>,
        color: [u8; 4],
        size: f32,
        tooltip: &str,
    ) {
        self.feature_starts.push((self.positions.len() / 3) as u32);
        for v in vertices {
            self.positions.push(v[0] as f32);
            self.positions.push(v[1] as f32);
            self.positions.push(v[2] as f32);
        }
        self.colors.extend_from_slice(&color);
        self.sizes.push(size);
        self.tooltips.push(tooltip.to_string());
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WebglViewState {
    pub lon: f64,
    pub lat: f64,
    pub zoom: f64,
    pub pitch_deg: f32,
    pub transition_ms: u32,
}

/// The engine instance this adapter exclusively owns.
#[derive(Debug, Default)]
pub struct LayerStack {
    pub layers: Vec<GpuLayer>,
    pub view: Option<WebglViewState>,
}

#[derive(Debug, Default)]
pub struct WebglLayerAdapter {
    engine: Option<LayerStack>,
}

impl WebglLayerAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stack(&self) -> Option<&LayerStack> {
        self.engine.as_ref()
    }
}

impl RenderBackend for WebglLayerAdapter {
    fn name(&self) -> &'static str {
        "webgl-layer"
    }

    fn initialize(&mut self) -> Result<(), RenderError> {
        if self.engine.is_none() {
            self.engine = Some(LayerStack::default());
        }
        Ok(())
    }

    fn apply_layer(&mut self, update: Option<&LayerUpdate>) -> Result<(), RenderError> {
        let Some(engine) = self.engine.as_mut() else {
            return Err(RenderError::EngineUnavailable);
        };

        let Some(update) = update else {
            engine.layers.clear();
            return Ok(());
        };

        let theme = update.profile.theme.name();
        let extruded = update.profile.elevation.is_some();
        let mut polygons = GpuLayer::new(
            format!("{theme}-polygons"),
            GpuLayerKind::SolidPolygon { extruded },
        );
        let mut points = GpuLayer::new(format!("{theme}-points"), GpuLayerKind::Scatterplot);
        let mut paths = GpuLayer::new(format!("{theme}-paths"), GpuLayerKind::Path);

        for (feature, encoding) in update.collection.features.iter().zip(update.encodings.iter()) {
            let color = encoding.fill.as_u8x4();
            let elevation = encoding.elevation_m.unwrap_or(0.0);
            match &feature.geometry {
                Geometry::Point(p) => {
                    points.push_feature(
                        [[p[0], p[1], elevation]],
                        color,
                        encoding.point_size_px.unwrap_or(5.0),
                        &encoding.popup_html,
                    );
                }
                Geometry::LineString(pts) => {
                    paths.push_feature(
                        pts.iter().map(|p| [p[0], p[1], 0.0]),
                        color,
                        encoding.stroke_width,
                        &encoding.popup_html,
                    );
                }
                geometry => {
                    for rings in geometry.polygons() {
                        // The engine triangulates; one feature per outer ring.
                        let Some(outer) = rings.first() else { continue };
                        polygons.push_feature(
                            outer.iter().map(|p| [p[0], p[1], elevation]),
                            color,
                            encoding.stroke_width,
                            &encoding.popup_html,
                        );
                    }
                }
            }
        }

        // Old layer stack goes out in the same swap the new one comes in.
        engine.layers = [polygons, points, paths]
            .into_iter()
            .filter(|layer| layer.feature_count() > 0)
            .collect();
        Ok(())
    }

    fn frame_camera(&mut self, target: &CameraTarget) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if let Some(target) = checked_target("webgl-layer", target) {
            engine.view = Some(WebglViewState {
                lon: target.center.lon,
                lat: target.center.lat,
                zoom: mercator::zoom_for_altitude(target.altitude_m),
                pitch_deg: 45.0,
                transition_ms: target.duration_ms,
            });
        }
    }

    fn teardown(&mut self) {
        self.engine = None;
    }

    fn primitive_count(&self) -> usize {
        self.engine
            .as_ref()
            .map(|e| e.layers.iter().map(GpuLayer::feature_count).sum())
            .unwrap_or(0)
    }
}
