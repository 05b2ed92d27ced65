//! 2D tile-map backend: mercator-projected circle markers and vector
//! paths over a raster base layer. Loads are synchronous in this engine.

use foundation::math::mercator;
use foundation::{LonLat, Rgba};
use geodata::Geometry;
use viewport::CameraTarget;

use crate::backend::{LayerUpdate, RenderBackend, RenderError, checked_target};

#[derive(Debug, Clone, PartialEq)]
pub struct CircleMarker {
    pub center: LonLat,
    /// Normalized world position of the center at zoom 0.
    pub world: [f64; 2],
    pub radius_px: f32,
    pub fill: Rgba,
    pub stroke: Rgba,
    pub stroke_width: f32,
    pub popup_html: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorPath {
    /// Normalized world positions of the path vertices.
    pub world_points: Vec<[f64; 2]>,
    pub closed: bool,
    /// `None` for stroke-only paths (lines, hole rings).
    pub fill: Option<Rgba>,
    pub stroke: Rgba,
    pub stroke_width: f32,
    pub popup_html: String,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapView {
    pub center: LonLat,
    pub zoom: f64,
    pub duration_ms: u32,
}

/// The engine instance this adapter exclusively owns.
#[derive(Debug, Default)]
pub struct TileCanvas {
    pub markers: Vec<CircleMarker>,
    pub paths: Vec<VectorPath>,
    pub view: Option<MapView>,
}

#[derive(Debug, Default)]
pub struct TileMapAdapter {
    engine: Option<TileCanvas>,
}

impl TileMapAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn canvas(&self) -> Option<&TileCanvas> {
        self.engine.as_ref()
    }
}

fn project_ring(ring: &[[f64; 2]]) -> Vec<[f64; 2]> {
    ring.iter()
        .map(|p| mercator::project(LonLat::from_pair(*p)))
        .collect()
}

impl RenderBackend for TileMapAdapter {
    fn name(&self) -> &'static str {
        "tile-map"
    }

    fn initialize(&mut self) -> Result<(), RenderError> {
        if self.engine.is_none() {
            self.engine = Some(TileCanvas::default());
        }
        Ok(())
    }

    fn apply_layer(&mut self, update: Option<&LayerUpdate>) -> Result<(), RenderError> {
        let Some(engine) = self.engine.as_mut() else {
            return Err(RenderError::EngineUnavailable);
        };

        let mut markers = Vec::new();
        let mut paths = Vec::new();

        if let Some(update) = update {
            for (feature, encoding) in
                update.collection.features.iter().zip(update.encodings.iter())
            {
                match &feature.geometry {
                    Geometry::Point(p) => {
                        let center = LonLat::from_pair(*p);
                        markers.push(CircleMarker {
                            center,
                            world: mercator::project(center),
                            radius_px: encoding.point_size_px.unwrap_or(5.0),
                            fill: encoding.fill,
                            stroke: encoding.stroke,
                            stroke_width: encoding.stroke_width,
                            popup_html: encoding.popup_html.clone(),
                        });
                    }
                    Geometry::LineString(points) => {
                        paths.push(VectorPath {
                            world_points: project_ring(points),
                            closed: false,
                            fill: None,
                            stroke: encoding.fill,
                            stroke_width: encoding.stroke_width,
                            popup_html: encoding.popup_html.clone(),
                        });
                    }
                    geometry => {
                        for rings in geometry.polygons() {
                            for (ring_i, ring) in rings.iter().enumerate() {
                                paths.push(VectorPath {
                                    world_points: project_ring(ring),
                                    closed: true,
                                    // Holes render as stroke-only rings.
                                    fill: (ring_i == 0).then_some(encoding.fill),
                                    stroke: encoding.stroke,
                                    stroke_width: encoding.stroke_width,
                                    popup_html: encoding.popup_html.clone(),
                                });
                            }
                        }
                    }
                }
            }
        }

        engine.markers = markers;
        engine.paths = paths;
        Ok(())
    }

    fn frame_camera(&mut self, target: &CameraTarget) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if let Some(target) = checked_target("tile-map", target) {
            engine.view = Some(MapView {
                center: target.center,
                zoom: mercator::zoom_for_altitude(target.altitude_m),
                duration_ms: target.duration_ms,
            });
        }
    }

    fn teardown(&mut self) {
        self.engine = None;
    }

    fn primitive_count(&self) -> usize {
        self.engine
            .as_ref()
            .map(|e| e.markers.len() + e.paths.len())
            .unwrap_or(0)
    }
}
