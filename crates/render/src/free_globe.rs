//! Free-globe backend: a lightweight globe engine that binds plain data
//! arrays (lat/lng order, CSS color strings, altitudes as fractions of
//! the Earth radius) the way scene-graph globe libraries expect them.

use foundation::math::WGS84_A;
use foundation::LonLat;
use geodata::Geometry;
use viewport::CameraTarget;

use crate::backend::{LayerUpdate, RenderBackend, RenderError, checked_target};

const SIDE_COLOR: &str = "rgba(100, 100, 100, 0.3)";

#[derive(Debug, Clone, PartialEq)]
pub struct GlobePolygonDatum {
    /// Rings in `[lat, lng]` order, outer ring first.
    pub rings: Vec<Vec<[f64; 2]>>,
    pub cap_color: String,
    pub side_color: String,
    pub stroke_color: String,
    /// Cap altitude as a fraction of the Earth radius.
    pub altitude: f64,
    pub label_html: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobePointDatum {
    pub lat: f64,
    pub lng: f64,
    pub color: String,
    pub altitude: f64,
    /// Radius in angular degrees, the engine's point unit.
    pub radius: f64,
    pub label_html: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobePathDatum {
    /// Path vertices in `[lat, lng]` order.
    pub points: Vec<[f64; 2]>,
    pub color: String,
    pub stroke_px: f32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointOfView {
    pub lat: f64,
    pub lng: f64,
    /// Camera altitude as a fraction of the Earth radius.
    pub altitude: f64,
    pub transition_ms: u32,
}

/// The engine instance this adapter exclusively owns.
#[derive(Debug, Default)]
pub struct FreeGlobe {
    pub polygons: Vec<GlobePolygonDatum>,
    pub points: Vec<GlobePointDatum>,
    pub paths: Vec<GlobePathDatum>,
    pub pov: Option<PointOfView>,
}

#[derive(Debug, Default)]
pub struct FreeGlobeAdapter {
    engine: Option<FreeGlobe>,
}

impl FreeGlobeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn globe(&self) -> Option<&FreeGlobe> {
        self.engine.as_ref()
    }
}

fn flip(pair: &[f64; 2]) -> [f64; 2] {
    [pair[1], pair[0]]
}

impl RenderBackend for FreeGlobeAdapter {
    fn name(&self) -> &'static str {
        "free-globe"
    }

    fn initialize(&mut self) -> Result<(), RenderError> {
        if self.engine.is_none() {
            self.engine = Some(FreeGlobe::default());
        }
        Ok(())
    }

    fn apply_layer(&mut self, update: Option<&LayerUpdate>) -> Result<(), RenderError> {
        let Some(engine) = self.engine.as_mut() else {
            return Err(RenderError::EngineUnavailable);
        };

        // All data bindings reset up front; partially stale globes are
        // never visible.
        engine.polygons.clear();
        engine.points.clear();
        engine.paths.clear();

        let Some(update) = update else {
            return Ok(());
        };

        for (feature, encoding) in update.collection.features.iter().zip(update.encodings.iter()) {
            let altitude = encoding.elevation_m.unwrap_or(0.0) / WGS84_A;
            match &feature.geometry {
                Geometry::Point(p) => {
                    engine.points.push(GlobePointDatum {
                        lat: p[1],
                        lng: p[0],
                        color: encoding.fill.css_rgba(),
                        altitude,
                        radius: encoding.point_size_px.unwrap_or(5.0) as f64 / 10.0,
                        label_html: encoding.popup_html.clone(),
                    });
                }
                Geometry::LineString(points) => {
                    engine.paths.push(GlobePathDatum {
                        points: points.iter().map(flip).collect(),
                        color: encoding.fill.css_rgba(),
                        stroke_px: encoding.stroke_width,
                    });
                }
                geometry => {
                    for rings in geometry.polygons() {
                        engine.polygons.push(GlobePolygonDatum {
                            rings: rings
                                .iter()
                                .map(|ring| ring.iter().map(flip).collect())
                                .collect(),
                            cap_color: encoding.fill.css_rgba(),
                            side_color: SIDE_COLOR.to_string(),
                            stroke_color: encoding.stroke.css_rgba(),
                            altitude,
                            label_html: encoding.popup_html.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn frame_camera(&mut self, target: &CameraTarget) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if let Some(target) = checked_target("free-globe", target) {
            engine.pov = Some(PointOfView {
                lat: target.center.lat,
                lng: target.center.lon,
                altitude: target.altitude_m / WGS84_A,
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
            .map(|e| e.polygons.len() + e.points.len() + e.paths.len())
            .unwrap_or(0)
    }
}
