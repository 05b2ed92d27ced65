//! Terrain-globe backend: 3D globe engine with extruded polygon caps,
//! billboard points, and ground-clamped polylines, all in ECEF meters.

use earcutr::earcut;
use foundation::math::{Ecef, WGS84_A, WGS84_B, lonlat_to_ecef};
use foundation::{LonLat, Rgba};
use geodata::Geometry;
use tracing::debug;
use viewport::CameraTarget;

use crate::backend::{LayerUpdate, RenderBackend, RenderError, checked_target};
use crate::generation::{Generation, PendingLoad};

#[derive(Debug, Clone, PartialEq)]
pub struct ExtrudedPolygon {
    /// Flat triangle list (3 vertices per triangle) of the polygon cap.
    pub cap_triangles: Vec<Ecef>,
    pub fill: Rgba,
    pub outline: Rgba,
    pub extruded_height_m: f64,
    pub popup_html: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Billboard {
    pub position: Ecef,
    pub color: Rgba,
    pub outline: Rgba,
    pub pixel_size: f32,
    pub popup_html: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroundPolyline {
    pub vertices: Vec<Ecef>,
    pub color: Rgba,
    pub width_px: f32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlobeCamera {
    pub center: LonLat,
    pub altitude_m: f64,
    pub duration_ms: u32,
}

/// The engine instance this adapter exclusively owns.
#[derive(Debug, Default)]
pub struct GlobeScene {
    pub polygons: Vec<ExtrudedPolygon>,
    pub billboards: Vec<Billboard>,
    pub polylines: Vec<GroundPolyline>,
    pub camera: Option<GlobeCamera>,
}

#[derive(Debug, Default)]
struct GlobeBatch {
    polygons: Vec<ExtrudedPolygon>,
    billboards: Vec<Billboard>,
    polylines: Vec<GroundPolyline>,
}

/// Geometry loads are asynchronous in this engine: `apply_layer` stages a
/// batch tagged with its generation and `resolve_loads` commits only the
/// batch that is still current.
#[derive(Debug, Default)]
pub struct TerrainGlobeAdapter {
    engine: Option<GlobeScene>,
    pending: Vec<PendingLoad<GlobeBatch>>,
    current: Option<Generation>,
}

impl TerrainGlobeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scene(&self) -> Option<&GlobeScene> {
        self.engine.as_ref()
    }

    fn build_batch(update: &LayerUpdate) -> GlobeBatch {
        let mut batch = GlobeBatch::default();

        for (feature, encoding) in update.collection.features.iter().zip(update.encodings.iter()) {
            match &feature.geometry {
                Geometry::Point(p) => {
                    let height = encoding.elevation_m.unwrap_or(0.0);
                    batch.billboards.push(Billboard {
                        position: lonlat_to_ecef(LonLat::from_pair(*p), height),
                        color: encoding.fill,
                        outline: encoding.stroke,
                        pixel_size: encoding.point_size_px.unwrap_or(5.0),
                        popup_html: encoding.popup_html.clone(),
                    });
                }
                Geometry::LineString(points) => {
                    batch.polylines.push(GroundPolyline {
                        vertices: points
                            .iter()
                            .map(|p| lonlat_to_ecef(LonLat::from_pair(*p), 0.0))
                            .collect(),
                        color: encoding.fill,
                        width_px: encoding.stroke_width,
                    });
                }
                geometry => {
                    let height = encoding.elevation_m.unwrap_or(0.0);
                    for rings in geometry.polygons() {
                        let ecef_rings: Vec<Vec<Ecef>> = rings
                            .iter()
                            .map(|ring| {
                                ring.iter()
                                    .map(|p| lonlat_to_ecef(LonLat::from_pair(*p), height))
                                    .collect()
                            })
                            .collect();
                        let cap_triangles = triangulate_area_rings(&ecef_rings);
                        if cap_triangles.is_empty() {
                            continue;
                        }
                        batch.polygons.push(ExtrudedPolygon {
                            cap_triangles,
                            fill: encoding.fill,
                            outline: encoding.stroke,
                            extruded_height_m: height,
                            popup_html: encoding.popup_html.clone(),
                        });
                    }
                }
            }
        }

        batch
    }
}

impl RenderBackend for TerrainGlobeAdapter {
    fn name(&self) -> &'static str {
        "terrain-globe"
    }

    fn initialize(&mut self) -> Result<(), RenderError> {
        if self.engine.is_none() {
            self.engine = Some(GlobeScene::default());
        }
        Ok(())
    }

    fn apply_layer(&mut self, update: Option<&LayerUpdate>) -> Result<(), RenderError> {
        let Some(engine) = self.engine.as_mut() else {
            return Err(RenderError::EngineUnavailable);
        };

        match update {
            None => {
                engine.polygons.clear();
                engine.billboards.clear();
                engine.polylines.clear();
                self.pending.clear();
                self.current = None;
            }
            Some(update) => {
                self.current = Some(update.generation);
                self.pending.push(PendingLoad {
                    generation: update.generation,
                    payload: Self::build_batch(update),
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
            if Some(load.generation) == self.current {
                // Old primitives go before new ones arrive; no frame ever
                // shows both layers.
                engine.polygons = load.payload.polygons;
                engine.billboards = load.payload.billboards;
                engine.polylines = load.payload.polylines;
            } else {
                debug!(
                    adapter = "terrain-globe",
                    generation = load.generation.0,
                    "discarding stale layer load"
                );
            }
        }
    }

    fn frame_camera(&mut self, target: &CameraTarget) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if let Some(target) = checked_target("terrain-globe", target) {
            engine.camera = Some(GlobeCamera {
                center: target.center,
                altitude_m: target.altitude_m,
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
        self.engine
            .as_ref()
            .map(|e| e.polygons.len() + e.billboards.len() + e.polylines.len())
            .unwrap_or(0)
    }
}

/// Triangulate polygon rings in a local tangent plane at the centroid of
/// the outer ring. Pragmatic for rendering; holes are supported through
/// earcut's hole indices.
fn triangulate_area_rings(rings: &[Vec<Ecef>]) -> Vec<Ecef> {
    let Some(outer) = rings.first() else {
        return Vec::new();
    };
    if outer.len() < 3 {
        return Vec::new();
    }

    let origin = centroid(outer);
    let n = ellipsoid_normal(origin);

    let up = if n.z.abs() < 0.99 {
        Ecef::new(0.0, 0.0, 1.0)
    } else {
        Ecef::new(0.0, 1.0, 0.0)
    };
    let east = normalize(cross(up, n));
    let north = cross(n, east);

    let mut vertices: Vec<Ecef> = Vec::new();
    let mut coords_2d: Vec<f64> = Vec::new();
    let mut hole_indices: Vec<usize> = Vec::new();

    for (ring_i, ring) in rings.iter().enumerate() {
        let mut ring_pts = ring.clone();
        drop_closing_duplicate(&mut ring_pts);
        if ring_pts.len() < 3 {
            continue;
        }

        if ring_i > 0 {
            hole_indices.push(vertices.len());
        }

        for p in ring_pts {
            let v = Ecef::new(p.x - origin.x, p.y - origin.y, p.z - origin.z);
            coords_2d.push(dot(v, east));
            coords_2d.push(dot(v, north));
            vertices.push(p);
        }
    }

    if vertices.len() < 3 {
        return Vec::new();
    }

    let indices = match earcut(&coords_2d, &hole_indices, 2) {
        Ok(ix) => ix,
        Err(_) => return Vec::new(),
    };

    indices.iter().filter_map(|i| vertices.get(*i).copied()).collect()
}

fn drop_closing_duplicate(points: &mut Vec<Ecef>) {
    if points.len() >= 2 {
        let first = points[0];
        let last = *points.last().unwrap();
        if (first.x - last.x).abs() < 1e-9
            && (first.y - last.y).abs() < 1e-9
            && (first.z - last.z).abs() < 1e-9
        {
            points.pop();
        }
    }
}

fn ellipsoid_normal(p: Ecef) -> Ecef {
    // Gradient of (x^2/A^2 + y^2/A^2 + z^2/B^2) on the WGS84 ellipsoid.
    let a2 = WGS84_A * WGS84_A;
    let b2 = WGS84_B * WGS84_B;
    normalize(Ecef::new(p.x / a2, p.y / a2, p.z / b2))
}

fn centroid(vertices: &[Ecef]) -> Ecef {
    let mut sx = 0.0;
    let mut sy = 0.0;
    let mut sz = 0.0;
    for v in vertices {
        sx += v.x;
        sy += v.y;
        sz += v.z;
    }
    let n = vertices.len() as f64;
    Ecef::new(sx / n, sy / n, sz / n)
}

fn dot(a: Ecef, b: Ecef) -> f64 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

fn cross(a: Ecef, b: Ecef) -> Ecef {
    Ecef::new(
        a.y * b.z - a.z * b.y,
        a.z * b.x - a.x * b.z,
        a.x * b.y - a.y * b.x,
    )
}

fn normalize(v: Ecef) -> Ecef {
    let l2 = dot(v, v);
    if l2 <= 0.0 {
        return v;
    }
    let inv = 1.0 / l2.sqrt();
    Ecef::new(v.x * inv, v.y * inv, v.z * inv)
}

#[cfg(test)]
mod tests {
    use super::TerrainGlobeAdapter;
    use crate::backend::{RenderBackend, RenderError};
    use crate::testutil::{QUAKES, WEATHER_GRID, layer_update};
    use foundation::LonLat;
    use viewport::CameraTarget;

    #[test]
    fn initialize_is_idempotent() {
        let mut adapter = TerrainGlobeAdapter::new();
        adapter.initialize().unwrap();
        adapter.initialize().unwrap();
        assert_eq!(adapter.primitive_count(), 0);
    }

    #[test]
    fn apply_before_initialize_is_an_error() {
        let mut adapter = TerrainGlobeAdapter::new();
        let update = layer_update(QUAKES, 1);
        assert_eq!(
            adapter.apply_layer(Some(&update)),
            Err(RenderError::EngineUnavailable)
        );
    }

    #[test]
    fn polygons_triangulate_and_extrude() {
        let mut adapter = TerrainGlobeAdapter::new();
        adapter.initialize().unwrap();
        adapter.apply_layer(Some(&layer_update(WEATHER_GRID, 1))).unwrap();
        adapter.resolve_loads();

        let scene = adapter.scene().unwrap();
        assert_eq!(scene.polygons.len(), 1);
        let poly = &scene.polygons[0];
        assert!(!poly.cap_triangles.is_empty());
        assert_eq!(poly.cap_triangles.len() % 3, 0);
        // temperature -15 extrudes by |t| * 1000.
        assert_eq!(poly.extruded_height_m, 15_000.0);
    }

    #[test]
    fn stale_load_is_discarded_on_resolve() {
        let mut adapter = TerrainGlobeAdapter::new();
        adapter.initialize().unwrap();

        adapter.apply_layer(Some(&layer_update(WEATHER_GRID, 1))).unwrap();
        adapter.apply_layer(Some(&layer_update(QUAKES, 2))).unwrap();
        adapter.resolve_loads();

        let scene = adapter.scene().unwrap();
        // Only the second collection's primitives survive.
        assert!(scene.polygons.is_empty());
        assert_eq!(scene.billboards.len(), 1);
    }

    #[test]
    fn clear_leaves_zero_primitives() {
        let mut adapter = TerrainGlobeAdapter::new();
        adapter.initialize().unwrap();
        adapter.apply_layer(Some(&layer_update(QUAKES, 1))).unwrap();
        adapter.resolve_loads();
        assert_eq!(adapter.primitive_count(), 1);

        adapter.apply_layer(None).unwrap();
        adapter.resolve_loads();
        assert_eq!(adapter.primitive_count(), 0);
    }

    #[test]
    fn invalid_camera_target_is_skipped() {
        let mut adapter = TerrainGlobeAdapter::new();
        adapter.initialize().unwrap();
        adapter.frame_camera(&CameraTarget {
            center: LonLat::new(f64::NAN, 0.0),
            altitude_m: 500_000.0,
            duration_ms: 1_500,
        });
        assert!(adapter.scene().unwrap().camera.is_none());
    }

    #[test]
    fn teardown_twice_is_safe() {
        let mut adapter = TerrainGlobeAdapter::new();
        adapter.initialize().unwrap();
        adapter.teardown();
        adapter.teardown();
        assert_eq!(adapter.primitive_count(), 0);
    }
}
