use foundation::GeoBounds;

use crate::metadata::LayerMetadata;
use crate::properties::Properties;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    Line,
    Area,
}

/// GeoJSON geometry, coordinates as `[lon, lat]` degree pairs.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point([f64; 2]),
    LineString(Vec<[f64; 2]>),
    Polygon(Vec<Vec<[f64; 2]>>),
    MultiPolygon(Vec<Vec<Vec<[f64; 2]>>>),
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::LineString(_) => GeometryKind::Line,
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => GeometryKind::Area,
        }
    }

    /// Visit every vertex. Bounding-region accumulation and primitive
    /// conversion both run through this.
    pub fn for_each_vertex(&self, mut visit: impl FnMut(f64, f64)) {
        match self {
            Geometry::Point(p) => visit(p[0], p[1]),
            Geometry::LineString(pts) => {
                for p in pts {
                    visit(p[0], p[1]);
                }
            }
            Geometry::Polygon(rings) => {
                for ring in rings {
                    for p in ring {
                        visit(p[0], p[1]);
                    }
                }
            }
            Geometry::MultiPolygon(polys) => {
                for rings in polys {
                    for ring in rings {
                        for p in ring {
                            visit(p[0], p[1]);
                        }
                    }
                }
            }
        }
    }

    /// Polygon rings of this geometry, one entry per polygon.
    pub fn polygons(&self) -> Vec<&[Vec<[f64; 2]>]> {
        match self {
            Geometry::Polygon(rings) => vec![rings.as_slice()],
            Geometry::MultiPolygon(polys) => polys.iter().map(|r| r.as_slice()).collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Properties,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: Properties) -> Self {
        Self {
            geometry,
            properties,
        }
    }
}

/// One query's worth of features plus its layer metadata.
///
/// Immutable once received: a new query replaces the whole collection,
/// it never mutates the previous one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    pub metadata: LayerMetadata,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>, mut metadata: LayerMetadata) -> Self {
        // feature_count must agree with the actual feature list.
        metadata.feature_count = features.len();
        Self { features, metadata }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Bounding region over every coordinate of every feature.
    pub fn bounds(&self) -> GeoBounds {
        let mut bounds = GeoBounds::EMPTY;
        for feature in &self.features {
            feature
                .geometry
                .for_each_vertex(|lon, lat| bounds.extend(lon, lat));
        }
        bounds
    }
}
