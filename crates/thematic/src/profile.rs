use foundation::Rgba;
use geodata::GeometryKind;

/// Thematic variant resolved from a collection's declared layer type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Theme {
    Weather,
    Country,
    Earthquake,
    Density,
    Roads,
    Vegetation,
    Hydrology,
    PointOfInterest,
    Default,
}

impl Theme {
    pub const ALL: &[Theme] = &[
        Theme::Weather,
        Theme::Country,
        Theme::Earthquake,
        Theme::Density,
        Theme::Roads,
        Theme::Vegetation,
        Theme::Hydrology,
        Theme::PointOfInterest,
        Theme::Default,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Theme::Weather => "weather",
            Theme::Country => "country",
            Theme::Earthquake => "earthquake",
            Theme::Density => "density",
            Theme::Roads => "roads",
            Theme::Vegetation => "vegetation",
            Theme::Hydrology => "hydrology",
            Theme::PointOfInterest => "point-of-interest",
            Theme::Default => "default",
        }
    }
}

/// Piecewise-constant color mapping, total over the real line.
///
/// Every variant returns a color for any input, including NaN and the
/// infinities: out-of-range values land in the overflow/underflow bucket,
/// unknown categories in the fallback color.
#[derive(Debug, Clone, Copy)]
pub enum Ramp {
    /// First bucket whose upper bound exceeds the value wins; the final
    /// color is the overflow bucket. `colors.len() == bounds.len() + 1`.
    Ascending {
        bounds: &'static [f64],
        colors: &'static [Rgba],
    },
    /// First lower bound the value exceeds wins; the final color is the
    /// underflow bucket. `colors.len() == bounds.len() + 1`.
    Descending {
        bounds: &'static [f64],
        colors: &'static [Rgba],
    },
    /// Categorical over a text property.
    Categorical {
        keys: &'static [&'static str],
        colors: &'static [Rgba],
        fallback: Rgba,
    },
    Constant(Rgba),
}

impl Ramp {
    pub fn color_for_number(&self, value: f64) -> Rgba {
        match self {
            Ramp::Ascending { bounds, colors } => {
                for (i, bound) in bounds.iter().enumerate() {
                    if value < *bound {
                        return colors[i];
                    }
                }
                colors[colors.len() - 1]
            }
            Ramp::Descending { bounds, colors } => {
                for (i, bound) in bounds.iter().enumerate() {
                    if value > *bound {
                        return colors[i];
                    }
                }
                colors[colors.len() - 1]
            }
            Ramp::Categorical { fallback, .. } => *fallback,
            Ramp::Constant(c) => *c,
        }
    }

    pub fn color_for_key(&self, key: &str) -> Rgba {
        match self {
            Ramp::Categorical {
                keys,
                colors,
                fallback,
            } => keys
                .iter()
                .position(|k| *k == key)
                .map(|i| colors[i])
                .unwrap_or(*fallback),
            _ => self.color_for_number(f64::NAN),
        }
    }
}

/// Monotonic elevation from the driving property's magnitude.
#[derive(Debug, Clone, Copy)]
pub struct ElevationRule {
    pub scale_m: f64,
    /// Signed quantities (temperature) extrude by absolute value.
    pub absolute: bool,
}

impl ElevationRule {
    pub fn meters(&self, value: f64) -> f64 {
        let v = if self.absolute { value.abs() } else { value };
        v * self.scale_m
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PointSizeRule {
    pub scale_px: f32,
    pub min_px: f32,
}

impl PointSizeRule {
    pub fn pixels(&self, value: f64) -> f32 {
        (value as f32 * self.scale_px).max(self.min_px)
    }
}

/// Encoding rule set for one theme. One immutable table, shared read-only
/// by every backend adapter.
#[derive(Debug, Clone, Copy)]
pub struct Profile {
    pub theme: Theme,
    pub expects: &'static [GeometryKind],
    /// Driving property candidates, first non-missing wins.
    pub drivers: &'static [&'static str],
    pub driver_fallback: f64,
    pub ramp: Ramp,
    pub stroke: Rgba,
    pub stroke_width: f32,
    /// Categorical stroke-width overrides (road classes).
    pub stroke_widths: &'static [(&'static str, f32)],
    pub elevation: Option<ElevationRule>,
    pub point_size: Option<PointSizeRule>,
    /// Closest camera altitude used when framing this theme's data.
    pub framing_floor_m: f64,
}

const AREA: &[GeometryKind] = &[GeometryKind::Area];
const WHITE_STROKE: Rgba = Rgba::with_alpha(0xffffff, 204);

const WEATHER: Profile = Profile {
    theme: Theme::Weather,
    expects: AREA,
    drivers: &["temperature", "temp"],
    driver_fallback: 20.0,
    ramp: Ramp::Ascending {
        bounds: &[-10.0, 0.0, 10.0, 20.0, 30.0, 40.0],
        colors: &[
            Rgba::with_alpha(0x0033ff, 179),
            Rgba::with_alpha(0x0099ff, 179),
            Rgba::with_alpha(0x00ffff, 179),
            Rgba::with_alpha(0x00ff00, 179),
            Rgba::with_alpha(0xffff00, 179),
            Rgba::with_alpha(0xff9900, 179),
            Rgba::with_alpha(0xff0000, 179),
        ],
    },
    stroke: WHITE_STROKE,
    stroke_width: 1.0,
    stroke_widths: &[],
    elevation: Some(ElevationRule {
        scale_m: 1_000.0,
        absolute: true,
    }),
    point_size: None,
    framing_floor_m: 500_000.0,
};

const DENSITY: Profile = Profile {
    theme: Theme::Density,
    expects: AREA,
    drivers: &["value", "density"],
    driver_fallback: 0.0,
    ramp: Ramp::Ascending {
        bounds: &[10.0, 50.0, 100.0, 200.0, 500.0],
        colors: &[
            Rgba::with_alpha(0xffffcc, 179),
            Rgba::with_alpha(0xa1dab4, 179),
            Rgba::with_alpha(0x41b6c4, 179),
            Rgba::with_alpha(0x2c7fb8, 179),
            Rgba::with_alpha(0x253494, 179),
            Rgba::with_alpha(0x081d58, 179),
        ],
    },
    stroke: WHITE_STROKE,
    stroke_width: 1.0,
    stroke_widths: &[],
    elevation: Some(ElevationRule {
        scale_m: 50.0,
        absolute: false,
    }),
    point_size: None,
    framing_floor_m: 500_000.0,
};

const EARTHQUAKE: Profile = Profile {
    theme: Theme::Earthquake,
    expects: &[GeometryKind::Point],
    drivers: &["magnitude", "mag"],
    driver_fallback: 0.0,
    ramp: Ramp::Descending {
        bounds: &[6.0, 5.0, 4.0],
        colors: &[
            Rgba::with_alpha(0xff0000, 204),
            Rgba::with_alpha(0xff6600, 204),
            Rgba::with_alpha(0xffaa00, 204),
            Rgba::with_alpha(0xffff00, 204),
        ],
    },
    stroke: Rgba::WHITE,
    stroke_width: 2.0,
    stroke_widths: &[],
    elevation: Some(ElevationRule {
        scale_m: 10_000.0,
        absolute: false,
    }),
    point_size: Some(PointSizeRule {
        scale_px: 5.0,
        min_px: 3.0,
    }),
    framing_floor_m: 800_000.0,
};

const ROADS: Profile = Profile {
    theme: Theme::Roads,
    expects: &[GeometryKind::Line],
    drivers: &["highway"],
    driver_fallback: 0.0,
    ramp: Ramp::Categorical {
        keys: &["motorway", "trunk", "primary", "secondary"],
        colors: &[
            Rgba::with_alpha(0xff0066, 230),
            Rgba::with_alpha(0xff3366, 230),
            Rgba::with_alpha(0xff6699, 230),
            Rgba::with_alpha(0xff99cc, 230),
        ],
        fallback: Rgba::with_alpha(0x66ccff, 230),
    },
    stroke: Rgba::with_alpha(0x66ccff, 230),
    stroke_width: 2.0,
    stroke_widths: &[
        ("motorway", 5.0),
        ("trunk", 4.0),
        ("primary", 3.0),
        ("secondary", 2.5),
    ],
    elevation: None,
    point_size: None,
    framing_floor_m: 50_000.0,
};

const VEGETATION: Profile = Profile {
    theme: Theme::Vegetation,
    expects: AREA,
    drivers: &[],
    driver_fallback: 0.0,
    ramp: Ramp::Constant(Rgba::with_alpha(0x00ff66, 153)),
    stroke: Rgba::with_alpha(0x00cc44, 204),
    stroke_width: 1.0,
    stroke_widths: &[],
    elevation: None,
    point_size: None,
    framing_floor_m: 150_000.0,
};

const HYDROLOGY: Profile = Profile {
    theme: Theme::Hydrology,
    expects: AREA,
    drivers: &[],
    driver_fallback: 0.0,
    ramp: Ramp::Constant(Rgba::with_alpha(0x00ccff, 153)),
    stroke: Rgba::with_alpha(0x0099ff, 204),
    stroke_width: 2.0,
    stroke_widths: &[],
    elevation: None,
    point_size: None,
    framing_floor_m: 150_000.0,
};

const COUNTRY: Profile = Profile {
    theme: Theme::Country,
    expects: AREA,
    drivers: &["population"],
    driver_fallback: 0.0,
    ramp: Ramp::Constant(Rgba::with_alpha(0x64c8ff, 179)),
    stroke: WHITE_STROKE,
    stroke_width: 1.0,
    stroke_widths: &[],
    elevation: None,
    point_size: None,
    framing_floor_m: 2_000_000.0,
};

const POINT_OF_INTEREST: Profile = Profile {
    theme: Theme::PointOfInterest,
    expects: &[GeometryKind::Point, GeometryKind::Area],
    drivers: &[],
    driver_fallback: 0.0,
    ramp: Ramp::Constant(Rgba::with_alpha(0x64c8ff, 179)),
    stroke: WHITE_STROKE,
    stroke_width: 1.0,
    stroke_widths: &[],
    elevation: None,
    point_size: Some(PointSizeRule {
        scale_px: 0.0,
        min_px: 6.0,
    }),
    framing_floor_m: 100_000.0,
};

const DEFAULT: Profile = Profile {
    theme: Theme::Default,
    expects: &[GeometryKind::Point, GeometryKind::Line, GeometryKind::Area],
    drivers: &[],
    driver_fallback: 0.0,
    ramp: Ramp::Constant(Rgba::with_alpha(0x64c8ff, 179)),
    stroke: Rgba::with_alpha(0xffffff, 100),
    stroke_width: 1.0,
    stroke_widths: &[],
    elevation: None,
    point_size: Some(PointSizeRule {
        scale_px: 0.0,
        min_px: 5.0,
    }),
    framing_floor_m: 500_000.0,
};

/// The shared profile table. Loaded once, referenced everywhere; adapters
/// never re-derive ramps of their own.
pub fn profile(theme: Theme) -> &'static Profile {
    match theme {
        Theme::Weather => &WEATHER,
        Theme::Country => &COUNTRY,
        Theme::Earthquake => &EARTHQUAKE,
        Theme::Density => &DENSITY,
        Theme::Roads => &ROADS,
        Theme::Vegetation => &VEGETATION,
        Theme::Hydrology => &HYDROLOGY,
        Theme::PointOfInterest => &POINT_OF_INTEREST,
        Theme::Default => &DEFAULT,
    }
}

impl Profile {
    /// Stroke width for a categorical class, falling back to the profile's
    /// base width.
    pub fn stroke_width_for(&self, key: &str) -> f32 {
        self.stroke_widths
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, w)| *w)
            .unwrap_or(self.stroke_width)
    }

    /// Whether this theme's encoding rules were written for the given
    /// geometry kind. Unexpected kinds still render, they just get the
    /// profile's generic treatment.
    pub fn expects_kind(&self, kind: GeometryKind) -> bool {
        self.expects.contains(&kind)
    }
}
