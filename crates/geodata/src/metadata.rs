use serde::{Deserialize, Serialize};

/// Metadata attached to a feature collection by the data service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayerMetadata {
    /// Thematic tag, e.g. "weather" or "earthquakes". Absent tags render
    /// with the neutral default profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default)]
    pub feature_count: usize,

    /// `[lon, lat]` center hint, when the source provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<[f64; 2]>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}
