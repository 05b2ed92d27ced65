//! Saved-layer bookmarks ("community layers").
//!
//! Storage is a keyed list with whole-list replacement on every mutation;
//! single-user, no concurrency control. The layer payload is the GeoJSON
//! document itself, carried base64-encoded, with a blake3 content id.

use std::path::PathBuf;

use base64::Engine as _;
use geodata::FeatureCollection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedLayer {
    pub id: String,
    pub name: String,
    pub location: String,
    pub author: String,
    pub timestamp_ms: u64,
    #[serde(default)]
    pub likes: u32,
    /// GeoJSON payload, base64-encoded.
    pub payload_base64: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    NotFound,
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::NotFound => write!(f, "saved layer not found"),
            CatalogError::Corrupt(msg) => write!(f, "catalog storage corrupt: {msg}"),
            CatalogError::Io(msg) => write!(f, "catalog storage error: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}

pub trait SavedLayerStore {
    fn list(&self) -> Result<Vec<SavedLayer>, CatalogError>;
    fn get(&self, id: &str) -> Result<Option<SavedLayer>, CatalogError>;
    fn upsert(&mut self, layer: SavedLayer) -> Result<(), CatalogError>;
    fn delete(&mut self, id: &str) -> Result<bool, CatalogError>;
    /// Increment the like counter; returns the new count.
    fn like(&mut self, id: &str) -> Result<u32, CatalogError>;
}

pub fn id_for_payload(payload: &[u8]) -> String {
    blake3::hash(payload).to_hex().to_string()
}

pub fn collection_to_payload(collection: &FeatureCollection) -> String {
    let bytes = collection.to_value().to_string().into_bytes();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

pub fn collection_from_payload(payload_base64: &str) -> Result<FeatureCollection, CatalogError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload_base64)
        .map_err(|e| CatalogError::Corrupt(e.to_string()))?;
    let raw = String::from_utf8(bytes).map_err(|e| CatalogError::Corrupt(e.to_string()))?;
    FeatureCollection::from_json_str(&raw).map_err(|e| CatalogError::Corrupt(e.to_string()))
}

/// Build a saved-layer summary for one rendered collection.
pub fn saved_layer_for(
    collection: &FeatureCollection,
    name: impl Into<String>,
    author: impl Into<String>,
    timestamp_ms: u64,
) -> SavedLayer {
    let payload = collection.to_value().to_string().into_bytes();
    let payload_base64 = base64::engine::general_purpose::STANDARD.encode(&payload);
    SavedLayer {
        id: id_for_payload(&payload),
        name: name.into(),
        location: collection.metadata.location.clone().unwrap_or_default(),
        author: author.into(),
        timestamp_ms,
        likes: 0,
        payload_base64,
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    layers: Vec<SavedLayer>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn upsert_in(layers: &mut Vec<SavedLayer>, layer: SavedLayer) {
    match layers.iter_mut().find(|l| l.id == layer.id) {
        Some(slot) => *slot = layer,
        None => layers.push(layer),
    }
}

fn like_in(layers: &mut [SavedLayer], id: &str) -> Result<u32, CatalogError> {
    let layer = layers
        .iter_mut()
        .find(|l| l.id == id)
        .ok_or(CatalogError::NotFound)?;
    layer.likes += 1;
    Ok(layer.likes)
}

impl SavedLayerStore for InMemoryStore {
    fn list(&self) -> Result<Vec<SavedLayer>, CatalogError> {
        Ok(self.layers.clone())
    }

    fn get(&self, id: &str) -> Result<Option<SavedLayer>, CatalogError> {
        Ok(self.layers.iter().find(|l| l.id == id).cloned())
    }

    fn upsert(&mut self, layer: SavedLayer) -> Result<(), CatalogError> {
        upsert_in(&mut self.layers, layer);
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<bool, CatalogError> {
        let before = self.layers.len();
        self.layers.retain(|l| l.id != id);
        Ok(self.layers.len() != before)
    }

    fn like(&mut self, id: &str) -> Result<u32, CatalogError> {
        like_in(&mut self.layers, id)
    }
}

/// JSON file store. Every mutation reads the whole list, applies the
/// change, and rewrites the file; there is no partial update.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<Vec<SavedLayer>, CatalogError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(CatalogError::Io(err.to_string())),
        };
        serde_json::from_str(&raw).map_err(|e| CatalogError::Corrupt(e.to_string()))
    }

    fn save(&self, layers: &[SavedLayer]) -> Result<(), CatalogError> {
        let raw =
            serde_json::to_string_pretty(layers).map_err(|e| CatalogError::Io(e.to_string()))?;
        std::fs::write(&self.path, raw).map_err(|e| CatalogError::Io(e.to_string()))
    }
}

impl SavedLayerStore for FileStore {
    fn list(&self) -> Result<Vec<SavedLayer>, CatalogError> {
        self.load()
    }

    fn get(&self, id: &str) -> Result<Option<SavedLayer>, CatalogError> {
        Ok(self.load()?.into_iter().find(|l| l.id == id))
    }

    fn upsert(&mut self, layer: SavedLayer) -> Result<(), CatalogError> {
        let mut layers = self.load()?;
        upsert_in(&mut layers, layer);
        self.save(&layers)
    }

    fn delete(&mut self, id: &str) -> Result<bool, CatalogError> {
        let mut layers = self.load()?;
        let before = layers.len();
        layers.retain(|l| l.id != id);
        let removed = layers.len() != before;
        if removed {
            self.save(&layers)?;
        }
        Ok(removed)
    }

    fn like(&mut self, id: &str) -> Result<u32, CatalogError> {
        let mut layers = self.load()?;
        let likes = like_in(&mut layers, id)?;
        self.save(&layers)?;
        Ok(likes)
    }
}
