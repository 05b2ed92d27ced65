use std::sync::Arc;

use geodata::FeatureCollection;
use thematic::{Profile, VisualEncoding};
use tracing::warn;
use viewport::CameraTarget;

use crate::generation::Generation;

/// One data update cycle's payload, shared read-only by every adapter.
///
/// Encodings are aligned 1:1 with the collection's features and were
/// produced by the one shared encoder; adapters translate them but never
/// re-derive them.
#[derive(Debug, Clone)]
pub struct LayerUpdate {
    pub collection: Arc<FeatureCollection>,
    pub profile: &'static Profile,
    pub encodings: Arc<[VisualEncoding]>,
    pub generation: Generation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The adapter has no live engine (not initialized, or torn down).
    EngineUnavailable,
    Load(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::EngineUnavailable => write!(f, "rendering engine unavailable"),
            RenderError::Load(msg) => write!(f, "layer load failed: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}

/// Common contract of the five backend adapters.
///
/// Each adapter owns exactly one rendering-engine instance and translates
/// the shared visual encodings into that engine's primitive vocabulary.
/// The styling *decision* never varies between adapters; only the
/// translation does.
pub trait RenderBackend {
    fn name(&self) -> &'static str;

    /// Acquire the engine instance. Idempotent: a second call while
    /// already initialized is a no-op, not an error.
    fn initialize(&mut self) -> Result<(), RenderError>;

    /// Replace the rendered layer atomically; `None` clears the surface.
    /// Engines with asynchronous load paths stage the work and commit it
    /// in `resolve_loads`.
    fn apply_layer(&mut self, update: Option<&LayerUpdate>) -> Result<(), RenderError>;

    /// Drive staged asynchronous loads to completion. Stale loads (those
    /// tagged with a superseded generation) are discarded, never rendered.
    /// Default is a no-op for synchronous engines.
    fn resolve_loads(&mut self) {}

    /// Apply a camera transition. Invalid targets are skipped with a log,
    /// never a crash.
    fn frame_camera(&mut self, target: &CameraTarget);

    /// Release the engine and everything it holds. Safe to call twice.
    fn teardown(&mut self);

    /// Number of primitives currently rendered on the surface.
    fn primitive_count(&self) -> usize;
}

/// Shared finite-coordinate guard for `frame_camera` implementations.
pub fn checked_target<'t>(adapter: &str, target: &'t CameraTarget) -> Option<&'t CameraTarget> {
    if target.is_valid() {
        Some(target)
    } else {
        warn!(adapter, ?target, "skipping invalid camera target");
        None
    }
}
