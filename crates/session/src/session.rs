use std::sync::Arc;

use foundation::LonLat;
use geodata::FeatureCollection;
use render::{
    FreeGlobeAdapter, GenerationCounter, LayerUpdate, RenderBackend, TerrainGlobeAdapter,
    TileMapAdapter, VectorTileAdapter, WebglLayerAdapter,
};
use thematic::{Theme, classify, encode_collection, profile};
use tracing::{debug, info, warn};
use viewport::{CameraTarget, ViewportSynchronizer, target_for};

/// One query's outcome as delivered by the conversational collaborator.
#[derive(Debug, Default)]
pub struct QueryUpdate {
    pub collection: Option<FeatureCollection>,
    pub view_position: Option<LonLat>,
}

/// Process-wide rendering state: the current collection, the current
/// explicit target, and the active adapters.
///
/// Created on the first query result, replaced wholesale per query, torn
/// down when its owning view goes away. Collections are shared with the
/// adapters read-only via `Arc` and never mutated in place.
pub struct Session {
    adapters: Vec<Box<dyn RenderBackend>>,
    collection: Option<Arc<FeatureCollection>>,
    explicit_target: Option<LonLat>,
    generations: GenerationCounter,
    synchronizer: ViewportSynchronizer,
    last_target: Option<CameraTarget>,
}

/// All five backends, the full-screen layout.
pub fn standard_adapters() -> Vec<Box<dyn RenderBackend>> {
    vec![
        Box::new(TerrainGlobeAdapter::new()),
        Box::new(TileMapAdapter::new()),
        Box::new(WebglLayerAdapter::new()),
        Box::new(VectorTileAdapter::new()),
        Box::new(FreeGlobeAdapter::new()),
    ]
}

impl Session {
    pub fn new(mut adapters: Vec<Box<dyn RenderBackend>>) -> Self {
        for adapter in &mut adapters {
            // One adapter failing to come up must not take the rest down.
            if let Err(err) = adapter.initialize() {
                warn!(adapter = adapter.name(), %err, "adapter initialization failed");
            }
        }
        Self {
            adapters,
            collection: None,
            explicit_target: None,
            generations: GenerationCounter::new(),
            synchronizer: ViewportSynchronizer::new(),
            last_target: None,
        }
    }

    pub fn collection(&self) -> Option<&Arc<FeatureCollection>> {
        self.collection.as_ref()
    }

    pub fn is_framing(&self) -> bool {
        self.synchronizer.is_framing()
    }

    pub fn last_target(&self) -> Option<CameraTarget> {
        self.last_target
    }

    /// Rendered primitive count per adapter, in adapter order.
    pub fn primitive_counts(&self) -> Vec<(&'static str, usize)> {
        self.adapters
            .iter()
            .map(|a| (a.name(), a.primitive_count()))
            .collect()
    }

    /// Apply one query's result: replace state, encode once, push the
    /// shared encodings through every adapter, then frame the camera.
    ///
    /// Adapters are always updated before any camera framing happens, so
    /// framing never reflects stale geometry. Per-adapter failures are
    /// logged and contained; the other adapters still receive the update.
    pub fn apply_update(&mut self, update: QueryUpdate, now_ms: u64) {
        self.collection = update.collection.map(Arc::new);
        if update.view_position.is_some() {
            self.explicit_target = update.view_position;
        }

        let layer_update = self.collection.as_ref().map(|collection| {
            let (profile, encodings) = encode_collection(collection);
            LayerUpdate {
                collection: Arc::clone(collection),
                profile,
                encodings: encodings.into(),
                generation: self.generations.next(),
            }
        });

        let active_profile = layer_update
            .as_ref()
            .map(|u| u.profile)
            .unwrap_or_else(|| profile(Theme::Default));

        if let Some(update) = &layer_update {
            let unexpected = update
                .collection
                .features
                .iter()
                .filter(|f| !update.profile.expects_kind(f.geometry.kind()))
                .count();
            if unexpected > 0 {
                debug!(
                    theme = update.profile.theme.name(),
                    unexpected, "features outside the theme's expected geometry kinds"
                );
            }
        }

        for adapter in &mut self.adapters {
            if let Err(err) = adapter.apply_layer(layer_update.as_ref()) {
                warn!(
                    adapter = adapter.name(),
                    %err,
                    "layer update failed; surface keeps its previous state"
                );
            }
        }

        let target = target_for(
            self.collection.as_deref(),
            self.explicit_target,
            active_profile,
        );
        match target {
            Some(target) => {
                self.synchronizer.begin(&target, now_ms);
                for adapter in &mut self.adapters {
                    adapter.frame_camera(&target);
                }
                self.last_target = Some(target);
            }
            None => {
                info!(theme = active_profile.theme.name(), "no usable camera target; view unchanged");
            }
        }
    }

    /// Event-loop tick: drive staged engine loads to completion and
    /// advance the framing state machine.
    pub fn tick(&mut self, now_ms: u64) {
        for adapter in &mut self.adapters {
            adapter.resolve_loads();
        }
        self.synchronizer.tick(now_ms);
    }

    /// Release every adapter's engine. Safe to call more than once; also
    /// runs on drop.
    pub fn teardown(&mut self) {
        for adapter in &mut self.adapters {
            adapter.teardown();
        }
    }

    /// The theme the current collection resolves to.
    pub fn active_theme(&self) -> Theme {
        classify(
            self.collection
                .as_ref()
                .and_then(|c| c.metadata.layer_type.as_deref()),
        )
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}
