//! Model loading through the Python bridge

use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::inference::{BridgeProcess, BridgeSampler, BridgeVocoder, SpeechSampler, Vocoder};
use crate::model::download::ModelDownloader;
use crate::model::info::ModelKind;
use crate::model::registry::ModelLoader;
use crate::model::weights::CheckpointSummary;

/// Finds checkpoints on disk, validates them, and serves them from the bridge worker
pub struct BridgeModelLoader {
    downloader: ModelDownloader,
    bridge: Arc<BridgeProcess>,
}

impl BridgeModelLoader {
    pub fn new(downloader: ModelDownloader, bridge: Arc<BridgeProcess>) -> Self {
        Self { downloader, bridge }
    }

    fn checkpoint(&self, name: &str, kind: ModelKind) -> Result<CheckpointSummary> {
        let dir = self.downloader.locate(name, kind)?;
        let summary = CheckpointSummary::inspect(&dir)?;
        info!("Using {} {} from {:?}", kind, name, summary.dir);
        Ok(summary)
    }
}

impl ModelLoader for BridgeModelLoader {
    fn load_sampler(&self, name: &str) -> Result<Arc<dyn SpeechSampler>> {
        let checkpoint = self.checkpoint(name, ModelKind::Speech)?;
        Ok(Arc::new(BridgeSampler::new(
            self.bridge.clone(),
            &checkpoint.dir,
        )))
    }

    fn load_vocoder(&self, name: &str) -> Result<Arc<dyn Vocoder>> {
        let checkpoint = self.checkpoint(name, ModelKind::Vocoder)?;
        Ok(Arc::new(BridgeVocoder::new(
            self.bridge.clone(),
            &checkpoint.dir,
        )))
    }
}
