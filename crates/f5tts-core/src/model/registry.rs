//! Process-wide cache of loaded models

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use crate::error::Result;
use crate::inference::{SpeechSampler, Vocoder};

/// Loads sampler and vocoder capabilities by name
pub trait ModelLoader: Send + Sync {
    fn load_sampler(&self, name: &str) -> Result<Arc<dyn SpeechSampler>>;
    fn load_vocoder(&self, name: &str) -> Result<Arc<dyn Vocoder>>;
}

/// Loads each model once and hands out shared handles afterwards
pub struct ModelRegistry {
    loader: Box<dyn ModelLoader>,
    samplers: RwLock<HashMap<String, Arc<dyn SpeechSampler>>>,
    vocoders: RwLock<HashMap<String, Arc<dyn Vocoder>>>,
}

impl ModelRegistry {
    pub fn new(loader: Box<dyn ModelLoader>) -> Self {
        Self {
            loader,
            samplers: RwLock::new(HashMap::new()),
            vocoders: RwLock::new(HashMap::new()),
        }
    }

    /// Get the sampler for `name`, loading it on first use
    pub fn sampler(&self, name: &str) -> Result<Arc<dyn SpeechSampler>> {
        get_or_load(&self.samplers, name, |name| self.loader.load_sampler(name))
    }

    /// Get the vocoder for `name`, loading it on first use
    pub fn vocoder(&self, name: &str) -> Result<Arc<dyn Vocoder>> {
        get_or_load(&self.vocoders, name, |name| self.loader.load_vocoder(name))
    }
}

fn get_or_load<T: ?Sized>(
    cache: &RwLock<HashMap<String, Arc<T>>>,
    name: &str,
    load: impl FnOnce(&str) -> Result<Arc<T>>,
) -> Result<Arc<T>> {
    {
        let cached = cache.read().unwrap_or_else(|e| e.into_inner());
        if let Some(model) = cached.get(name) {
            debug!("Using cached model {}", name);
            return Ok(model.clone());
        }
    }

    // Loads run under the write lock so concurrent callers never load twice
    let mut cached = cache.write().unwrap_or_else(|e| e.into_inner());
    if let Some(model) = cached.get(name) {
        return Ok(model.clone());
    }

    info!("Loading model {}", name);
    let model = load(name)?;
    cached.insert(name.to_string(), model.clone());
    Ok(model)
}
