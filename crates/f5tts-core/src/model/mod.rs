//! Model resolution, validation and caching

mod download;
mod info;
mod loader;
mod registry;
pub mod weights;

pub use download::ModelDownloader;
pub use info::{ModelKind, ModelSource};
pub use loader::BridgeModelLoader;
pub use registry::{ModelLoader, ModelRegistry};
pub use weights::CheckpointSummary;
