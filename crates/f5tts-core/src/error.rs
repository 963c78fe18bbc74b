//! Error types for the F5-TTS generation pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Resource missing: {0}")]
    ResourceMissing(String),

    #[error("Download failed: {0}")]
    DownloadError(String),

    #[error("Checkpoint error: {0}")]
    CheckpointError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Audio error: {0}")]
    AudioError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<hf_hub::api::sync::ApiError> for Error {
    fn from(e: hf_hub::api::sync::ApiError) -> Self {
        Error::DownloadError(e.to_string())
    }
}

impl From<safetensors::SafeTensorError> for Error {
    fn from(e: safetensors::SafeTensorError) -> Self {
        Error::CheckpointError(e.to_string())
    }
}

impl From<hound::Error> for Error {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) => Error::IoError(io),
            other => Error::AudioError(other.to_string()),
        }
    }
}

impl From<symphonia::core::errors::Error> for Error {
    fn from(e: symphonia::core::errors::Error) -> Self {
        match e {
            symphonia::core::errors::Error::IoError(io) => Error::IoError(io),
            other => Error::AudioError(other.to_string()),
        }
    }
}
