//! Reference audio handling and output encoding

mod decode;
mod encoder;
mod level;
mod loader;

pub use decode::{decode_audio, DecodedAudio};
pub use encoder::{decode_raw_f32, encode_raw_f32, AudioEncoder};
pub use level::LevelNormalizer;
pub use loader::{AudioLoader, ReferenceAsset, ReferenceAudio, ReferenceClip};
