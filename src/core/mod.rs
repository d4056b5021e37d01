//! Core audio pipeline: decoding, DSP, feature analysis and caching

pub mod analysis;
pub mod cache;
pub mod decoder;
pub mod dsp;

pub use analysis::{FeatureVector, GlideAnalysis, PitchAnalysis, PitchOutcome, SkipReason};
pub use cache::{CacheStats, FeatureCache};
pub use decoder::{AudioBackend, AudioData, NullBackend, SymphoniaBackend};
