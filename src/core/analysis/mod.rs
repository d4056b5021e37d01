//! Audio analysis algorithms
//!
//! Per-file feature extraction used by the classifier:
//! - Spectral/temporal features (low-frequency ratio, transients, centroid, ZCR, flatness)
//! - F0 tracking with a percussive gate
//! - Descending pitch-glide detection

mod features;
mod glide;
mod pitch;

pub use features::{extract_features, FeatureVector};
pub use glide::{detect_glide, GlideAnalysis};
pub use pitch::{analyze_pitch, percussive_skip_reason, PitchAnalysis, PitchOutcome, SkipReason, YinTracker};
