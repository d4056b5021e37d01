//! Configuration: tuning parameters, bucket hints and run settings

mod hints;
mod run;
mod tuning;

pub use hints::{BucketHints, HintKind};
pub use run::{RunConfig, RunConfigBuilder};
pub use tuning::{
    AnalysisParams, AudioWeights, FeatureThresholds, GlideParams, GlideWeights, PitchGate,
    PitchParams, PitchWeights, Tuning, TuningBuilder,
};
