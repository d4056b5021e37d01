//! Classification: bucket taxonomy, lexical hints, rule scoring and
//! the per-file classifier

pub mod bucket;
pub mod classifier;
pub mod hints;
pub mod result;
pub mod scoring;

pub use bucket::{Bucket, Category, ScoreMap};
pub use classifier::{is_ignored, Classifier, IGNORE_RULES};
pub use hints::{HintMatch, HintScan, HintScanner, HintSource};
pub use result::{AudioSummary, ClassificationResult, GlideSummary, PitchSummary, ScoreBreakdown};
pub use scoring::{aggregate, audio_scores, pitch_scores, reason_text, Candidate, Decision};
