// src/classify/result.rs
//
// Explainable classification outcome for one file.

use super::bucket::{Bucket, Category, ScoreMap};
use super::hints::HintMatch;
use super::scoring::{reason_text, Candidate, Decision};
use crate::config::Tuning;
use crate::core::analysis::{FeatureVector, GlideAnalysis};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioThresholdChecks {
    pub duration_ge_808_min: bool,
    pub duration_le_kick_max: bool,
    pub lowfreq_ge_808_min: bool,
    pub lowfreq_le_hat_max: bool,
    pub centroid_ge_bright: bool,
    pub centroid_le_low: bool,
    pub transient_ge_kick_min: bool,
    pub zcr_le_tonal_max: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioSummary {
    pub sample_rate: u32,
    pub num_samples: usize,
    pub analysis_window: usize,
    pub analysis_hop: usize,
    pub duration: f64,
    pub rms_global: f64,
    pub rms_frame_mean: f64,
    pub rms_frame_max: f64,
    pub low_freq_ratio: f64,
    pub transient_strength: f64,
    pub centroid_mean: f64,
    pub centroid_early: f64,
    pub zcr_mean: f64,
    pub flatness_mean: f64,
    pub threshold_checks: AudioThresholdChecks,
}

impl AudioSummary {
    pub fn new(f: &FeatureVector, tuning: &Tuning) -> Self {
        let th = &tuning.feature_thresholds;
        Self {
            sample_rate: f.sample_rate,
            num_samples: f.num_samples,
            analysis_window: f.analysis_window,
            analysis_hop: f.analysis_hop,
            duration: f.duration,
            rms_global: f.rms_global,
            rms_frame_mean: f.rms_frame_mean,
            rms_frame_max: f.rms_frame_max,
            low_freq_ratio: f.low_freq_ratio,
            transient_strength: f.transient_strength,
            centroid_mean: f.centroid_mean,
            centroid_early: f.centroid_early,
            zcr_mean: f.zcr_mean,
            flatness_mean: f.flatness_mean,
            threshold_checks: AudioThresholdChecks {
                duration_ge_808_min: f.duration >= th.duration_808_min,
                duration_le_kick_max: f.duration <= th.kick_duration_max,
                lowfreq_ge_808_min: f.low_freq_ratio >= th.lowfreq_ratio_808,
                lowfreq_le_hat_max: f.low_freq_ratio <= th.lowfreq_ratio_hat_max,
                centroid_ge_bright: f.centroid_mean >= th.centroid_bright,
                centroid_le_low: f.centroid_mean <= th.centroid_low,
                transient_ge_kick_min: f.transient_strength >= th.transient_kick_min,
                zcr_le_tonal_max: f.zcr_mean <= th.zcr_tonal_max,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PitchThresholdChecks {
    pub median_f0_in_808_range: bool,
    pub voiced_ratio_ge_808_min: bool,
    pub pitch_stable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PitchSummary {
    pub pitch_available: bool,
    pub pitch_skipped: bool,
    /// Empty when pitch was tracked
    pub pitch_skip_reason: String,
    pub f0_frames: usize,
    pub voiced_frames: usize,
    pub median_f0: f64,
    pub voiced_ratio: f64,
    pub pitch_stability: f64,
    pub threshold_checks: PitchThresholdChecks,
}

impl PitchSummary {
    pub fn new(f: &FeatureVector, tuning: &Tuning) -> Self {
        let pp = &tuning.pitch;
        let analysis = f.pitch_analysis();
        let median_f0 = f.median_f0();
        let voiced_ratio = f.voiced_ratio();
        let pitch_stability = f.pitch_stability();
        Self {
            pitch_available: analysis.is_some(),
            pitch_skipped: analysis.is_none(),
            pitch_skip_reason: f.skip_reason().map(|r| r.as_str().to_string()).unwrap_or_default(),
            f0_frames: analysis.map_or(0, |p| p.f0_frames),
            voiced_frames: analysis.map_or(0, |p| p.voiced_frames),
            median_f0,
            voiced_ratio,
            pitch_stability,
            threshold_checks: PitchThresholdChecks {
                median_f0_in_808_range: (pp.median_f0_808_min..=pp.median_f0_808_max).contains(&median_f0),
                voiced_ratio_ge_808_min: voiced_ratio >= pp.voiced_ratio_808_min,
                pitch_stable: pitch_stability <= pp.pitch_stability_std_max,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlideThresholdChecks {
    pub duration_ge_min: bool,
    pub voiced_ratio_ge_min: bool,
    pub voiced_frames_ge_min: bool,
    pub drop_st_ge_min: bool,
    pub slope_le_max: bool,
    pub mad_le_max: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlideSummary {
    #[serde(flatten)]
    pub glide: GlideAnalysis,
    pub threshold_checks: GlideThresholdChecks,
}

impl GlideSummary {
    pub fn new(f: &FeatureVector, tuning: &Tuning) -> Self {
        let g = f.glide();
        let gp = &tuning.glide;
        let threshold_checks = GlideThresholdChecks {
            duration_ge_min: g.duration >= gp.duration_min,
            voiced_ratio_ge_min: g.voiced_ratio >= gp.voiced_ratio_min,
            voiced_frames_ge_min: g.voiced_frames >= gp.min_voiced_frames,
            drop_st_ge_min: g.drop_st >= gp.drop_st_min,
            slope_le_max: g.slope_st_per_sec <= gp.slope_max_st_per_sec,
            mad_le_max: g.residual_mad <= gp.mad_max,
        };
        Self {
            glide: g,
            threshold_checks,
        }
    }
}

/// Per-source score tables
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub folder: ScoreMap,
    pub filename: ScoreMap,
    pub audio: ScoreMap,
    pub pitch: ScoreMap,
    #[serde(rename = "final")]
    pub total: ScoreMap,
}

/// Everything the classifier knows about one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub chosen_bucket: Option<Bucket>,
    pub category: Category,
    pub confidence_ratio: f64,
    pub confidence_margin: f64,
    pub low_confidence: bool,
    pub top_3_candidates: Vec<Candidate>,
    pub folder_matches: Vec<HintMatch>,
    pub filename_matches: Vec<HintMatch>,
    pub scores: ScoreBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_summary: Option<AudioSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch_summary: Option<PitchSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glide_summary: Option<GlideSummary>,
}

impl ClassificationResult {
    /// Result for files that are never classified (ignored or non-WAV)
    pub fn unsorted() -> Self {
        Self {
            chosen_bucket: None,
            category: Category::Unsorted,
            confidence_ratio: 0.0,
            confidence_margin: 0.0,
            low_confidence: false,
            top_3_candidates: Vec::new(),
            folder_matches: Vec::new(),
            filename_matches: Vec::new(),
            scores: ScoreBreakdown::default(),
            audio_summary: None,
            pitch_summary: None,
            glide_summary: None,
        }
    }

    pub(crate) fn from_decision(
        decision: Decision,
        scores: ScoreBreakdown,
        folder_matches: Vec<HintMatch>,
        filename_matches: Vec<HintMatch>,
        features: &FeatureVector,
        tuning: &Tuning,
    ) -> Self {
        Self {
            chosen_bucket: Some(decision.chosen),
            category: decision.chosen.category(),
            confidence_ratio: decision.confidence_ratio,
            confidence_margin: decision.confidence_margin,
            low_confidence: decision.low_confidence,
            top_3_candidates: decision.top3,
            folder_matches,
            filename_matches,
            scores,
            audio_summary: Some(AudioSummary::new(features, tuning)),
            pitch_summary: Some(PitchSummary::new(features, tuning)),
            glide_summary: Some(GlideSummary::new(features, tuning)),
        }
    }

    /// Bucket id for reports and audit rows
    pub fn bucket_label(&self) -> &'static str {
        self.chosen_bucket.map_or("UNSORTED", |b| b.id())
    }

    pub fn reason(&self) -> String {
        reason_text(
            self.chosen_bucket,
            self.confidence_ratio,
            &self.top_3_candidates,
            self.low_confidence,
        )
    }

    pub fn glide_detected(&self) -> bool {
        self.glide_summary.as_ref().is_some_and(|g| g.glide.detected)
    }

    pub fn glide_confidence(&self) -> f64 {
        self.glide_summary.as_ref().map_or(0.0, |g| g.glide.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsorted_result() {
        let result = ClassificationResult::unsorted();
        assert_eq!(result.bucket_label(), "UNSORTED");
        assert_eq!(result.category, Category::Unsorted);
        assert_eq!(result.reason(), "no matches");
        assert!(!result.glide_detected());
    }

    #[test]
    fn test_summaries_from_zeroed_features() {
        let tuning = Tuning::default();
        let f = FeatureVector::zeroed(&tuning, crate::core::SkipReason::DecodeFailed);

        let audio = AudioSummary::new(&f, &tuning);
        assert!(audio.threshold_checks.duration_le_kick_max);
        assert!(!audio.threshold_checks.duration_ge_808_min);
        assert!(audio.threshold_checks.zcr_le_tonal_max);

        let pitch = PitchSummary::new(&f, &tuning);
        assert!(pitch.pitch_skipped);
        assert_eq!(pitch.pitch_skip_reason, "decode_failed");
        assert!(!pitch.threshold_checks.median_f0_in_808_range);

        let glide = GlideSummary::new(&f, &tuning);
        assert!(!glide.glide.detected);
        assert!(!glide.threshold_checks.duration_ge_min);
    }

    #[test]
    fn test_result_serialization_shape() {
        let tuning = Tuning::default();
        let f = FeatureVector::zeroed(&tuning, crate::core::SkipReason::DecodeFailed);
        let mut total = ScoreMap::new();
        total[Bucket::Kicks] = 35.0;
        let decision = super::super::scoring::aggregate(&total, tuning.low_confidence_threshold);
        let scores = ScoreBreakdown {
            total,
            ..ScoreBreakdown::default()
        };
        let result = ClassificationResult::from_decision(decision, scores, vec![], vec![], &f, &tuning);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["chosen_bucket"], "Kicks");
        assert_eq!(json["category"], "Samples");
        assert_eq!(json["top_3_candidates"].as_array().unwrap().len(), 3);
        assert_eq!(json["scores"]["final"]["Kicks"], 35.0);
        assert!(json["glide_summary"]["threshold_checks"].is_object());
    }
}
