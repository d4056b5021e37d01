// src/config/tuning.rs
//
// Classification tuning: hint weights, DSP thresholds, score weights,
// pitch gate and glide parameters. Partial JSON overrides are layered
// onto the defaults once, at engine construction.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Audio feature thresholds used by the scoring rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureThresholds {
    #[serde(rename = "808_duration_min")]
    pub duration_808_min: f64,
    pub kick_duration_max: f64,
    pub lowfreq_ratio_808: f64,
    pub lowfreq_ratio_hat_max: f64,
    pub centroid_bright: f64,
    pub centroid_low: f64,
    pub transient_kick_min: f64,
    pub zcr_tonal_max: f64,
    pub flatness_high: f64,
    pub zcr_high: f64,
    pub centroid_moderate_low: f64,
    pub centroid_moderate_high: f64,
    pub hat_duration_max: f64,
    pub kick_lowfreq_min: f64,
    pub kick_centroid_early_min: f64,
    pub snare_clap_flatness_min: f64,
    pub snare_clap_transient_min: f64,
    pub snare_clap_lowfreq_max: f64,
    pub percs_transient_min: f64,
    pub percs_duration_max: f64,
    pub percs_lowfreq_max: f64,
    pub vox_voiced_ratio_min: f64,
    pub vox_centroid_max: f64,
    pub vox_lowfreq_max: f64,
    pub fx_flatness_min: f64,
    pub fx_duration_min: f64,
}

impl Default for FeatureThresholds {
    fn default() -> Self {
        Self {
            duration_808_min: 0.45,
            kick_duration_max: 0.35,
            lowfreq_ratio_808: 0.60,
            lowfreq_ratio_hat_max: 0.20,
            centroid_bright: 4000.0,
            centroid_low: 300.0,
            transient_kick_min: 3.0,
            zcr_tonal_max: 0.08,
            flatness_high: 0.3,
            zcr_high: 0.1,
            centroid_moderate_low: 1000.0,
            centroid_moderate_high: 3000.0,
            hat_duration_max: 0.40,
            kick_lowfreq_min: 0.20,
            kick_centroid_early_min: 1200.0,
            snare_clap_flatness_min: 0.20,
            snare_clap_transient_min: 2.0,
            snare_clap_lowfreq_max: 0.45,
            percs_transient_min: 1.5,
            percs_duration_max: 0.50,
            percs_lowfreq_max: 0.45,
            vox_voiced_ratio_min: 0.75,
            vox_centroid_max: 2000.0,
            vox_lowfreq_max: 0.40,
            fx_flatness_min: 0.50,
            fx_duration_min: 0.50,
        }
    }
}

/// Points awarded per satisfied audio rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioWeights {
    pub duration: f64,
    pub lowfreq: f64,
    pub centroid: f64,
    pub transient: f64,
    pub zcr: f64,
    pub flatness: f64,
}

impl Default for AudioWeights {
    fn default() -> Self {
        Self {
            duration: 10.0,
            lowfreq: 15.0,
            centroid: 10.0,
            transient: 35.0,
            zcr: 10.0,
            flatness: 10.0,
        }
    }
}

/// Points awarded per satisfied pitch rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchWeights {
    pub median_f0_low: f64,
    pub voiced_ratio: f64,
    pub glide_bonus: f64,
    pub stability_bonus: f64,
}

impl Default for PitchWeights {
    fn default() -> Self {
        Self {
            median_f0_low: 20.0,
            voiced_ratio: 10.0,
            glide_bonus: 10.0,
            stability_bonus: 10.0,
        }
    }
}

/// STFT and feature-window parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    pub eps: f64,
    pub win: usize,
    pub hop: usize,
    pub low_freq_cutoff_hz: f64,
    pub flatness_amin: f64,
    pub transient_early_seconds: f64,
    pub transient_mid_seconds: f64,
    pub centroid_early_seconds: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            eps: 1e-9,
            win: 2048,
            hop: 512,
            low_freq_cutoff_hz: 120.0,
            flatness_amin: 1e-10,
            transient_early_seconds: 0.08,
            transient_mid_seconds: 0.20,
            centroid_early_seconds: 0.10,
        }
    }
}

/// F0 tracking bounds and 808 pitch heuristics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchParams {
    pub yin_fmin: f64,
    pub yin_fmax: f64,
    pub yin_frame_length_min: usize,
    pub yin_threshold: f64,
    pub median_f0_808_min: f64,
    pub median_f0_808_max: f64,
    pub voiced_ratio_808_min: f64,
    pub pitch_stability_std_max: f64,
    pub kick_voiced_ratio_max: f64,
}

impl Default for PitchParams {
    fn default() -> Self {
        Self {
            yin_fmin: 20.0,
            yin_fmax: 2000.0,
            yin_frame_length_min: 2207,
            yin_threshold: 0.1,
            median_f0_808_min: 30.0,
            median_f0_808_max: 100.0,
            voiced_ratio_808_min: 0.50,
            pitch_stability_std_max: 0.20,
            kick_voiced_ratio_max: 0.25,
        }
    }
}

/// Cheap pre-check that skips pitch tracking for obvious percussion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchGate {
    pub enabled: bool,
    pub hat_duration_max: f64,
    pub hat_centroid_min: f64,
    pub hat_lowfreq_max: f64,
    pub hat_flatness_min: f64,
    pub hat_zcr_min: f64,
    pub kick_duration_max: f64,
    pub kick_transient_min: f64,
    pub kick_centroid_min: f64,
}

impl Default for PitchGate {
    fn default() -> Self {
        Self {
            enabled: true,
            hat_duration_max: 0.22,
            hat_centroid_min: 5000.0,
            hat_lowfreq_max: 0.12,
            hat_flatness_min: 0.40,
            hat_zcr_min: 0.12,
            kick_duration_max: 0.22,
            kick_transient_min: 4.5,
            kick_centroid_min: 800.0,
        }
    }
}

/// Descending-glide detector parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlideParams {
    pub duration_min: f64,
    pub voiced_ratio_min: f64,
    pub min_voiced_frames: usize,
    pub median_filter_size: usize,
    pub mean_filter_size: usize,
    pub trim_ratio: f64,
    pub drop_st_min: f64,
    pub slope_max_st_per_sec: f64,
    pub mad_max: f64,
    pub theil_sen_max_points: usize,
    pub drop_window_ratio: f64,
    pub conf_a_drop_scale: f64,
    pub conf_b_slope_scale: f64,
}

impl Default for GlideParams {
    fn default() -> Self {
        Self {
            duration_min: 0.35,
            voiced_ratio_min: 0.35,
            min_voiced_frames: 15,
            median_filter_size: 5,
            mean_filter_size: 5,
            trim_ratio: 0.10,
            drop_st_min: 1.0,
            slope_max_st_per_sec: -2.0,
            mad_max: 0.35,
            theil_sen_max_points: 100,
            drop_window_ratio: 0.20,
            conf_a_drop_scale: 6.0,
            conf_b_slope_scale: 10.0,
        }
    }
}

/// Blend of the four glide confidence components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlideWeights {
    #[serde(rename = "A")]
    pub drop: f64,
    #[serde(rename = "B")]
    pub slope: f64,
    #[serde(rename = "C")]
    pub voicing: f64,
    #[serde(rename = "D")]
    pub fit: f64,
}

impl Default for GlideWeights {
    fn default() -> Self {
        Self {
            drop: 0.35,
            slope: 0.25,
            voicing: 0.20,
            fit: 0.20,
        }
    }
}

/// Complete tuning snapshot for one engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    #[serde(alias = "FOLDER_HINT_WEIGHT")]
    pub folder_hint_weight: u32,
    #[serde(alias = "FILENAME_HINT_WEIGHT")]
    pub filename_hint_weight: u32,
    #[serde(alias = "FOLDER_HINT_CAP")]
    pub folder_hint_cap: u32,
    #[serde(alias = "FILENAME_HINT_CAP")]
    pub filename_hint_cap: u32,
    #[serde(alias = "LOW_CONFIDENCE_THRESHOLD")]
    pub low_confidence_threshold: f64,
    #[serde(alias = "PARENT_FOLDER_LEVELS_TO_SCAN")]
    pub parent_folder_levels: usize,
    #[serde(alias = "FEATURE_THRESHOLDS")]
    pub feature_thresholds: FeatureThresholds,
    #[serde(alias = "AUDIO_WEIGHTS")]
    pub audio_weights: AudioWeights,
    #[serde(alias = "PITCH_WEIGHTS")]
    pub pitch_weights: PitchWeights,
    #[serde(alias = "ANALYSIS_PARAMS")]
    pub analysis: AnalysisParams,
    #[serde(alias = "PITCH_ANALYSIS_PARAMS")]
    pub pitch: PitchParams,
    #[serde(alias = "PITCH_GATE")]
    pub pitch_gate: PitchGate,
    #[serde(alias = "GLIDE_PARAMS")]
    pub glide: GlideParams,
    #[serde(alias = "GLIDE_CONF_WEIGHTS")]
    pub glide_weights: GlideWeights,
    #[serde(alias = "PARALLEL_FEATURE_EXTRACTION")]
    pub parallel_extraction: bool,
    #[serde(alias = "DEFAULT_WORKERS")]
    pub default_workers: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            folder_hint_weight: 20,
            filename_hint_weight: 25,
            folder_hint_cap: 80,
            filename_hint_cap: 40,
            low_confidence_threshold: 0.75,
            parent_folder_levels: 5,
            feature_thresholds: FeatureThresholds::default(),
            audio_weights: AudioWeights::default(),
            pitch_weights: PitchWeights::default(),
            analysis: AnalysisParams::default(),
            pitch: PitchParams::default(),
            pitch_gate: PitchGate::default(),
            glide: GlideParams::default(),
            glide_weights: GlideWeights::default(),
            parallel_extraction: true,
            default_workers: 1,
        }
    }
}

impl Tuning {
    pub fn builder() -> TuningBuilder {
        TuningBuilder::new()
    }

    /// Overlay a partial JSON object onto the defaults.
    ///
    /// Missing keys keep their default; unknown keys are ignored.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// First readable candidate wins; unreadable or invalid files are
    /// skipped with a warning.
    pub fn load(candidates: &[PathBuf]) -> Self {
        for path in candidates {
            if !path.is_file() {
                continue;
            }
            match read_tuning(path) {
                Ok(tuning) => {
                    debug!("Loaded tuning overrides from {}", path.display());
                    return tuning;
                }
                Err(e) => warn!("Ignoring tuning overrides in {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    /// Frame length used by the F0 tracker
    pub fn yin_frame_length(&self) -> usize {
        self.analysis.win.max(self.pitch.yin_frame_length_min)
    }
}

fn read_tuning(path: &Path) -> crate::Result<Tuning> {
    let text = fs::read_to_string(path)?;
    Ok(Tuning::from_json_str(&text)?)
}

/// Fluent construction of a [`Tuning`]
pub struct TuningBuilder {
    tuning: Tuning,
}

impl TuningBuilder {
    pub fn new() -> Self {
        Self {
            tuning: Tuning::default(),
        }
    }

    pub fn from_tuning(tuning: Tuning) -> Self {
        Self { tuning }
    }

    pub fn folder_hint_weight(mut self, weight: u32) -> Self {
        self.tuning.folder_hint_weight = weight;
        self
    }

    pub fn filename_hint_weight(mut self, weight: u32) -> Self {
        self.tuning.filename_hint_weight = weight;
        self
    }

    pub fn low_confidence_threshold(mut self, threshold: f64) -> Self {
        self.tuning.low_confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn parent_folder_levels(mut self, levels: usize) -> Self {
        self.tuning.parent_folder_levels = levels;
        self
    }

    pub fn pitch_gate_enabled(mut self, enabled: bool) -> Self {
        self.tuning.pitch_gate.enabled = enabled;
        self
    }

    pub fn parallel_extraction(mut self, parallel: bool) -> Self {
        self.tuning.parallel_extraction = parallel;
        self
    }

    pub fn default_workers(mut self, workers: usize) -> Self {
        self.tuning.default_workers = workers.max(1);
        self
    }

    pub fn build(self) -> Tuning {
        self.tuning
    }
}

impl Default for TuningBuilder {
    fn default() -> Self {
        Self::new()
    }
}
