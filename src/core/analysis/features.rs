// src/core/analysis/features.rs
//
// Spectral and temporal feature extraction for one decoded sample.

use super::glide::GlideAnalysis;
use super::pitch::{analyze_pitch, PitchAnalysis, PitchOutcome, SkipReason};
use crate::config::Tuning;
use crate::core::dsp::stats::{
    mean, median, peak_amplitude, rms, spectral_centroid, spectral_flatness, spectral_rms, zero_crossing_rate,
};
use crate::core::dsp::{StftProcessor, WindowType};
use serde::{Deserialize, Serialize};

/// Immutable per-file feature record, cached by path, size and mtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub duration: f64,
    pub sample_rate: u32,
    pub num_samples: usize,
    pub analysis_window: usize,
    pub analysis_hop: usize,
    pub rms_global: f64,
    pub rms_frame_mean: f64,
    pub rms_frame_max: f64,
    pub low_freq_ratio: f64,
    pub transient_strength: f64,
    pub centroid_mean: f64,
    pub centroid_early: f64,
    pub zcr_mean: f64,
    pub flatness_mean: f64,
    pub pitch: PitchOutcome,
}

impl FeatureVector {
    /// All-zero features, used when audio cannot be read
    pub fn zeroed(tuning: &Tuning, reason: SkipReason) -> Self {
        Self {
            duration: 0.0,
            sample_rate: 0,
            num_samples: 0,
            analysis_window: tuning.analysis.win,
            analysis_hop: tuning.analysis.hop,
            rms_global: 0.0,
            rms_frame_mean: 0.0,
            rms_frame_max: 0.0,
            low_freq_ratio: 0.0,
            transient_strength: 0.0,
            centroid_mean: 0.0,
            centroid_early: 0.0,
            zcr_mean: 0.0,
            flatness_mean: 0.0,
            pitch: PitchOutcome::skipped(reason),
        }
    }

    pub fn pitch_analysis(&self) -> Option<&PitchAnalysis> {
        match &self.pitch {
            PitchOutcome::Analyzed(p) => Some(p),
            PitchOutcome::Skipped { .. } => None,
        }
    }

    pub fn pitch_available(&self) -> bool {
        self.pitch_analysis().is_some()
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self.pitch {
            PitchOutcome::Skipped { reason } => Some(reason),
            PitchOutcome::Analyzed(_) => None,
        }
    }

    pub fn voiced_ratio(&self) -> f64 {
        self.pitch_analysis().map_or(0.0, |p| p.voiced_ratio)
    }

    pub fn median_f0(&self) -> f64 {
        self.pitch_analysis().map_or(0.0, |p| p.median_f0)
    }

    pub fn pitch_stability(&self) -> f64 {
        self.pitch_analysis().map_or(0.0, |p| p.pitch_stability)
    }

    pub fn glide(&self) -> GlideAnalysis {
        self.pitch_analysis().map(|p| p.glide.clone()).unwrap_or_default()
    }
}

/// Frames covering `seconds`, rounded up
fn frames_for(seconds: f64, sample_rate: u32, hop: usize) -> usize {
    (seconds * sample_rate as f64 / hop as f64 + 0.999) as usize
}

/// Extract features from mono samples at `sample_rate`.
///
/// The signal is peak-normalized first, so level does not affect any
/// feature except through silence detection.
pub fn extract_features(samples: &[f64], sample_rate: u32, tuning: &Tuning) -> FeatureVector {
    let params = &tuning.analysis;
    if samples.is_empty() || sample_rate == 0 {
        let mut empty = FeatureVector::zeroed(tuning, SkipReason::TooShort);
        empty.sample_rate = sample_rate;
        return empty;
    }

    let eps = params.eps;
    let peak = peak_amplitude(samples);
    let y: Vec<f64> = samples.iter().map(|s| s / (peak + eps)).collect();

    let mut stft = StftProcessor::new(params.win, params.hop, WindowType::Hann);
    let freqs = stft.bin_frequencies(sample_rate);
    let low_bins = freqs.iter().take_while(|&&f| f < params.low_freq_cutoff_hz).count();

    let mut frame_rms = Vec::new();
    let mut centroids = Vec::new();
    let mut flatness = Vec::new();
    let mut magnitudes = vec![0.0; freqs.len()];
    let mut low_power = 0.0;
    let mut total_power = 0.0;

    stft.for_each_frame(&y, |_, _, power| {
        frame_rms.push(spectral_rms(power, params.win));

        low_power += power[..low_bins].iter().sum::<f64>();
        total_power += power.iter().sum::<f64>();

        for (m, p) in magnitudes.iter_mut().zip(power) {
            *m = p.sqrt();
        }
        centroids.push(spectral_centroid(&magnitudes, &freqs, eps));
        flatness.push(spectral_flatness(power, params.flatness_amin, eps));
    });

    // crossings are counted on edge-padded frames
    let zcrs: Vec<f64> = (0..stft.num_frames(y.len()))
        .map(|index| zero_crossing_rate(&stft.frame_edge(&y, index)))
        .collect();

    let early = frames_for(params.transient_early_seconds, sample_rate, params.hop)
        .max(1)
        .min(frame_rms.len());
    let mid = frames_for(params.transient_mid_seconds, sample_rate, params.hop).max(1);
    let peak_early = frame_rms[..early].iter().copied().fold(0.0, f64::max);
    let mid_end = (early + mid).min(frame_rms.len());
    let mid_level = if mid_end > early {
        median(&frame_rms[early..mid_end])
    } else {
        median(&frame_rms)
    };

    let centroid_frames = frames_for(params.centroid_early_seconds, sample_rate, params.hop)
        .max(1)
        .min(centroids.len());

    let mut features = FeatureVector {
        duration: samples.len() as f64 / sample_rate as f64,
        sample_rate,
        num_samples: samples.len(),
        analysis_window: params.win,
        analysis_hop: params.hop,
        rms_global: rms(&y),
        rms_frame_mean: mean(&frame_rms),
        rms_frame_max: frame_rms.iter().copied().fold(0.0, f64::max),
        low_freq_ratio: low_power / (total_power + eps),
        transient_strength: peak_early / (mid_level + eps),
        centroid_mean: mean(&centroids),
        centroid_early: mean(&centroids[..centroid_frames]),
        zcr_mean: mean(&zcrs),
        flatness_mean: mean(&flatness),
        pitch: PitchOutcome::skipped(SkipReason::TooShort),
    };
    features.pitch = analyze_pitch(&y, sample_rate, &features, tuning);
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const SR: u32 = 22050;

    fn sine(freq: f64, secs: f64) -> Vec<f64> {
        let n = (secs * SR as f64) as usize;
        (0..n).map(|i| 0.5 * (2.0 * PI * freq * i as f64 / SR as f64).sin()).collect()
    }

    fn noise(secs: f64) -> Vec<f64> {
        // xorshift keeps the test deterministic
        let n = (secs * SR as f64) as usize;
        let mut state: u32 = 0x1234_5678;
        (0..n)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as f64 / u32::MAX as f64) * 2.0 - 1.0
            })
            .collect()
    }

    #[test]
    fn test_low_sine_features() {
        let tuning = Tuning::default();
        let f = extract_features(&sine(60.0, 0.5), SR, &tuning);

        assert!((f.duration - 0.5).abs() < 1e-9);
        assert_eq!(f.analysis_window, 2048);
        assert!(f.low_freq_ratio > 0.9, "low ratio {}", f.low_freq_ratio);
        assert!(f.centroid_mean < 300.0, "centroid {}", f.centroid_mean);
        assert!(f.zcr_mean < 0.08);
        assert!(f.flatness_mean < 0.3);
        // peak normalized sine
        assert!((f.rms_global - std::f64::consts::FRAC_1_SQRT_2).abs() < 0.01);
        assert!(f.pitch_available());
        assert!((f.median_f0() - 60.0).abs() < 2.0);
    }

    #[test]
    fn test_frame_rms_and_zcr_use_analysis_frames() {
        let tuning = Tuning::default();
        let f = extract_features(&sine(440.0, 0.5), SR, &tuning);

        // Hann-weighted frame of a unit sine: sqrt(0.5 * 3/8)
        let windowed_rms = (0.5f64 * 0.375).sqrt();
        assert!((f.rms_frame_max - windowed_rms).abs() < 0.01, "rms max {}", f.rms_frame_max);
        assert!(f.rms_frame_mean < f.rms_frame_max);

        // 2 * 440 / 22050 crossings per sample inside the signal; the
        // edge-padded end frames hold fewer
        assert!(f.zcr_mean > 0.034 && f.zcr_mean < 0.040, "zcr {}", f.zcr_mean);
    }

    #[test]
    fn test_noise_features() {
        let tuning = Tuning::default();
        let f = extract_features(&noise(0.5), SR, &tuning);

        assert!(f.low_freq_ratio < 0.05);
        assert!(f.centroid_mean > 4000.0);
        assert!(f.zcr_mean > 0.3);
        assert!(f.flatness_mean > 0.3);
    }

    #[test]
    fn test_silence_features() {
        let tuning = Tuning::default();
        let f = extract_features(&vec![0.0; SR as usize / 2], SR, &tuning);

        assert_eq!(f.rms_global, 0.0);
        assert_eq!(f.transient_strength, 0.0);
        assert_eq!(f.centroid_mean, 0.0);
        assert_eq!(f.low_freq_ratio, 0.0);
        assert_eq!(f.skip_reason(), Some(SkipReason::SilenceOrZeroSignal));
        assert_eq!(f.voiced_ratio(), 0.0);
    }

    #[test]
    fn test_transient_strength_for_decaying_hit() {
        let tuning = Tuning::default();
        let n = (0.3 * SR as f64) as usize;
        let hit: Vec<f64> = (0..n)
            .map(|i| {
                let t = i as f64 / SR as f64;
                let attack = if t < 0.01 { 4.0 } else { 1.0 };
                attack * (2.0 * PI * 60.0 * t).sin() * (-8.0 * t).exp()
            })
            .collect();
        let f = extract_features(&hit, SR, &tuning);
        assert!(f.transient_strength > 3.0, "transient {}", f.transient_strength);
        assert!(f.duration < 0.35);
    }

    #[test]
    fn test_empty_input_is_zeroed() {
        let tuning = Tuning::default();
        let f = extract_features(&[], SR, &tuning);
        assert_eq!(f.duration, 0.0);
        assert_eq!(f.skip_reason(), Some(SkipReason::TooShort));
        assert_eq!(f.glide(), GlideAnalysis::default());
    }

    #[test]
    fn test_serde_round_trip() {
        let tuning = Tuning::default();
        let f = extract_features(&sine(110.0, 0.3), SR, &tuning);
        let json = serde_json::to_string(&f).unwrap();
        let back: FeatureVector = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pitch_available(), f.pitch_available());
        assert!((back.centroid_mean - f.centroid_mean).abs() < 1e-9);
    }
}
