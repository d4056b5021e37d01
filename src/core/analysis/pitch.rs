// src/core/analysis/pitch.rs
//
// F0 tracking (YIN) with a deterministic percussive gate.
// Frames that carry no energy are reported as unvoiced (0 Hz).

use super::features::FeatureVector;
use super::glide::{detect_glide, GlideAnalysis};
use crate::config::{PitchGate, Tuning};
use crate::core::dsp::stats::{median, std_dev};
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

/// Why pitch tracking did not run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    SilenceOrZeroSignal,
    HatLikePercussive,
    KickLikePercussive,
    TooShort,
    BackendUnavailable,
    DecodeFailed,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::SilenceOrZeroSignal => "silence_or_zero_signal",
            SkipReason::HatLikePercussive => "hat_like_percussive",
            SkipReason::KickLikePercussive => "kick_like_percussive",
            SkipReason::TooShort => "too_short",
            SkipReason::BackendUnavailable => "backend_unavailable",
            SkipReason::DecodeFailed => "decode_failed",
        }
    }
}

/// Summary of a completed F0 track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchAnalysis {
    pub f0_frames: usize,
    pub voiced_frames: usize,
    pub voiced_ratio: f64,
    pub median_f0: f64,
    /// Std of the voiced track in semitones re 55 Hz
    pub pitch_stability: f64,
    pub glide: GlideAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PitchOutcome {
    Analyzed(PitchAnalysis),
    Skipped { reason: SkipReason },
}

impl PitchOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        PitchOutcome::Skipped { reason }
    }
}

/// Gate check run before YIN; `None` means "track pitch"
pub fn percussive_skip_reason(features: &FeatureVector, gate: &PitchGate) -> Option<SkipReason> {
    if !gate.enabled {
        return None;
    }
    if features.rms_global <= 0.0 {
        return Some(SkipReason::SilenceOrZeroSignal);
    }

    let hat_like = features.duration <= gate.hat_duration_max
        && features.centroid_mean >= gate.hat_centroid_min
        && features.low_freq_ratio <= gate.hat_lowfreq_max
        && features.flatness_mean >= gate.hat_flatness_min
        && features.zcr_mean >= gate.hat_zcr_min;
    if hat_like {
        return Some(SkipReason::HatLikePercussive);
    }

    let kick_like = features.duration <= gate.kick_duration_max
        && features.transient_strength >= gate.kick_transient_min
        && features.centroid_mean >= gate.kick_centroid_min;
    if kick_like {
        return Some(SkipReason::KickLikePercussive);
    }

    None
}

/// Gate, track, and summarize the normalized signal `y`
pub fn analyze_pitch(y: &[f64], sample_rate: u32, features: &FeatureVector, tuning: &Tuning) -> PitchOutcome {
    if let Some(reason) = percussive_skip_reason(features, &tuning.pitch_gate) {
        return PitchOutcome::skipped(reason);
    }

    let tracker = YinTracker::from_tuning(tuning);
    if y.len() < tracker.frame_length {
        return PitchOutcome::skipped(SkipReason::TooShort);
    }

    let f0 = tracker.track(y, sample_rate);
    let voiced: Vec<f64> = f0.iter().copied().filter(|f| f.is_finite() && *f > 0.0).collect();
    let voiced_ratio = if f0.is_empty() {
        0.0
    } else {
        voiced.len() as f64 / f0.len() as f64
    };

    let (median_f0, pitch_stability) = if voiced.is_empty() {
        (0.0, 0.0)
    } else {
        let semitones: Vec<f64> = voiced.iter().map(|f| 12.0 * (f / 55.0).log2()).collect();
        (median(&voiced), std_dev(&semitones))
    };

    let glide = detect_glide(&f0, sample_rate, tracker.hop_length, &tuning.glide, &tuning.glide_weights);

    PitchOutcome::Analyzed(PitchAnalysis {
        f0_frames: f0.len(),
        voiced_frames: voiced.len(),
        voiced_ratio,
        median_f0,
        pitch_stability,
        glide,
    })
}

/// YIN fundamental-frequency estimator. Frames are centered: the signal
/// is zero-padded by `frame_length / 2` on both ends.
#[derive(Debug, Clone)]
pub struct YinTracker {
    pub fmin: f64,
    pub fmax: f64,
    pub frame_length: usize,
    pub hop_length: usize,
    pub threshold: f64,
}

impl YinTracker {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            fmin: tuning.pitch.yin_fmin,
            fmax: tuning.pitch.yin_fmax,
            frame_length: tuning.yin_frame_length(),
            hop_length: tuning.analysis.hop.max(1),
            threshold: tuning.pitch.yin_threshold,
        }
    }

    pub fn num_frames(&self, num_samples: usize) -> usize {
        let padded = num_samples + 2 * (self.frame_length / 2);
        if num_samples == 0 || padded < self.frame_length {
            0
        } else {
            1 + (padded - self.frame_length) / self.hop_length
        }
    }

    fn centered(&self, y: &[f64]) -> Vec<f64> {
        let pad = self.frame_length / 2;
        let mut padded = vec![0.0; y.len() + 2 * pad];
        padded[pad..pad + y.len()].copy_from_slice(y);
        padded
    }

    /// One F0 estimate per frame; 0.0 marks an unvoiced frame
    pub fn track(&self, y: &[f64], sample_rate: u32) -> Vec<f64> {
        let frames = self.num_frames(y.len());
        let sr = sample_rate as f64;
        let w = self.frame_length / 2;
        let min_period = ((sr / self.fmax).floor() as usize).max(1);
        let max_period = ((sr / self.fmin).ceil() as usize).min(self.frame_length.saturating_sub(w + 1));
        if frames == 0 || w == 0 || min_period >= max_period {
            return vec![0.0; frames];
        }
        let y = self.centered(y);

        let span = w + max_period;
        let fft_len = (w + span).next_power_of_two();
        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);

        let mut head_buf = vec![Complex::new(0.0, 0.0); fft_len];
        let mut span_buf = vec![Complex::new(0.0, 0.0); fft_len];
        let mut prefix = vec![0.0; span + 1];
        let mut cmnd = vec![1.0; max_period + 1];

        (0..frames)
            .map(|index| {
                let start = index * self.hop_length;
                let frame = &y[start..start + span];

                for (i, &s) in frame.iter().enumerate() {
                    prefix[i + 1] = prefix[i] + s * s;
                }
                let head_energy = prefix[w];
                if head_energy <= f64::EPSILON {
                    return 0.0;
                }

                for (i, slot) in head_buf.iter_mut().enumerate() {
                    *slot = Complex::new(if i < w { frame[i] } else { 0.0 }, 0.0);
                }
                for (i, slot) in span_buf.iter_mut().enumerate() {
                    *slot = Complex::new(if i < span { frame[i] } else { 0.0 }, 0.0);
                }
                forward.process(&mut head_buf);
                forward.process(&mut span_buf);
                for (a, b) in head_buf.iter_mut().zip(&span_buf) {
                    *a = a.conj() * b;
                }
                inverse.process(&mut head_buf);
                let scale = fft_len as f64;

                // cumulative mean normalized difference
                let mut running = 0.0;
                for tau in 1..=max_period {
                    let cross = head_buf[tau].re / scale;
                    let shifted_energy = prefix[tau + w] - prefix[tau];
                    let diff = (head_energy + shifted_energy - 2.0 * cross).max(0.0);
                    running += diff;
                    cmnd[tau] = if running > 0.0 {
                        diff * tau as f64 / running
                    } else {
                        1.0
                    };
                }

                let period = self.pick_period(&cmnd, min_period, max_period);
                if period > 0.0 {
                    sr / period
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// First dip under the threshold (walked to its trough), else the
    /// global minimum; refined by parabolic interpolation.
    fn pick_period(&self, cmnd: &[f64], min_period: usize, max_period: usize) -> f64 {
        let mut chosen = None;
        for tau in min_period..=max_period {
            if cmnd[tau] < self.threshold {
                let mut t = tau;
                while t < max_period && cmnd[t + 1] < cmnd[t] {
                    t += 1;
                }
                chosen = Some(t);
                break;
            }
        }

        let tau = chosen.unwrap_or_else(|| {
            (min_period..=max_period)
                .min_by(|&a, &b| cmnd[a].total_cmp(&cmnd[b]))
                .unwrap_or(min_period)
        });

        let mut shift = 0.0;
        if tau > min_period && tau < max_period {
            let (prev, cur, next) = (cmnd[tau - 1], cmnd[tau], cmnd[tau + 1]);
            let denom = prev - 2.0 * cur + next;
            if denom.abs() > f64::EPSILON {
                shift = (0.5 * (prev - next) / denom).clamp(-0.5, 0.5);
            }
        }
        tau as f64 + shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, secs: f64, sr: u32) -> Vec<f64> {
        let n = (secs * sr as f64) as usize;
        (0..n).map(|i| (2.0 * PI * freq * i as f64 / sr as f64).sin()).collect()
    }

    fn features_with(duration: f64, rms_global: f64) -> FeatureVector {
        let mut f = FeatureVector::zeroed(&Tuning::default(), SkipReason::TooShort);
        f.duration = duration;
        f.rms_global = rms_global;
        f
    }

    #[test]
    fn test_yin_tracks_sine() {
        let tuning = Tuning::default();
        let tracker = YinTracker::from_tuning(&tuning);
        for &freq in &[60.0, 220.0, 440.0] {
            let y = sine(freq, 0.5, 22050);
            let f0 = tracker.track(&y, 22050);
            assert_eq!(f0.len(), tracker.num_frames(y.len()));
            let est = median(&f0);
            assert!((est - freq).abs() / freq < 0.02, "expected {}, got {}", freq, est);
        }
    }

    #[test]
    fn test_yin_frames_are_centered() {
        let tracker = YinTracker::from_tuning(&Tuning::default());
        assert_eq!(tracker.frame_length, 2207);
        assert_eq!(tracker.num_frames(0), 0);
        // 0.4 s at 22.05 kHz
        assert_eq!(tracker.num_frames(8820), 18);
        assert_eq!(tracker.num_frames(1), 1);

        let y = sine(60.0, 0.4, 22050);
        let f0 = tracker.track(&y, 22050);
        assert_eq!(f0.len(), 18);
        assert_eq!(f0[0], 0.0);
        assert!(f0[1..].iter().all(|&f| (f - 60.0).abs() < 3.0), "{:?}", f0);
    }

    #[test]
    fn test_yin_silence_is_unvoiced() {
        let tracker = YinTracker::from_tuning(&Tuning::default());
        let f0 = tracker.track(&vec![0.0; 8000], 22050);
        assert!(!f0.is_empty());
        assert!(f0.iter().all(|&f| f == 0.0));
    }

    #[test]
    fn test_gate_silence() {
        let gate = PitchGate::default();
        assert_eq!(
            percussive_skip_reason(&features_with(0.5, 0.0), &gate),
            Some(SkipReason::SilenceOrZeroSignal)
        );
        assert_eq!(percussive_skip_reason(&features_with(0.5, 0.3), &gate), None);
    }

    #[test]
    fn test_gate_hat_and_kick() {
        let gate = PitchGate::default();
        let mut hat = features_with(0.1, 0.3);
        hat.centroid_mean = 8000.0;
        hat.low_freq_ratio = 0.01;
        hat.flatness_mean = 0.6;
        hat.zcr_mean = 0.3;
        assert_eq!(percussive_skip_reason(&hat, &gate), Some(SkipReason::HatLikePercussive));

        let mut kick = features_with(0.2, 0.3);
        kick.transient_strength = 6.0;
        kick.centroid_mean = 900.0;
        assert_eq!(percussive_skip_reason(&kick, &gate), Some(SkipReason::KickLikePercussive));

        let disabled = PitchGate {
            enabled: false,
            ..PitchGate::default()
        };
        assert_eq!(percussive_skip_reason(&kick, &disabled), None);
    }

    #[test]
    fn test_analyze_pitch_short_signal() {
        let tuning = Tuning::default();
        let y = sine(100.0, 0.05, 22050);
        let outcome = analyze_pitch(&y, 22050, &features_with(0.05, 0.7), &tuning);
        assert_eq!(outcome, PitchOutcome::skipped(SkipReason::TooShort));
    }

    #[test]
    fn test_analyze_pitch_stable_tone() {
        let tuning = Tuning::default();
        let y = sine(60.0, 0.6, 22050);
        match analyze_pitch(&y, 22050, &features_with(0.6, 0.7), &tuning) {
            PitchOutcome::Analyzed(p) => {
                // only the first frame, whose head is all padding, is unvoiced
                assert_eq!(p.f0_frames, 1 + (y.len() - 1) / 512);
                assert_eq!(p.voiced_frames, p.f0_frames - 1);
                assert!(p.voiced_ratio > 0.95);
                assert!((p.median_f0 - 60.0).abs() < 1.5);
                assert!(p.pitch_stability < 0.2);
                assert!(!p.glide.detected);
            }
            other => panic!("expected analysis, got {:?}", other),
        }
    }

    #[test]
    fn test_outcome_serde_tagging() {
        let json = serde_json::to_value(PitchOutcome::skipped(SkipReason::HatLikePercussive)).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "hat_like_percussive");
    }
}
