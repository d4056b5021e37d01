// src/core/analysis/glide.rs
//
// Descending pitch-glide detection over an F0 track: semitone conversion,
// median + mean smoothing, end trimming, Theil-Sen slope, robust drop and
// residual spread.

use crate::config::{GlideParams, GlideWeights};
use crate::core::dsp::stats::{median, median_abs_deviation, median_filter, moving_average};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlideAnalysis {
    pub detected: bool,
    pub confidence: f64,
    pub drop_st: f64,
    pub slope_st_per_sec: f64,
    pub residual_mad: f64,
    pub voiced_frames: usize,
    pub voiced_ratio: f64,
    pub duration: f64,
    pub guardrails_passed: bool,
}

/// Analyze an F0 track (0 or non-finite = unvoiced) for a downward glide
pub fn detect_glide(
    f0: &[f64],
    sample_rate: u32,
    hop: usize,
    params: &GlideParams,
    weights: &GlideWeights,
) -> GlideAnalysis {
    let mut result = GlideAnalysis::default();
    if f0.is_empty() || sample_rate == 0 {
        return result;
    }

    let frame_secs = hop as f64 / sample_rate as f64;
    let voiced: Vec<(f64, f64)> = f0
        .iter()
        .enumerate()
        .filter(|(_, f)| f.is_finite() && **f > 0.0)
        .map(|(i, &f)| (i as f64 * frame_secs, 12.0 * (f / 55.0).log2()))
        .collect();

    result.voiced_frames = voiced.len();
    result.voiced_ratio = voiced.len() as f64 / f0.len() as f64;
    result.duration = f0.len() as f64 * frame_secs;

    if result.duration < params.duration_min
        || result.voiced_ratio < params.voiced_ratio_min
        || result.voiced_frames < params.min_voiced_frames
    {
        return result;
    }
    result.guardrails_passed = true;

    let times: Vec<f64> = voiced.iter().map(|&(t, _)| t).collect();
    let semitones: Vec<f64> = voiced.iter().map(|&(_, s)| s).collect();
    let smoothed = moving_average(
        &median_filter(&semitones, params.median_filter_size),
        params.mean_filter_size,
    );

    let n = smoothed.len();
    if n < params.min_voiced_frames {
        return result;
    }
    let start = (n as f64 * params.trim_ratio) as usize;
    let end = (n as f64 * (1.0 - params.trim_ratio)) as usize;
    if end <= start || end - start < 3 {
        return result;
    }
    let t_u = &times[start..end];
    let s_u = &smoothed[start..end];

    let Some(slope) = theil_sen_slope(t_u, s_u, params.theil_sen_max_points) else {
        return result;
    };

    let q = s_u.len();
    let window = ((q as f64 * params.drop_window_ratio) as usize).max(1);
    let drop_st = median(&s_u[..window]) - median(&s_u[q - window..]);

    let intercept_terms: Vec<f64> = t_u.iter().zip(s_u).map(|(t, s)| s - slope * t).collect();
    let intercept = median(&intercept_terms);
    let residuals: Vec<f64> = t_u
        .iter()
        .zip(s_u)
        .map(|(t, s)| s - (slope * t + intercept))
        .collect();
    let mad = median_abs_deviation(&residuals);

    result.slope_st_per_sec = slope;
    result.drop_st = drop_st;
    result.residual_mad = mad;

    if drop_st >= params.drop_st_min && slope <= params.slope_max_st_per_sec && mad <= params.mad_max {
        let a = (drop_st / params.conf_a_drop_scale).clamp(0.0, 1.0);
        let b = (-slope / params.conf_b_slope_scale).clamp(0.0, 1.0);
        let c = ((result.voiced_ratio - params.voiced_ratio_min) / params.voiced_ratio_min).clamp(0.0, 1.0);
        let d = ((params.mad_max - mad) / params.mad_max).clamp(0.0, 1.0);
        result.detected = true;
        result.confidence = weights.drop * a + weights.slope * b + weights.voicing * c + weights.fit * d;
    }

    result
}

/// Median pairwise slope over at most `max_points` evenly spaced samples
fn theil_sen_slope(t: &[f64], s: &[f64], max_points: usize) -> Option<f64> {
    let len = t.len();
    let indices: Vec<usize> = if len > max_points && max_points >= 2 {
        (0..max_points)
            .map(|k| k * (len - 1) / (max_points - 1))
            .collect()
    } else {
        (0..len).collect()
    };

    let mut slopes = Vec::with_capacity(indices.len() * indices.len() / 2);
    for (a, &i) in indices.iter().enumerate() {
        for &j in &indices[a + 1..] {
            let dt = t[j] - t[i];
            if dt > 0.0 {
                slopes.push((s[j] - s[i]) / dt);
            }
        }
    }

    if slopes.is_empty() {
        None
    } else {
        Some(median(&slopes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 22050;
    const HOP: usize = 512;

    fn track(len: usize, f: impl Fn(f64) -> f64) -> Vec<f64> {
        let frame_secs = HOP as f64 / SR as f64;
        (0..len).map(|i| f(i as f64 * frame_secs)).collect()
    }

    fn detect(f0: &[f64]) -> GlideAnalysis {
        detect_glide(f0, SR, HOP, &GlideParams::default(), &GlideWeights::default())
    }

    #[test]
    fn test_exponential_descent_detected() {
        // 65 Hz falling to 45 Hz over about one second
        let f0 = track(40, |t| 65.0 * (45.0f64 / 65.0).powf(t / 0.93));
        let g = detect(&f0);
        assert!(g.guardrails_passed);
        assert!(g.detected, "{:?}", g);
        assert!(g.drop_st > 3.0);
        assert!(g.slope_st_per_sec < -5.0);
        assert!(g.residual_mad < 0.05);
        assert!(g.confidence > 0.5 && g.confidence <= 1.0);
    }

    #[test]
    fn test_flat_pitch_not_detected() {
        let f0 = track(40, |_| 55.0);
        let g = detect(&f0);
        assert!(g.guardrails_passed);
        assert!(!g.detected);
        assert!(g.drop_st.abs() < 1e-9);
        assert_eq!(g.confidence, 0.0);
    }

    #[test]
    fn test_rising_pitch_not_detected() {
        let f0 = track(40, |t| 45.0 * (65.0f64 / 45.0).powf(t / 0.93));
        let g = detect(&f0);
        assert!(!g.detected);
        assert!(g.slope_st_per_sec > 0.0);
    }

    #[test]
    fn test_guardrails() {
        // too short
        let g = detect(&track(10, |_| 60.0));
        assert!(!g.guardrails_passed);
        assert_eq!(g.voiced_frames, 10);

        // mostly unvoiced
        let sparse = track(40, |t| if t < 0.2 { 60.0 } else { 0.0 });
        let g = detect(&sparse);
        assert!(!g.guardrails_passed);
        assert!(g.voiced_ratio < 0.35);
    }

    #[test]
    fn test_theil_sen_ignores_outlier() {
        let t: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let mut s: Vec<f64> = t.iter().map(|x| -2.0 * x).collect();
        s[7] = 100.0;
        let slope = theil_sen_slope(&t, &s, 100).unwrap();
        assert!((slope + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_theil_sen_subsampling_keeps_endpoints() {
        let t: Vec<f64> = (0..500).map(|i| i as f64 * 0.01).collect();
        let s: Vec<f64> = t.iter().map(|x| 3.0 * x).collect();
        let slope = theil_sen_slope(&t, &s, 100).unwrap();
        assert!((slope - 3.0).abs() < 1e-9);
    }
}
