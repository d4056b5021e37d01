// src/classify/scoring.rs
//
// Rule-based audio and pitch scoring, and aggregation of all score
// sources into a ranked decision.

use super::bucket::{Bucket, ScoreMap};
use crate::config::Tuning;
use crate::core::analysis::FeatureVector;
use serde::Serialize;

/// Shape flags shared by the audio and pitch rules
struct Shape {
    kick_like: bool,
    hat_like: bool,
}

impl Shape {
    fn of(f: &FeatureVector, tuning: &Tuning) -> Self {
        let th = &tuning.feature_thresholds;
        Self {
            kick_like: f.duration < th.kick_duration_max && f.transient_strength > th.transient_kick_min,
            hat_like: f.centroid_mean >= th.centroid_bright
                && f.low_freq_ratio <= th.lowfreq_ratio_hat_max
                && f.flatness_mean >= th.flatness_high
                && f.zcr_mean >= th.zcr_high,
        }
    }
}

/// Score buckets from spectral/temporal features
pub fn audio_scores(f: &FeatureVector, tuning: &Tuning) -> ScoreMap {
    let th = &tuning.feature_thresholds;
    let w = &tuning.audio_weights;
    let shape = Shape::of(f, tuning);
    let tonal_808 = f.duration >= th.duration_808_min
        && f.low_freq_ratio >= th.lowfreq_ratio_808
        && f.zcr_mean <= th.zcr_tonal_max;

    let mut s = ScoreMap::new();

    if !shape.kick_like {
        if f.duration > th.duration_808_min {
            s[Bucket::EightOhEight] += w.duration;
        }
        if f.low_freq_ratio > th.lowfreq_ratio_808 {
            s[Bucket::EightOhEight] += w.lowfreq;
        }
        if f.centroid_mean < th.centroid_low {
            s[Bucket::EightOhEight] += w.centroid;
        }
        if f.zcr_mean < th.zcr_tonal_max {
            s[Bucket::EightOhEight] += w.zcr;
        }
    }

    if f.duration < th.kick_duration_max {
        s[Bucket::Kicks] += w.duration;
    }
    if f.transient_strength > th.transient_kick_min {
        s[Bucket::Kicks] += w.transient;
    }
    if shape.kick_like && !tonal_808 && f.low_freq_ratio > th.kick_lowfreq_min {
        s[Bucket::Kicks] += w.lowfreq;
    }
    if shape.kick_like && !shape.hat_like {
        if f.centroid_early > th.kick_centroid_early_min {
            s[Bucket::Kicks] += w.centroid;
        }
        if f.centroid_early > th.centroid_bright {
            s[Bucket::Kicks] += w.centroid;
        }
        s[Bucket::Kicks] += w.transient + w.duration;
    }

    for bucket in [Bucket::HiHats, Bucket::Cymbals] {
        if f.centroid_mean > th.centroid_bright {
            s[bucket] += w.centroid;
        }
        if f.low_freq_ratio < th.lowfreq_ratio_hat_max {
            s[bucket] += w.lowfreq;
        }
        if f.duration < th.hat_duration_max {
            s[bucket] += w.duration;
        }
        if f.flatness_mean > th.flatness_high {
            s[bucket] += w.flatness;
            if f.zcr_mean > th.zcr_high {
                s[bucket] += w.zcr;
            }
        }
    }

    if f.low_freq_ratio < th.snare_clap_lowfreq_max {
        for bucket in [Bucket::Snares, Bucket::Claps] {
            if f.flatness_mean > th.snare_clap_flatness_min && f.zcr_mean > th.zcr_high {
                s[bucket] += w.flatness;
            }
            if f.transient_strength > th.snare_clap_transient_min && f.zcr_mean > th.zcr_tonal_max {
                s[bucket] += w.transient * 0.5;
            }
            if (th.centroid_moderate_low..=th.centroid_moderate_high).contains(&f.centroid_mean) {
                s[bucket] += w.centroid * 0.5;
            }
        }
    }

    if f.transient_strength > th.percs_transient_min
        && f.duration < th.percs_duration_max
        && f.low_freq_ratio < th.percs_lowfreq_max
        && f.zcr_mean > th.zcr_tonal_max
    {
        s[Bucket::Percs] += w.transient;
    }

    if f.centroid_mean < th.vox_centroid_max
        && f.low_freq_ratio < th.vox_lowfreq_max
        && f.duration > th.fx_duration_min
        && !tonal_808
    {
        s[Bucket::Vox] += w.duration;
    }

    if f.flatness_mean > th.fx_flatness_min && f.duration > th.fx_duration_min {
        s[Bucket::Fx] += w.flatness;
    }

    s
}

/// Score buckets from the F0 track; all zero when pitch was skipped
pub fn pitch_scores(f: &FeatureVector, tuning: &Tuning) -> ScoreMap {
    let mut s = ScoreMap::new();
    let Some(pitch) = f.pitch_analysis() else {
        return s;
    };

    let th = &tuning.feature_thresholds;
    let pp = &tuning.pitch;
    let pw = &tuning.pitch_weights;
    let shape = Shape::of(f, tuning);
    let f0_in_808_range = (pp.median_f0_808_min..=pp.median_f0_808_max).contains(&pitch.median_f0);
    let tonal_808 = f.duration >= th.duration_808_min
        && f.low_freq_ratio >= th.lowfreq_ratio_808
        && f0_in_808_range
        && pitch.voiced_ratio >= pp.voiced_ratio_808_min;

    if !shape.kick_like {
        if f0_in_808_range {
            s[Bucket::EightOhEight] += pw.median_f0_low;
        }
        if pitch.voiced_ratio >= pp.voiced_ratio_808_min {
            s[Bucket::EightOhEight] += pw.voiced_ratio;
        }
        if pitch.glide.detected {
            s[Bucket::EightOhEight] += pw.glide_bonus * pitch.glide.confidence;
        }
        if pitch.pitch_stability <= pp.pitch_stability_std_max {
            s[Bucket::EightOhEight] += pw.stability_bonus;
        }
    }

    if shape.kick_like && !shape.hat_like && pitch.voiced_ratio < pp.kick_voiced_ratio_max {
        s[Bucket::Kicks] += tuning.audio_weights.zcr * 0.5;
    }

    if pitch.voiced_ratio > th.vox_voiced_ratio_min
        && f.centroid_mean < th.vox_centroid_max
        && f.low_freq_ratio < th.vox_lowfreq_max
        && !tonal_808
    {
        s[Bucket::Vox] += tuning.audio_weights.duration;
    }

    s
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate {
    pub bucket: Bucket,
    pub score: f64,
}

/// Ranked outcome of summing every score source
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub chosen: Bucket,
    /// Exactly three entries
    pub top3: Vec<Candidate>,
    pub confidence_ratio: f64,
    pub confidence_margin: f64,
    pub low_confidence: bool,
}

/// Rank `final_scores`; the best bucket is assigned even at low confidence
pub fn aggregate(final_scores: &ScoreMap, low_confidence_threshold: f64) -> Decision {
    let ranked = final_scores.ranked();
    let mut top3: Vec<Candidate> = ranked
        .iter()
        .take(3)
        .map(|&(bucket, score)| Candidate { bucket, score })
        .collect();
    // only reachable with a taxonomy smaller than three buckets
    while top3.len() < 3 {
        let filler = Bucket::ALL
            .iter()
            .copied()
            .find(|b| !top3.iter().any(|c| c.bucket == *b))
            .unwrap_or(Bucket::Midi);
        top3.push(Candidate {
            bucket: filler,
            score: 0.0,
        });
    }

    let (s1, s2, s3) = (top3[0].score, top3[1].score, top3[2].score);
    let confidence_ratio = s1 / (s1 + s2 + s3).max(1.0);

    Decision {
        chosen: top3[0].bucket,
        confidence_ratio,
        confidence_margin: s1 - s2,
        low_confidence: confidence_ratio < low_confidence_threshold,
        top3,
    }
}

/// Two-decimal score rendering that drops redundant trailing zeros
pub fn format_score(score: f64) -> String {
    let fixed = format!("{:.2}", score);
    let trimmed = fixed.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Human-readable routing reason used in reports and audit rows
pub fn reason_text(chosen: Option<Bucket>, confidence: f64, candidates: &[Candidate], low_confidence: bool) -> String {
    let listed: Vec<String> = candidates
        .iter()
        .map(|c| format!("{}:{}", c.bucket, format_score(c.score)))
        .collect();

    let Some(bucket) = chosen else {
        return if listed.is_empty() {
            "no matches".to_string()
        } else {
            listed.join("; ")
        };
    };

    let mut reason = format!("best match: {}, confidence={:.2}", bucket, confidence);
    if low_confidence {
        reason.push_str("; low confidence");
    }
    if !listed.is_empty() {
        reason.push_str("; candidates: ");
        reason.push_str(&listed.join(", "));
    }
    reason
}
