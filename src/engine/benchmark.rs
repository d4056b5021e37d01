// src/engine/benchmark.rs
//
// Classifier audit built from an analyze run: bucket distribution,
// low-confidence rates, chosen/runner-up confusion and worst misfits.

use super::report::RunReport;
use crate::classify::Candidate;
use crate::config::Tuning;
use crate::core::CacheStats;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BenchmarkOptions {
    pub top_confusions: usize,
    /// Only the first N classified files are considered
    pub max_files: Option<usize>,
    pub save_feature_cache: bool,
}

impl Default for BenchmarkOptions {
    fn default() -> Self {
        Self {
            top_confusions: 20,
            max_files: None,
            save_feature_cache: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LowConfidence {
    pub count: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketShare {
    pub bucket: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketLowConfidence {
    pub bucket: String,
    pub count: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfusionPair {
    pub chosen: String,
    pub runner_up: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Misfit {
    pub pack: String,
    pub source: PathBuf,
    pub chosen_bucket: String,
    pub top_3_candidates: Vec<Candidate>,
    pub confidence_ratio: f64,
    pub confidence_margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TuningSnapshot {
    pub folder_hint_weight: u32,
    pub filename_hint_weight: u32,
    pub low_confidence_threshold: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub version: u32,
    pub timestamp: DateTime<Local>,
    pub inbox: PathBuf,
    pub hub: PathBuf,
    pub organized_output_root: PathBuf,
    pub files_classified: usize,
    pub files_skipped_non_wav: usize,
    pub errors: usize,
    pub runtime_seconds: f64,
    pub low_confidence: LowConfidence,
    pub bucket_distribution: Vec<BucketShare>,
    pub low_confidence_by_bucket: Vec<BucketLowConfidence>,
    pub confusion_pairs: Vec<ConfusionPair>,
    pub representative_misfits: Vec<Misfit>,
    pub feature_cache_stats: CacheStats,
    pub tuning_snapshot: TuningSnapshot,
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Summarize `report` (normally from an analyze run)
pub fn build_benchmark(
    report: &RunReport,
    inbox: PathBuf,
    tuning: &Tuning,
    options: &BenchmarkOptions,
    runtime: Duration,
) -> BenchmarkReport {
    let limit = options.max_files.unwrap_or(usize::MAX);
    let entries: Vec<_> = report.entries().take(limit).collect();
    let total = entries.len();

    let mut bucket_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut low_by_bucket: BTreeMap<String, usize> = BTreeMap::new();
    let mut confusions: BTreeMap<(String, String), usize> = BTreeMap::new();
    let mut misfits = Vec::new();
    let mut low_total = 0;

    for (pack, entry) in &entries {
        let result = &entry.classification;
        let chosen = result.bucket_label().to_string();
        *bucket_counts.entry(chosen.clone()).or_default() += 1;

        if result.low_confidence {
            low_total += 1;
            *low_by_bucket.entry(chosen.clone()).or_default() += 1;
            misfits.push(Misfit {
                pack: pack.to_string(),
                source: entry.source.clone(),
                chosen_bucket: chosen.clone(),
                top_3_candidates: result.top_3_candidates.clone(),
                confidence_ratio: result.confidence_ratio,
                confidence_margin: result.confidence_margin,
            });
        }

        if let Some(runner_up) = result.top_3_candidates.get(1) {
            *confusions.entry((chosen, runner_up.bucket.id().to_string())).or_default() += 1;
        }
    }

    let mut by_count: Vec<(&String, &usize)> = bucket_counts.iter().collect();
    by_count.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let bucket_distribution = by_count
        .iter()
        .map(|(bucket, &count)| BucketShare {
            bucket: bucket.to_string(),
            count,
            percent: round_to(ratio(count, total) * 100.0, 4),
        })
        .collect();

    let low_confidence_by_bucket = by_count
        .iter()
        .map(|(bucket, &count)| {
            let low = low_by_bucket.get(*bucket).copied().unwrap_or(0);
            BucketLowConfidence {
                bucket: bucket.to_string(),
                count: low,
                rate: round_to(ratio(low, count), 4),
            }
        })
        .collect();

    let mut pairs: Vec<((String, String), usize)> = confusions.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let confusion_pairs = pairs
        .into_iter()
        .take(options.top_confusions.max(1))
        .map(|((chosen, runner_up), count)| ConfusionPair {
            chosen,
            runner_up,
            count,
        })
        .collect();

    misfits.sort_by(|a, b| {
        a.confidence_ratio
            .total_cmp(&b.confidence_ratio)
            .then_with(|| a.confidence_margin.total_cmp(&b.confidence_margin))
            .then_with(|| a.source.cmp(&b.source))
    });
    misfits.truncate((options.top_confusions * 2).clamp(10, 100));

    BenchmarkReport {
        version: 1,
        timestamp: Local::now(),
        inbox: inbox.canonicalize().unwrap_or(inbox),
        hub: report.hub.clone(),
        organized_output_root: report.organized_output_root.clone(),
        files_classified: total,
        files_skipped_non_wav: report.files_skipped_non_wav,
        errors: report.failed,
        runtime_seconds: round_to(runtime.as_secs_f64(), 6),
        low_confidence: LowConfidence {
            count: low_total,
            rate: round_to(ratio(low_total, total), 6),
        },
        bucket_distribution,
        low_confidence_by_bucket,
        confusion_pairs,
        representative_misfits: misfits,
        feature_cache_stats: report.feature_cache_stats.clone(),
        tuning_snapshot: TuningSnapshot {
            folder_hint_weight: tuning.folder_hint_weight,
            filename_hint_weight: tuning.filename_hint_weight,
            low_confidence_threshold: tuning.low_confidence_threshold,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{aggregate, Bucket, ClassificationResult, ScoreBreakdown, ScoreMap};
    use crate::core::{FeatureVector, SkipReason};
    use crate::engine::report::{FileEntry, PackReport};
    use crate::engine::{Mode, TransferAction};
    use std::path::Path;

    fn entry(name: &str, scores: &[(Bucket, f64)]) -> FileEntry {
        let tuning = Tuning::default();
        let mut total = ScoreMap::new();
        for &(b, s) in scores {
            total[b] = s;
        }
        let decision = aggregate(&total, tuning.low_confidence_threshold);
        let features = FeatureVector::zeroed(&tuning, SkipReason::DecodeFailed);
        let breakdown = ScoreBreakdown {
            total,
            ..ScoreBreakdown::default()
        };
        let classification =
            ClassificationResult::from_decision(decision, breakdown, vec![], vec![], &features, &tuning);
        FileEntry {
            source: PathBuf::from(name),
            dest: PathBuf::from(name),
            bucket: classification.bucket_label().to_string(),
            confidence: classification.confidence_ratio,
            action: TransferAction::None,
            reason: classification.reason(),
            classification,
        }
    }

    #[test]
    fn test_benchmark_summary() {
        let mut report = RunReport::new("r".into(), Mode::Analyze, Path::new("/hub"), Path::new("/hub"), 1);
        report.packs.push(PackReport {
            pack: "Pack".into(),
            files: vec![
                entry("a.wav", &[(Bucket::Kicks, 100.0)]),
                entry("b.wav", &[(Bucket::Kicks, 50.0), (Bucket::Snares, 40.0)]),
                entry("c.wav", &[(Bucket::Snares, 30.0), (Bucket::Claps, 30.0)]),
            ],
        });

        let bench = build_benchmark(
            &report,
            PathBuf::from("/inbox"),
            &Tuning::default(),
            &BenchmarkOptions::default(),
            Duration::from_millis(1500),
        );

        assert_eq!(bench.files_classified, 3);
        assert_eq!(bench.low_confidence.count, 2);
        assert_eq!(bench.bucket_distribution[0].bucket, "Kicks");
        assert_eq!(bench.bucket_distribution[0].count, 2);
        assert_eq!(bench.bucket_distribution[0].percent, 66.6667);
        assert_eq!(bench.runtime_seconds, 1.5);
        // worst misfit first
        assert_eq!(bench.representative_misfits[0].source, PathBuf::from("c.wav"));
        assert!(bench
            .confusion_pairs
            .iter()
            .any(|p| p.chosen == "Kicks" && p.runner_up == "Snares" && p.count == 1));
    }
}
