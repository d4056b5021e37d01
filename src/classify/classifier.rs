// src/classify/classifier.rs
//
// Per-file classification: hint scans, cached feature extraction, rule
// scoring and aggregation. Batches fan out over a bounded rayon pool.

use super::bucket::ScoreMap;
use super::hints::HintScanner;
use super::result::{ClassificationResult, ScoreBreakdown};
use super::scoring::{aggregate, audio_scores, pitch_scores};
use crate::config::{BucketHints, Tuning};
use crate::core::analysis::{extract_features, FeatureVector, SkipReason};
use crate::core::decoder::{extract_mono, AudioBackend, SymphoniaBackend};
use crate::core::FeatureCache;
use indicatif::ProgressBar;
use log::{debug, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Names skipped everywhere: macOS resource forks and Finder metadata
pub const IGNORE_RULES: [&str; 3] = ["__MACOSX", ".DS_Store", "._"];

pub fn is_ignored(name: &str) -> bool {
    IGNORE_RULES.iter().any(|rule| name == *rule || name.starts_with(rule))
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
}

pub struct Classifier {
    tuning: Tuning,
    scanner: HintScanner,
    backend: Box<dyn AudioBackend>,
    cache: FeatureCache,
}

impl Classifier {
    pub fn new(tuning: Tuning, hints: BucketHints, cache: FeatureCache) -> Self {
        Self::with_backend(tuning, hints, cache, Box::new(SymphoniaBackend))
    }

    pub fn with_backend(
        tuning: Tuning,
        hints: BucketHints,
        cache: FeatureCache,
        backend: Box<dyn AudioBackend>,
    ) -> Self {
        let scanner = HintScanner::new(&tuning, hints);
        Self {
            tuning,
            scanner,
            backend,
            cache,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn cache(&self) -> &FeatureCache {
        &self.cache
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Cached features for `path`; unreadable audio yields the zero vector
    pub fn features(&self, path: &Path) -> FeatureVector {
        let key = FeatureCache::cache_key(path);
        self.cache.get_or_compute(&key, || self.compute_features(path))
    }

    fn compute_features(&self, path: &Path) -> FeatureVector {
        if !self.backend.is_available() {
            return FeatureVector::zeroed(&self.tuning, SkipReason::BackendUnavailable);
        }

        match self.backend.decode(path) {
            Ok(audio) if audio.channels > 0 => {
                let mono = extract_mono(&audio);
                extract_features(&mono, audio.sample_rate, &self.tuning)
            }
            Ok(_) => {
                warn!("No audio channels in {}", path.display());
                FeatureVector::zeroed(&self.tuning, SkipReason::DecodeFailed)
            }
            Err(e) => {
                warn!("Failed to decode {}: {:#}", path.display(), e);
                FeatureVector::zeroed(&self.tuning, SkipReason::DecodeFailed)
            }
        }
    }

    /// Classify a single file
    pub fn classify(&self, path: &Path) -> ClassificationResult {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if is_ignored(&name) || !is_wav(path) {
            return ClassificationResult::unsorted();
        }

        let folder = self.scanner.scan_folders(path);
        let filename = self.scanner.scan_filename(&name);
        let features = self.features(path);
        let audio = audio_scores(&features, &self.tuning);
        let pitch = pitch_scores(&features, &self.tuning);

        let total = ScoreMap::sum_of(&[&folder.scores, &filename.scores, &audio, &pitch]);
        let decision = aggregate(&total, self.tuning.low_confidence_threshold);
        debug!(
            "{} -> {} (ratio {:.3}, margin {:.1})",
            name, decision.chosen, decision.confidence_ratio, decision.confidence_margin
        );

        let scores = ScoreBreakdown {
            folder: folder.scores,
            filename: filename.scores,
            audio,
            pitch,
            total,
        };
        ClassificationResult::from_decision(
            decision,
            scores,
            folder.matches,
            filename.matches,
            &features,
            &self.tuning,
        )
    }

    /// Classify `paths`, in parallel when allowed. Output order matches
    /// input order.
    pub fn classify_batch(
        &self,
        paths: &[PathBuf],
        workers: usize,
        progress: Option<&ProgressBar>,
    ) -> crate::Result<Vec<ClassificationResult>> {
        let classify_one = |path: &PathBuf| {
            let result = self.classify(path);
            if let Some(pb) = progress {
                pb.inc(1);
            }
            result
        };

        if workers <= 1 || !self.tuning.parallel_extraction || paths.len() <= 1 {
            return Ok(paths.iter().map(classify_one).collect());
        }

        let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
        Ok(pool.install(|| paths.par_iter().map(classify_one).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Bucket, Category};
    use crate::core::NullBackend;

    fn null_classifier() -> Classifier {
        Classifier::with_backend(
            Tuning::default(),
            BucketHints::default(),
            FeatureCache::new("unused.json"),
            Box::new(NullBackend),
        )
    }

    #[test]
    fn test_ignore_rules() {
        assert!(is_ignored("__MACOSX"));
        assert!(is_ignored("._kick.wav"));
        assert!(is_ignored(".DS_Store"));
        assert!(!is_ignored("kick.wav"));
    }

    #[test]
    fn test_non_wav_is_unsorted() {
        let result = null_classifier().classify(Path::new("/packs/Drums/kick.mp3"));
        assert_eq!(result.chosen_bucket, None);
        assert_eq!(result.category, Category::Unsorted);
    }

    #[test]
    fn test_null_backend_uses_hints_only() {
        let classifier = null_classifier();
        let result = classifier.classify(Path::new("/packs/Stuff/kick.wav"));

        assert_eq!(result.chosen_bucket, Some(Bucket::Kicks));
        assert!(result.low_confidence);
        assert_eq!(result.top_3_candidates.len(), 3);
        assert_eq!(result.scores.filename[Bucket::Kicks], 25.0);
        let pitch = result.pitch_summary.as_ref().unwrap();
        assert_eq!(pitch.pitch_skip_reason, "backend_unavailable");
    }

    #[test]
    fn test_batch_preserves_order() {
        let classifier = Classifier::with_backend(
            Tuning::builder().default_workers(4).build(),
            BucketHints::default(),
            FeatureCache::new("unused.json"),
            Box::new(NullBackend),
        );
        let paths: Vec<PathBuf> = ["snare.wav", "kick.wav", "clap.wav", "notes.txt"]
            .iter()
            .map(|n| PathBuf::from("/inbox/pack").join(n))
            .collect();

        let results = classifier.classify_batch(&paths, 4, None).unwrap();
        let labels: Vec<&str> = results.iter().map(|r| r.bucket_label()).collect();
        assert_eq!(labels, vec!["Snares", "Kicks", "Claps", "UNSORTED"]);
    }
}
