// src/classify/hints.rs
//
// Lexical hint scoring over the parent-folder chain and the file name.

use super::bucket::{Bucket, ScoreMap};
use crate::config::{BucketHints, HintKind, Tuning};
use serde::Serialize;
use std::path::Path;

/// Origin of the keyword that matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HintSource {
    DefaultRule,
    UserHint,
}

/// One keyword match that raised a bucket's score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HintMatch {
    pub bucket: Bucket,
    pub keyword: String,
    pub source: HintSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub added: u32,
    pub score_after: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HintScan {
    pub scores: ScoreMap,
    pub matches: Vec<HintMatch>,
}

/// Lower-case and split on runs of space, underscore or hyphen
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split([' ', '_', '-'])
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Match precedence: exact single token, then normalized phrase, then
/// compacted phrase, then raw substring.
pub fn pattern_matches(pattern: &str, raw_lower: &str, tokens: &[String]) -> bool {
    if pattern.is_empty() || pattern == ".mid" {
        return false;
    }
    let pat_lower = pattern.to_lowercase();
    let pat_tokens = tokenize(&pat_lower);
    if pat_tokens.is_empty() {
        return false;
    }

    if pat_tokens.len() == 1 && tokens.iter().any(|t| *t == pat_tokens[0]) {
        return true;
    }
    if tokens.join(" ").contains(&pat_tokens.join(" ")) {
        return true;
    }
    if tokens.concat().contains(&pat_tokens.concat()) {
        return true;
    }
    raw_lower.contains(&pat_lower)
}

struct ScanWeights {
    weight: u32,
    cap: u32,
}

pub struct HintScanner {
    hints: BucketHints,
    folder: ScanWeights,
    filename: ScanWeights,
    levels: usize,
}

impl HintScanner {
    pub fn new(tuning: &Tuning, hints: BucketHints) -> Self {
        Self {
            hints,
            folder: ScanWeights {
                weight: tuning.folder_hint_weight,
                cap: tuning.folder_hint_cap,
            },
            filename: ScanWeights {
                weight: tuning.filename_hint_weight,
                cap: tuning.filename_hint_cap,
            },
            levels: tuning.parent_folder_levels,
        }
    }

    /// Built-in keywords followed by user hints, de-duplicated
    /// case-insensitively
    fn patterns(&self, bucket: Bucket, kind: HintKind) -> Vec<(String, HintSource)> {
        let mut out: Vec<(String, HintSource)> = bucket
            .keywords()
            .iter()
            .map(|k| (k.to_string(), HintSource::DefaultRule))
            .collect();
        for extra in self.hints.extras(bucket, kind) {
            if !out.iter().any(|(p, _)| p.eq_ignore_ascii_case(extra)) {
                out.push((extra.clone(), HintSource::UserHint));
            }
        }
        out
    }

    /// Score the last `parent_folder_levels` components of the parent path
    pub fn scan_folders(&self, path: &Path) -> HintScan {
        let parts: Vec<String> = path
            .parent()
            .map(|p| {
                p.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        let start = parts.len().saturating_sub(self.levels);

        let mut raw = [0u32; Bucket::COUNT];
        let mut matches = Vec::new();
        for part in &parts[start..] {
            let lower = part.to_lowercase();
            let tokens = tokenize(part);
            for bucket in Bucket::ALL {
                for (pattern, source) in self.patterns(bucket, HintKind::Folder) {
                    if !pattern_matches(&pattern, &lower, &tokens) {
                        continue;
                    }
                    if let Some((added, after)) = bump(&mut raw[bucket.index()], &self.folder) {
                        matches.push(HintMatch {
                            bucket,
                            keyword: pattern,
                            source,
                            folder: Some(part.clone()),
                            filename: None,
                            added,
                            score_after: after,
                        });
                    }
                }
            }
        }

        HintScan {
            scores: to_score_map(&raw),
            matches,
        }
    }

    /// Tokens come from the stem; raw matching uses the full name
    pub fn scan_filename(&self, file_name: &str) -> HintScan {
        let lower = file_name.to_lowercase();
        let stem = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tokens = tokenize(&stem);

        let mut raw = [0u32; Bucket::COUNT];
        let mut matches = Vec::new();
        for bucket in Bucket::ALL {
            for (pattern, source) in self.patterns(bucket, HintKind::Filename) {
                if !pattern_matches(&pattern, &lower, &tokens) {
                    continue;
                }
                if let Some((added, after)) = bump(&mut raw[bucket.index()], &self.filename) {
                    matches.push(HintMatch {
                        bucket,
                        keyword: pattern,
                        source,
                        folder: None,
                        filename: Some(file_name.to_string()),
                        added,
                        score_after: after,
                    });
                }
            }
        }

        HintScan {
            scores: to_score_map(&raw),
            matches,
        }
    }
}

/// Add one weight under the cap; returns (added, new score) if it grew
fn bump(score: &mut u32, weights: &ScanWeights) -> Option<(u32, u32)> {
    let previous = *score;
    *score = (previous + weights.weight).min(weights.cap);
    (*score > previous).then(|| (*score - previous, *score))
}

fn to_score_map(raw: &[u32; Bucket::COUNT]) -> ScoreMap {
    let mut scores = ScoreMap::new();
    for bucket in Bucket::ALL {
        scores[bucket] = raw[bucket.index()] as f64;
    }
    scores
}
