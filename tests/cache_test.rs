// tests/cache_test.rs
//
// Feature cache persistence across engines.

mod test_utils;

use samplehub::{Mode, RunOptions};
use std::fs;
use test_utils::*;

#[test]
fn test_copy_persists_and_next_engine_hits() {
    let ws = Workspace::new();
    ws.add("Pack/kick_a.wav", &kick(0.25));
    ws.add("Pack/tone.wav", &sine(60.0, 0.6));

    let first = ws.engine().run(Mode::Copy, &RunOptions::default()).unwrap();
    assert_eq!(first.feature_cache_stats.misses, 2);
    assert!(first.feature_cache_stats.persisted);
    assert_eq!(first.feature_cache_stats.saved_entries, 2);
    assert!(ws.hub.join("feature_cache.json").is_file());

    let second = ws.engine().run(Mode::Analyze, &RunOptions::default()).unwrap();
    let stats = &second.feature_cache_stats;
    assert_eq!(stats.reused, 2);
    assert_eq!((stats.hits, stats.misses), (2, 0));
}

#[test]
fn test_reused_counts_only_served_vectors() {
    let ws = Workspace::new();
    ws.add("Pack/kick_a.wav", &kick(0.25));
    let tone = ws.add("Pack/tone.wav", &sine(60.0, 0.6));
    ws.engine().run(Mode::Copy, &RunOptions::default()).unwrap();

    fs::remove_file(&tone).unwrap();
    let report = ws.engine().run(Mode::Analyze, &RunOptions::default()).unwrap();
    let stats = &report.feature_cache_stats;
    assert_eq!((stats.hits, stats.reused, stats.misses), (1, 1, 0));
}

#[test]
fn test_changed_file_is_recomputed() {
    let ws = Workspace::new();
    let path = ws.add("Pack/kick_a.wav", &kick(0.25));
    ws.engine().run(Mode::Copy, &RunOptions::default()).unwrap();

    write_wav(&path, &kick(0.3));
    let report = ws.engine().run(Mode::Analyze, &RunOptions::default()).unwrap();
    assert_eq!(report.feature_cache_stats.hits, 0);
    assert_eq!(report.feature_cache_stats.misses, 1);
}

#[test]
fn test_corrupt_cache_is_ignored() {
    let ws = Workspace::new();
    ws.add("Pack/kick_a.wav", &kick(0.25));
    fs::write(ws.hub.join("feature_cache.json"), "{not json").unwrap();

    let report = ws.engine().run(Mode::Analyze, &RunOptions::default()).unwrap();
    assert_eq!(report.files_processed, 1);
    assert_eq!(report.feature_cache_stats.reused, 0);
    assert_eq!(report.feature_cache_stats.misses, 1);
}

#[test]
fn test_analyze_and_dry_run_do_not_persist() {
    let ws = Workspace::new();
    ws.add("Pack/kick_a.wav", &kick(0.25));
    let engine = ws.engine();

    let analyze = engine.run(Mode::Analyze, &RunOptions::default()).unwrap();
    assert!(!analyze.feature_cache_stats.persisted);
    engine.run(Mode::DryRun, &RunOptions::default()).unwrap();
    assert!(!ws.hub.join("feature_cache.json").exists());
}
