// tests/test_utils/mod.rs
//
// Shared fixtures: synthetic WAV writers and a temporary inbox/hub pair.
#![allow(dead_code)]

use samplehub::{Engine, NullBackend, RunConfig, Tuning, TuningBuilder};
use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub const SR: u32 = 22050;

pub fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_samplehub"))
}

pub fn run_samplehub(inbox: &Path, hub: &Path) -> Command {
    let mut cmd = Command::new(binary_path());
    cmd.arg("--inbox").arg(inbox).arg("--hub").arg(hub).arg("--quiet");
    cmd
}

/// 16-bit mono PCM
pub fn write_wav(path: &Path, samples: &[f64]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SR,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for s in samples {
        let v = (s.clamp(-1.0, 1.0) * i16::MAX as f64) as i16;
        writer.write_sample(v).unwrap();
    }
    writer.finalize().unwrap();
}

fn sample_count(secs: f64) -> usize {
    (secs * SR as f64) as usize
}

pub fn sine(freq: f64, secs: f64) -> Vec<f64> {
    (0..sample_count(secs))
        .map(|i| 0.8 * (2.0 * PI * freq * i as f64 / SR as f64).sin())
        .collect()
}

/// Short decaying low sine with a loud attack
pub fn kick(secs: f64) -> Vec<f64> {
    (0..sample_count(secs))
        .map(|i| {
            let t = i as f64 / SR as f64;
            let attack = if t < 0.01 { 4.0 } else { 1.0 };
            0.2 * attack * (2.0 * PI * 60.0 * t).sin() * (-8.0 * t).exp()
        })
        .collect()
}

/// Exponential pitch descent from `f_start` to `f_end`
pub fn glide(f_start: f64, f_end: f64, secs: f64) -> Vec<f64> {
    let n = sample_count(secs);
    let mut phase = 0.0;
    (0..n)
        .map(|i| {
            let t = i as f64 / SR as f64;
            let freq = f_start * (f_end / f_start).powf(t / secs);
            phase += 2.0 * PI * freq / SR as f64;
            0.8 * phase.sin()
        })
        .collect()
}

pub fn silence(secs: f64) -> Vec<f64> {
    vec![0.0; sample_count(secs)]
}

/// Only the immediate parent folder is scanned, so random temp names
/// cannot contribute hints
pub fn tuning() -> Tuning {
    TuningBuilder::new().parent_folder_levels(1).build()
}

/// Temporary inbox and hub
pub struct Workspace {
    _dir: TempDir,
    pub root: PathBuf,
    pub inbox: PathBuf,
    pub hub: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let inbox = root.join("inbox");
        let hub = root.join("hub");
        fs::create_dir_all(&inbox).unwrap();
        fs::create_dir_all(&hub).unwrap();
        Self {
            _dir: dir,
            root,
            inbox,
            hub,
        }
    }

    pub fn add(&self, relative: &str, samples: &[f64]) -> PathBuf {
        let path = self.inbox.join(relative);
        write_wav(&path, samples);
        path
    }

    pub fn add_raw(&self, relative: &str, bytes: &[u8]) -> PathBuf {
        let path = self.inbox.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, bytes).unwrap();
        path
    }

    /// Engine with the real decoder
    pub fn engine(&self) -> Engine {
        self.engine_with(RunConfig::default())
    }

    pub fn engine_with(&self, config: RunConfig) -> Engine {
        Engine::builder(&self.inbox, &self.hub)
            .config(config)
            .tuning(tuning())
            .build()
            .unwrap()
    }

    /// Engine whose features are always zeroed; hints alone decide
    pub fn null_engine(&self) -> Engine {
        Engine::builder(&self.inbox, &self.hub)
            .tuning(tuning())
            .backend(Box::new(NullBackend))
            .build()
            .unwrap()
    }
}

/// Every file below `root`, relative and sorted
pub fn tree(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect();
    files.sort();
    files
}
