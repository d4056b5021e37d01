// src/engine/report.rs
//
// Run report model and the per-run text log.

use super::mode::Mode;
use super::transfer::TransferAction;
use crate::classify::ClassificationResult;
use crate::core::CacheStats;
use crate::styles::RepairActions;
use chrono::{DateTime, Local};
use log::{info, warn};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const REPORT_FILE_NAME: &str = "run_report.json";
pub const RUN_LOG_FILE_NAME: &str = "run_log.txt";

/// One processed file, with the full classification flattened in
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub source: PathBuf,
    pub dest: PathBuf,
    /// Bucket id, or `UNSORTED`
    pub bucket: String,
    pub confidence: f64,
    pub action: TransferAction,
    pub reason: String,
    #[serde(flatten)]
    pub classification: ClassificationResult,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PackReport {
    pub pack: String,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub mode: Mode,
    pub timestamp: DateTime<Local>,
    pub hub: PathBuf,
    pub organized_output_root: PathBuf,
    pub files_processed: usize,
    pub files_moved: usize,
    pub files_copied: usize,
    pub skipped_existing: usize,
    pub failed: usize,
    pub files_skipped_non_wav: usize,
    pub unsorted: usize,
    pub packs: Vec<PackReport>,
    pub feature_cache_stats: CacheStats,
    pub workers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repair_actions: Option<RepairActions>,
    /// `<hub>/logs/<run_id>` when the mode writes logs
    #[serde(skip)]
    pub log_dir: Option<PathBuf>,
}

impl RunReport {
    pub fn new(run_id: String, mode: Mode, hub: &Path, content_root: &Path, workers: usize) -> Self {
        Self {
            run_id,
            mode,
            timestamp: Local::now(),
            hub: absolute(hub),
            organized_output_root: absolute(content_root),
            files_processed: 0,
            files_moved: 0,
            files_copied: 0,
            skipped_existing: 0,
            failed: 0,
            files_skipped_non_wav: 0,
            unsorted: 0,
            packs: Vec::new(),
            feature_cache_stats: CacheStats::default(),
            workers,
            repair_actions: None,
            log_dir: None,
        }
    }

    /// Every file entry across packs, paired with its pack name
    pub fn entries(&self) -> impl Iterator<Item = (&str, &FileEntry)> {
        self.packs
            .iter()
            .flat_map(|p| p.files.iter().map(move |f| (p.pack.as_str(), f)))
    }

    pub fn write_json(&self, path: &Path) -> crate::Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// `YYYYMMDD_HHMMSS_` plus eight hex characters
pub fn new_run_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", Local::now().format("%Y%m%d_%H%M%S_"), &suffix[..8])
}

/// Lifecycle lines go to the logger and, when enabled, to `run_log.txt`
pub struct RunLog {
    file: Option<BufWriter<File>>,
}

impl RunLog {
    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn create(path: &Path) -> crate::Result<Self> {
        Ok(Self {
            file: Some(BufWriter::new(File::create(path)?)),
        })
    }

    pub fn line(&mut self, message: &str) {
        info!("{}", message);
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = writeln!(file, "{}", message).and_then(|_| file.flush()) {
                warn!("Could not write run log: {}", e);
                self.file = None;
            }
        }
    }
}
