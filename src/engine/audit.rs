// src/engine/audit.rs
//
// Move-mode audit trail: one CSV row per processed file, in transfer order.

use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const AUDIT_FILE_NAME: &str = "audit.csv";

pub const AUDIT_HEADER: [&str; 7] = ["file", "pack", "category", "bucket", "confidence", "action", "reason"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Original inbox path
    pub file: String,
    pub pack: String,
    pub category: String,
    /// Bucket id, or `UNSORTED`
    pub bucket: String,
    /// Two-decimal confidence ratio
    pub confidence: String,
    pub action: String,
    pub reason: String,
}

impl AuditRecord {
    pub fn file_name(&self) -> Option<String> {
        Path::new(&self.file)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }
}

pub struct AuditWriter {
    writer: csv::Writer<File>,
}

impl AuditWriter {
    /// Create the file and write the header row
    pub fn create(path: &Path) -> crate::Result<Self> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
        writer.write_record(AUDIT_HEADER)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    /// Rows are flushed immediately so an interrupted run keeps its trail
    pub fn append(&mut self, record: &AuditRecord) -> crate::Result<()> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn finish(mut self) -> crate::Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Read all well-formed rows; malformed rows are skipped with a warning
pub fn read_records(path: &Path) -> crate::Result<Vec<AuditRecord>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize::<AuditRecord>() {
        match row {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping malformed audit row in {}: {}", path.display(), e),
        }
    }
    Ok(records)
}

/// Most recently modified `audit.csv` anywhere under `logs_root`
pub fn latest_audit_file(logs_root: &Path) -> Option<PathBuf> {
    WalkDir::new(logs_root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == AUDIT_FILE_NAME)
        .filter_map(|e| {
            let modified = e.metadata().ok()?.modified().ok()?;
            Some((modified, e.into_path()))
        })
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, path)| path)
}
