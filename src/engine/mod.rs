//! Run orchestration
//!
//! An [`Engine`] binds an inbox to a hub. Each run discovers packs,
//! classifies their WAV files (optionally in parallel) and then applies the
//! mode's filesystem policy one file at a time.

pub mod audit;
pub mod benchmark;
pub mod discovery;
pub mod mode;
pub mod report;
pub mod transfer;
pub mod undo;

pub use audit::{AuditRecord, AuditWriter};
pub use benchmark::{BenchmarkOptions, BenchmarkReport};
pub use mode::Mode;
pub use report::{FileEntry, PackReport, RunReport};
pub use transfer::{TransferAction, TransferKind};
pub use undo::{UndoConflict, UndoSummary};

use crate::classify::{Category, Classifier, ClassificationResult};
use crate::config::{BucketHints, RunConfig, Tuning};
use crate::core::{AudioBackend, FeatureCache, SymphoniaBackend};
use crate::styles::{repair_sidecars, BucketNames, Style, StyleBook, StyleResolver};
use crate::{Error, Result};
use indicatif::ProgressBar;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub const LOGS_DIR_NAME: &str = "logs";

/// Per-run knobs that do not belong to the engine itself
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides the configured worker count
    pub workers: Option<usize>,
    /// Advanced once per classified file
    pub progress: Option<ProgressBar>,
}

pub struct Engine {
    inbox: PathBuf,
    hub: PathBuf,
    content_root: PathBuf,
    config: RunConfig,
    classifier: Classifier,
    styles: Box<dyn StyleResolver>,
    names: BucketNames,
}

impl Engine {
    /// Engine with the default backend and styles; overrides are read
    /// from the config dir and the hub
    pub fn new(inbox: impl Into<PathBuf>, hub: impl Into<PathBuf>, config: RunConfig) -> Result<Self> {
        EngineBuilder::new(inbox, hub).config(config).build()
    }

    pub fn builder(inbox: impl Into<PathBuf>, hub: impl Into<PathBuf>) -> EngineBuilder {
        EngineBuilder::new(inbox, hub)
    }

    pub fn inbox(&self) -> &Path {
        &self.inbox
    }

    pub fn hub(&self) -> &Path {
        &self.hub
    }

    /// Root of organized content: the hub or its configured subfolder
    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    pub fn logs_root(&self) -> PathBuf {
        self.hub.join(LOGS_DIR_NAME)
    }

    pub fn tuning(&self) -> &Tuning {
        self.classifier.tuning()
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Classify one file without touching the filesystem
    pub fn classify(&self, path: &Path) -> ClassificationResult {
        self.classifier.classify(path)
    }

    fn worker_count(&self, options: &RunOptions) -> usize {
        options
            .workers
            .or(self.config.workers)
            .unwrap_or(self.tuning().default_workers)
            .max(1)
    }

    /// Execute one run. Only an unusable hub or log directory is an error;
    /// per-file problems are recorded in the report.
    pub fn run(&self, mode: Mode, options: &RunOptions) -> Result<RunReport> {
        self.classifier.cache().reset_run_stats();
        let workers = self.worker_count(options);
        let mut report = RunReport::new(report::new_run_id(), mode, &self.hub, &self.content_root, workers);

        let mut log = report::RunLog::disabled();
        if mode.writes_logs() {
            let log_dir = self.logs_root().join(&report.run_id);
            fs::create_dir_all(&log_dir)?;
            log = report::RunLog::create(&log_dir.join(report::RUN_LOG_FILE_NAME))?;
            report.log_dir = Some(log_dir);
        }

        if mode.touches_inbox() {
            if let Err(e) = discovery::wrap_loose_files(&self.inbox) {
                warn!("Could not wrap loose inbox files: {}", e);
            }
        }

        if mode == Mode::RepairStyles {
            log.line(&format!("samplehub run_id={} mode={}", report.run_id, mode));
            let actions = repair_sidecars(&self.content_root, self.styles.as_ref(), &self.names)?;
            log.line(&format!(
                "Repaired sidecars: created={} updated={} removed={}",
                actions.created, actions.updated, actions.removed
            ));
            report.repair_actions = Some(actions);
            return self.finish(report);
        }

        let packs = discovery::discover_packs(&self.inbox);
        log.line(&format!("samplehub run_id={} mode={}", report.run_id, mode));
        log.line(&format!("Destination root: {}", self.hub.display()));
        if self.content_root != self.hub {
            log.line(&format!("Organized output root: {}", self.content_root.display()));
        }
        log.line(&format!("Packs discovered: {}", packs.len()));

        let mut audit = match (&report.log_dir, mode) {
            (Some(dir), Mode::Move) => Some(AuditWriter::create(&dir.join(audit::AUDIT_FILE_NAME))?),
            _ => None,
        };

        for pack_dir in &packs {
            let pack_name = pack_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            log.line(&format!("Processing pack: {}", pack_name));

            let contents = discovery::collect_pack_wavs(pack_dir);
            report.files_skipped_non_wav += contents.skipped_non_wav;
            let paths: Vec<PathBuf> = contents.wavs.iter().map(|f| f.path.clone()).collect();
            if let Some(pb) = &options.progress {
                pb.inc_length(paths.len() as u64);
            }
            let results = self
                .classifier
                .classify_batch(&paths, workers, options.progress.as_ref())?;

            let mut pack_report = PackReport {
                pack: pack_name.clone(),
                files: Vec::with_capacity(results.len()),
            };
            for (file, classification) in contents.wavs.iter().zip(results) {
                let entry = self.process_file(mode, &pack_name, &file.path, &file.relative, classification, &mut report);
                if let Some(writer) = audit.as_mut() {
                    let record = AuditRecord {
                        file: entry.source.display().to_string(),
                        pack: pack_name.clone(),
                        category: entry.classification.category.name().to_string(),
                        bucket: entry.bucket.clone(),
                        confidence: format!("{:.2}", entry.confidence),
                        action: entry.action.as_str().to_string(),
                        reason: entry.reason.clone(),
                    };
                    if let Err(e) = writer.append(&record) {
                        warn!("Could not write audit row for {}: {}", entry.source.display(), e);
                    }
                }
                pack_report.files.push(entry);
            }

            log.line(&format!("Finished pack: {} files={}", pack_name, pack_report.files.len()));
            report.packs.push(pack_report);
        }

        if let Some(writer) = audit.take() {
            writer.finish()?;
        }

        if mode.transfers() {
            log.line(&format!(
                "Done. processed={} copied={} moved={} failed={} unsorted={} skipped={}",
                report.files_processed,
                report.files_copied,
                report.files_moved,
                report.failed,
                report.unsorted,
                report.skipped_existing
            ));
        } else {
            log.line(&format!(
                "Done. processed={} failed={} unsorted={} skipped_non_wav={}",
                report.files_processed, report.failed, report.unsorted, report.files_skipped_non_wav
            ));
        }

        self.finish(report)
    }

    /// Destination, sidecars and transfer for one classified file
    fn process_file(
        &self,
        mode: Mode,
        pack: &str,
        source: &Path,
        relative: &Path,
        classification: ClassificationResult,
        report: &mut RunReport,
    ) -> FileEntry {
        let pack_dir = match classification.chosen_bucket {
            Some(bucket) => {
                let category = bucket.category();
                let display = self.names.display_name(bucket.id());
                let category_dir = self.content_root.join(category.name());
                let bucket_dir = category_dir.join(display);
                if mode.writes_hub() {
                    let category_style = self.styles.resolve_style(category.name(), category.name());
                    let bucket_style = self.styles.resolve_style(bucket.id(), category.name());
                    let pack_style = self.styles.pack_style(&bucket_style);
                    self.write_sidecar(&self.content_root, category.name(), &category_style);
                    self.write_sidecar(&category_dir, display, &bucket_style);
                    self.write_sidecar(&bucket_dir, pack, &pack_style);
                }
                bucket_dir.join(pack)
            }
            None => {
                report.unsorted += 1;
                let unsorted_dir = self.content_root.join(Category::Unsorted.name());
                if mode.writes_hub() {
                    self.write_sidecar(&self.content_root, Category::Unsorted.name(), &Style::default());
                    self.write_sidecar(&unsorted_dir, pack, &Style::default());
                }
                unsorted_dir.join(pack)
            }
        };
        let dest = pack_dir.join(relative);
        let mut reason = classification.reason();

        let kind = match mode {
            Mode::Copy => Some(TransferKind::Copy),
            Mode::Move => Some(TransferKind::Move),
            _ => None,
        };
        let action = match kind {
            Some(kind) => {
                let outcome = transfer::transfer(source, &dest, kind);
                match outcome.action {
                    TransferAction::Copy => report.files_copied += 1,
                    TransferAction::Move => report.files_moved += 1,
                    TransferAction::Skipped => report.skipped_existing += 1,
                    TransferAction::Failed => report.failed += 1,
                    TransferAction::None => {}
                }
                if let Some(note) = outcome.note {
                    reason.push_str(&note);
                }
                outcome.action
            }
            None => TransferAction::None,
        };
        report.files_processed += 1;

        FileEntry {
            source: source.to_path_buf(),
            dest,
            bucket: classification.bucket_label().to_string(),
            confidence: classification.confidence_ratio,
            action,
            reason,
            classification,
        }
    }

    fn write_sidecar(&self, dir: &Path, name: &str, style: &Style) {
        if let Err(e) = self.styles.write_sidecar(dir, name, style) {
            warn!("Could not write sidecar {}/{}.nfo: {}", dir.display(), name, e);
        }
    }

    /// Persist the report and cache as the mode allows
    fn finish(&self, mut report: RunReport) -> Result<RunReport> {
        let cache = self.classifier.cache();
        if report.mode.writes_hub() {
            if let Err(e) = cache.save() {
                warn!("Could not persist feature cache: {}", e);
            }
        }
        report.feature_cache_stats = cache.stats();
        if let Some(dir) = &report.log_dir {
            report.write_json(&dir.join(report::REPORT_FILE_NAME))?;
        }
        Ok(report)
    }

    /// Move the files of the most recent move run back into the inbox
    pub fn undo_last_run(&self) -> Result<UndoSummary> {
        let logs_root = self.logs_root();
        let audit_file = audit::latest_audit_file(&logs_root).ok_or(Error::NoAuditTrail(logs_root))?;
        info!("Undoing run recorded in {}", audit_file.display());

        let records = audit::read_records(&audit_file)?;
        let layout = undo::UndoLayout {
            content_root: &self.content_root,
            inbox: &self.inbox,
            quarantine: self.hub.join("Quarantine").join("UndoConflicts"),
            names: &self.names,
        };
        Ok(undo::replay(&records, &layout, &audit_file))
    }

    /// Analyze run summarized as a benchmark, optionally written as JSON
    pub fn run_benchmark(
        &self,
        options: &BenchmarkOptions,
        run_options: &RunOptions,
        output: Option<&Path>,
    ) -> Result<BenchmarkReport> {
        let started = Instant::now();
        let report = self.run(Mode::Analyze, run_options)?;
        let mut bench = benchmark::build_benchmark(
            &report,
            self.inbox.clone(),
            self.tuning(),
            options,
            started.elapsed(),
        );

        if options.save_feature_cache {
            let cache = self.classifier.cache();
            cache.save()?;
            bench.feature_cache_stats = cache.stats();
        }

        if let Some(path) = output {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(&bench)?)?;
            info!("Benchmark written to {}", path.display());
        }
        Ok(bench)
    }
}

/// Assembles an [`Engine`]; unset parts are loaded from disk or defaulted
pub struct EngineBuilder {
    inbox: PathBuf,
    hub: PathBuf,
    config: RunConfig,
    tuning: Option<Tuning>,
    backend: Option<Box<dyn AudioBackend>>,
    styles: Option<Box<dyn StyleResolver>>,
    names: Option<BucketNames>,
}

impl EngineBuilder {
    pub fn new(inbox: impl Into<PathBuf>, hub: impl Into<PathBuf>) -> Self {
        Self {
            inbox: inbox.into(),
            hub: hub.into(),
            config: RunConfig::default(),
            tuning: None,
            backend: None,
            styles: None,
            names: None,
        }
    }

    pub fn config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this tuning instead of searching for override files
    pub fn tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = Some(tuning);
        self
    }

    pub fn backend(mut self, backend: Box<dyn AudioBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn styles(mut self, styles: Box<dyn StyleResolver>) -> Self {
        self.styles = Some(styles);
        self
    }

    pub fn bucket_names(mut self, names: BucketNames) -> Self {
        self.names = Some(names);
        self
    }

    /// Validate paths and load tuning, hints and the feature cache
    pub fn build(self) -> Result<Engine> {
        if self.inbox.exists() && !self.inbox.is_dir() {
            return Err(Error::InvalidInbox(self.inbox));
        }
        if self.hub.exists() && !self.hub.is_dir() {
            return Err(Error::InvalidHub(self.hub));
        }

        let tuning = match self.tuning {
            Some(tuning) => tuning,
            None => Tuning::load(&self.config.tuning_candidates(&self.hub)),
        };
        let hints = BucketHints::load(self.config.bucket_hints.as_ref(), &self.config.hint_candidates(&self.hub));
        let cache = FeatureCache::load(&self.hub);
        let backend = self.backend.unwrap_or_else(|| Box::new(SymphoniaBackend));
        let classifier = Classifier::with_backend(tuning, hints, cache, backend);

        let content_root = match self.config.output_folder() {
            Some(name) => self.hub.join(name),
            None => self.hub.clone(),
        };

        Ok(Engine {
            inbox: self.inbox,
            hub: self.hub,
            content_root,
            config: self.config,
            classifier,
            styles: self.styles.unwrap_or_else(|| Box::new(StyleBook::default())),
            names: self.names.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NullBackend;

    #[test]
    fn test_invalid_paths_fail_fast() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let file = root.join("not_a_dir");
        fs::write(&file, b"x").unwrap();

        assert!(matches!(
            Engine::new(&file, root.join("hub"), RunConfig::default()),
            Err(Error::InvalidInbox(_))
        ));
        assert!(matches!(
            Engine::new(root.join("inbox"), &file, RunConfig::default()),
            Err(Error::InvalidHub(_))
        ));
    }

    #[test]
    fn test_output_folder_and_workers() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let config = RunConfig::builder().output_folder_name("Sorted").workers(3).build();
        let engine = Engine::builder(root.join("inbox"), root.join("hub"))
            .config(config)
            .backend(Box::new(NullBackend))
            .build()
            .unwrap();

        assert_eq!(engine.content_root(), root.join("hub/Sorted"));
        assert_eq!(engine.logs_root(), root.join("hub/logs"));
        assert_eq!(engine.worker_count(&RunOptions::default()), 3);
        let options = RunOptions {
            workers: Some(0),
            ..RunOptions::default()
        };
        assert_eq!(engine.worker_count(&options), 1);
    }

    #[test]
    fn test_undo_without_audit_trail() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let engine = Engine::builder(root.join("inbox"), root.join("hub"))
            .backend(Box::new(NullBackend))
            .build()
            .unwrap();
        assert!(matches!(engine.undo_last_run(), Err(Error::NoAuditTrail(_))));
    }
}
