// src/engine/undo.rs
//
// Replays MOVE rows of an audit trail back into the inbox. Name
// collisions in the inbox are parked in quarantine, never overwritten.

use super::audit::AuditRecord;
use super::transfer::{move_file, TransferAction};
use crate::styles::BucketNames;
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndoConflict {
    pub file: String,
    pub quarantined_to: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndoSummary {
    pub reverted_count: usize,
    pub conflicts: Vec<UndoConflict>,
    /// Rows whose hub file was already gone
    pub skipped_missing: usize,
    pub audit_file: PathBuf,
}

/// Where undo looks for and puts files
pub struct UndoLayout<'a> {
    pub content_root: &'a Path,
    pub inbox: &'a Path,
    pub quarantine: PathBuf,
    pub names: &'a BucketNames,
}

impl UndoLayout<'_> {
    /// Path of the audited file below its pack folder; the bare file name
    /// when the row does not start with `<inbox>/<pack>`
    pub fn relative_path(&self, record: &AuditRecord) -> Option<PathBuf> {
        let pack_root = self.inbox.join(&record.pack);
        let nested = Path::new(&record.file)
            .strip_prefix(&pack_root)
            .ok()
            .filter(|rel| {
                rel.components().next().is_some() && rel.components().all(|c| matches!(c, Component::Normal(_)))
            })
            .map(Path::to_path_buf);
        nested.or_else(|| record.file_name().map(PathBuf::from))
    }

    /// Current hub location of an audited file
    pub fn current_location(&self, record: &AuditRecord, relative: &Path) -> PathBuf {
        if record.bucket == "UNSORTED" {
            self.content_root.join("UNSORTED").join(&record.pack).join(relative)
        } else {
            self.content_root
                .join(&record.category)
                .join(self.names.display_name(&record.bucket))
                .join(&record.pack)
                .join(relative)
        }
    }
}

pub fn replay(records: &[AuditRecord], layout: &UndoLayout<'_>, audit_file: &Path) -> UndoSummary {
    let mut summary = UndoSummary {
        reverted_count: 0,
        conflicts: Vec::new(),
        skipped_missing: 0,
        audit_file: audit_file.to_path_buf(),
    };

    let moved = records
        .iter()
        .filter(|r| r.action.eq_ignore_ascii_case(TransferAction::Move.as_str()));
    for record in moved {
        let Some(relative) = layout.relative_path(record) else {
            continue;
        };
        let current = layout.current_location(record, &relative);
        if !current.is_file() {
            debug!("Already reconciled: {}", current.display());
            summary.skipped_missing += 1;
            continue;
        }

        let restore_to = layout.inbox.join(&relative);
        if restore_to.exists() {
            let parked = layout.quarantine.join(&relative);
            if parked.exists() {
                warn!(
                    "Quarantine already holds {}; leaving {} in place",
                    relative.display(),
                    current.display()
                );
                continue;
            }
            if let Err(e) = move_file(&current, &parked) {
                warn!("Could not quarantine {}: {}", current.display(), e);
                continue;
            }
            warn!("Inbox already has {}; quarantined to {}", relative.display(), parked.display());
            summary.conflicts.push(UndoConflict {
                file: relative.to_string_lossy().replace('\\', "/"),
                quarantined_to: parked,
            });
            continue;
        }

        match move_file(&current, &restore_to) {
            Ok(()) => summary.reverted_count += 1,
            Err(e) => warn!("Could not restore {}: {}", current.display(), e),
        }
    }

    info!(
        "Undo restored {} file(s), quarantined {}",
        summary.reverted_count,
        summary.conflicts.len()
    );
    summary
}
