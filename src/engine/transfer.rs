// src/engine/transfer.rs
//
// Single-file copy/move with idempotent skip. Never overwrites and never
// invents a new name for an existing destination.

use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Per-file action recorded in reports and audit rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferAction {
    None,
    Copy,
    Move,
    Skipped,
    Failed,
}

impl TransferAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferAction::None => "NONE",
            TransferAction::Copy => "COPY",
            TransferAction::Move => "MOVE",
            TransferAction::Skipped => "SKIPPED",
            TransferAction::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransferAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Copy,
    Move,
}

/// Result of one transfer: the action and an optional reason suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub action: TransferAction,
    pub note: Option<String>,
}

pub fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;
    Ok(())
}

/// Rename, falling back to copy + remove across filesystems
pub fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(src, dst)?;
            fs::remove_file(src)
        }
    }
}

/// Transfer `src` to `dst`; an existing destination is skipped
pub fn transfer(src: &Path, dst: &Path, kind: TransferKind) -> TransferOutcome {
    if dst.exists() {
        return TransferOutcome {
            action: TransferAction::Skipped,
            note: Some("; destination exists".to_string()),
        };
    }

    let (result, action) = match kind {
        TransferKind::Copy => (copy_file(src, dst), TransferAction::Copy),
        TransferKind::Move => (move_file(src, dst), TransferAction::Move),
    };
    match result {
        Ok(()) => TransferOutcome { action, note: None },
        Err(e) => TransferOutcome {
            action: TransferAction::Failed,
            note: Some(format!("; move/copy failed: {}", e)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_then_skip() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();
        let src = dir.join("a.wav");
        fs::write(&src, b"data").unwrap();
        let dst = dir.join("out/deep/a.wav");

        let first = transfer(&src, &dst, TransferKind::Copy);
        assert_eq!(first.action, TransferAction::Copy);
        assert!(src.is_file() && dst.is_file());

        let second = transfer(&src, &dst, TransferKind::Copy);
        assert_eq!(second.action, TransferAction::Skipped);
        assert_eq!(second.note.as_deref(), Some("; destination exists"));
    }

    #[test]
    fn test_move_and_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();
        let src = dir.join("b.wav");
        fs::write(&src, b"data").unwrap();
        let dst = dir.join("moved/b.wav");

        assert_eq!(transfer(&src, &dst, TransferKind::Move).action, TransferAction::Move);
        assert!(!src.exists() && dst.is_file());

        let missing = transfer(&src, &dir.join("other/b.wav"), TransferKind::Move);
        assert_eq!(missing.action, TransferAction::Failed);
        assert!(missing.note.unwrap().starts_with("; move/copy failed: "));
    }
}
