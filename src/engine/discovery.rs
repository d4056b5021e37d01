// src/engine/discovery.rs
//
// Inbox layout: loose-file wrapping, pack discovery and WAV collection.

use super::transfer::move_file;
use crate::classify::is_ignored;
use chrono::Local;
use log::{info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// WAV file inside a pack, with its path relative to the pack root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackFile {
    pub path: PathBuf,
    pub relative: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct PackContents {
    pub wavs: Vec<PackFile>,
    pub skipped_non_wav: usize,
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Move loose files in the inbox root into `Loose_<timestamp>`.
/// Returns the new pack folder, if one was needed.
pub fn wrap_loose_files(inbox: &Path) -> io::Result<Option<PathBuf>> {
    if !inbox.is_dir() {
        return Ok(None);
    }

    let mut loose: Vec<PathBuf> = fs::read_dir(inbox)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && !is_ignored(&entry_name(p)))
        .collect();
    if loose.is_empty() {
        return Ok(None);
    }
    loose.sort();

    let folder = inbox.join(format!("Loose_{}", Local::now().format("%Y%m%d_%H%M%S")));
    fs::create_dir_all(&folder)?;
    for file in &loose {
        let target = folder.join(entry_name(file));
        if let Err(e) = move_file(file, &target) {
            warn!("Could not wrap loose file {}: {}", file.display(), e);
        }
    }
    info!("Wrapped {} loose file(s) into {}", loose.len(), folder.display());
    Ok(Some(folder))
}

/// Immediate child directories of the inbox, sorted
pub fn discover_packs(inbox: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(inbox) else {
        return Vec::new();
    };
    let mut packs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir() && !is_ignored(&entry_name(p)))
        .collect();
    packs.sort();
    packs
}

/// Recursively collect `.wav` files under `pack`, sorted by name at each
/// level, counting every other file as skipped
pub fn collect_pack_wavs(pack: &Path) -> PackContents {
    let mut contents = PackContents::default();
    let walker = WalkDir::new(pack)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored(&e.file_name().to_string_lossy()));

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
        if !is_wav {
            contents.skipped_non_wav += 1;
            continue;
        }
        let relative = path.strip_prefix(pack).map(Path::to_path_buf).unwrap_or_else(|_| PathBuf::from(entry_name(&path)));
        contents.wavs.push(PackFile { path, relative });
    }
    contents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_skips_ignored_and_counts_non_wav() {
        let tmp = tempfile::tempdir().unwrap();
        let pack = tmp.path().to_path_buf();
        fs::create_dir_all(pack.join("sub")).unwrap();
        fs::create_dir_all(pack.join("__MACOSX")).unwrap();
        fs::write(pack.join("b.wav"), b"x").unwrap();
        fs::write(pack.join("a.WAV"), b"x").unwrap();
        fs::write(pack.join("sub/c.wav"), b"x").unwrap();
        fs::write(pack.join("readme.txt"), b"x").unwrap();
        fs::write(pack.join("._b.wav"), b"x").unwrap();
        fs::write(pack.join("__MACOSX/d.wav"), b"x").unwrap();

        let contents = collect_pack_wavs(&pack);
        let rel: Vec<String> = contents
            .wavs
            .iter()
            .map(|f| f.relative.to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(rel, vec!["a.WAV", "b.wav", "sub/c.wav"]);
        assert_eq!(contents.skipped_non_wav, 1);
    }

    #[test]
    fn test_wrap_and_discover() {
        let tmp = tempfile::tempdir().unwrap();
        let inbox = tmp.path().to_path_buf();
        fs::create_dir_all(inbox.join("ZPack")).unwrap();
        fs::create_dir_all(inbox.join("APack")).unwrap();
        fs::write(inbox.join("loose.wav"), b"x").unwrap();
        fs::write(inbox.join(".DS_Store"), b"x").unwrap();

        let wrapped = wrap_loose_files(&inbox).unwrap().unwrap();
        assert!(wrapped.join("loose.wav").is_file());
        assert!(inbox.join(".DS_Store").is_file());

        let names: Vec<String> = discover_packs(&inbox).iter().map(|p| entry_name(p)).collect();
        assert_eq!(names[0], "APack");
        assert!(names[1].starts_with("Loose_"));
        assert_eq!(names[2], "ZPack");
        assert!(wrap_loose_files(&inbox).unwrap().is_none());
    }
}
