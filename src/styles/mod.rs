// src/styles/mod.rs
//
// Folder styling: style resolution with fallbacks, `.nfo` sidecar
// rendering, display-name mapping and the sidecar repair pass.

use crate::classify::is_ignored;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use walkdir::WalkDir;

pub const SIDECAR_EXTENSION: &str = "nfo";

/// Top-level hub folders that are never styled
pub const RESERVED_FOLDERS: [&str; 3] = ["logs", "Quarantine", "config"];

/// Display style of one folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    #[serde(rename = "Color")]
    pub color: String,
    #[serde(rename = "IconIndex")]
    pub icon_index: u32,
    #[serde(rename = "SortGroup")]
    pub sort_group: u32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: "$7f7f7f".to_string(),
            icon_index: 0,
            sort_group: 0,
        }
    }
}

/// Resolves folder styles and writes sidecars
pub trait StyleResolver: Send + Sync {
    /// Exact bucket, case-insensitive bucket, category, then default
    fn resolve_style(&self, bucket: &str, category: &str) -> Style;

    fn pack_style(&self, bucket_style: &Style) -> Style {
        bucket_style.clone()
    }

    fn render(&self, style: &Style) -> String {
        format!(
            "Color={}\nIconIndex={}\nHeightOfs=7\nSortGroup={}\nTip=*Styled by samplehub",
            style.color, style.icon_index, style.sort_group
        )
    }

    /// Write `<dir>/<name>.nfo` unless its trimmed content already matches.
    /// Returns whether the file was written.
    fn write_sidecar(&self, dir: &Path, name: &str, style: &Style) -> io::Result<bool> {
        let path = sidecar_path(dir, name);
        let content = self.render(style);
        if let Ok(existing) = fs::read_to_string(&path) {
            if existing.trim() == content.trim() {
                return Ok(false);
            }
        }
        fs::create_dir_all(dir)?;
        fs::write(&path, content)?;
        debug!("Wrote sidecar {}", path.display());
        Ok(true)
    }
}

pub fn sidecar_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, SIDECAR_EXTENSION))
}

/// JSON-backed style table: `{"categories": {...}, "buckets": {...}}`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StyleBook {
    #[serde(default)]
    pub categories: BTreeMap<String, Style>,
    #[serde(default)]
    pub buckets: BTreeMap<String, Style>,
    #[serde(skip)]
    reported_missing: Mutex<HashSet<String>>,
}

impl StyleBook {
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Load from `path`; a missing or invalid file gives an empty book
    pub fn load(path: &Path) -> Self {
        let parsed = fs::read_to_string(path)
            .map_err(crate::Error::from)
            .and_then(|text| Self::from_json_str(&text).map_err(crate::Error::from));
        match parsed {
            Ok(book) => book,
            Err(e) => {
                if path.exists() {
                    warn!("Ignoring styles in {}: {}", path.display(), e);
                }
                Self::default()
            }
        }
    }

    fn lookup<'a>(table: &'a BTreeMap<String, Style>, key: &str) -> Option<&'a Style> {
        table.get(key).or_else(|| {
            table
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(key))
                .map(|(_, style)| style)
        })
    }
}

impl StyleResolver for StyleBook {
    fn resolve_style(&self, bucket: &str, category: &str) -> Style {
        if let Some(style) = Self::lookup(&self.buckets, bucket).or_else(|| Self::lookup(&self.categories, category)) {
            return style.clone();
        }

        let key = format!("{}:{}", bucket, category);
        let mut reported = self.reported_missing.lock().unwrap_or_else(|p| p.into_inner());
        if reported.insert(key) {
            warn!(
                "No style defined for bucket '{}' or category '{}', using default",
                bucket, category
            );
        }
        Style::default()
    }
}

/// Bucket id to folder-name mapping, e.g. `{"808s": "808"}`
#[derive(Debug, Clone, Default)]
pub struct BucketNames {
    display: HashMap<String, String>,
    inverse: HashMap<String, String>,
}

impl BucketNames {
    pub fn new(mapping: HashMap<String, String>) -> Self {
        let inverse = mapping
            .iter()
            .map(|(id, display)| (display.to_lowercase(), id.clone()))
            .collect();
        Self {
            display: mapping,
            inverse,
        }
    }

    pub fn load(path: &Path) -> Self {
        let parsed = fs::read_to_string(path)
            .map_err(crate::Error::from)
            .and_then(|text| serde_json::from_str::<HashMap<String, String>>(&text).map_err(crate::Error::from));
        match parsed {
            Ok(mapping) => Self::new(mapping),
            Err(e) => {
                if path.exists() {
                    warn!("Ignoring bucket names in {}: {}", path.display(), e);
                }
                Self::default()
            }
        }
    }

    /// Folder name for a bucket id; the id itself when unmapped
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.display.get(id).map_or(id, String::as_str)
    }

    /// Case-insensitive reverse lookup
    pub fn bucket_id(&self, display: &str) -> Option<&str> {
        self.inverse.get(&display.to_lowercase()).map(String::as_str)
    }
}

/// Counts produced by [`repair_sidecars`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairActions {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

fn child_dirs(dir: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(dir)
        .into_iter()
        .flatten()
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter(|p| !is_ignored(&file_name(p)))
        .collect();
    dirs.sort();
    dirs
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Recreate category/bucket/pack sidecars under `content_root` and delete
/// `.nfo` files whose sibling folder no longer exists.
pub fn repair_sidecars(
    content_root: &Path,
    resolver: &dyn StyleResolver,
    names: &BucketNames,
) -> io::Result<RepairActions> {
    let mut actions = RepairActions::default();
    if !content_root.is_dir() {
        return Ok(actions);
    }

    let mut desired: BTreeSet<PathBuf> = BTreeSet::new();
    for category_dir in child_dirs(content_root) {
        let category = file_name(&category_dir);
        if RESERVED_FOLDERS.contains(&category.as_str()) {
            continue;
        }

        let unsorted = category.eq_ignore_ascii_case("UNSORTED");
        let category_style = if unsorted {
            Style::default()
        } else {
            resolver.resolve_style(&category, &category)
        };
        tally(resolver.write_sidecar_tracked(content_root, &category, &category_style)?, &mut actions);
        desired.insert(sidecar_path(content_root, &category));

        for bucket_dir in child_dirs(&category_dir) {
            let display = file_name(&bucket_dir);
            let bucket_id = names.bucket_id(&display).unwrap_or(display.as_str()).to_string();
            let bucket_style = if unsorted {
                Style::default()
            } else {
                resolver.resolve_style(&bucket_id, &category)
            };
            tally(resolver.write_sidecar_tracked(&category_dir, &display, &bucket_style)?, &mut actions);
            desired.insert(sidecar_path(&category_dir, &display));
            // UNSORTED holds packs directly
            if unsorted {
                continue;
            }

            let pack_style = resolver.pack_style(&bucket_style);
            for pack_dir in child_dirs(&bucket_dir) {
                let pack = file_name(&pack_dir);
                tally(resolver.write_sidecar_tracked(&bucket_dir, &pack, &pack_style)?, &mut actions);
                desired.insert(sidecar_path(&bucket_dir, &pack));
            }
        }
    }

    let orphans: Vec<PathBuf> = WalkDir::new(content_root)
        .into_iter()
        .filter_entry(|e| {
            e.depth() != 1 || !RESERVED_FOLDERS.contains(&e.file_name().to_string_lossy().as_ref())
        })
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|e| e == SIDECAR_EXTENSION) && p.is_file())
        .filter(|p| !desired.contains(p))
        .filter(|p| match (p.parent(), p.file_stem()) {
            (Some(parent), Some(stem)) => !parent.join(stem).is_dir(),
            _ => false,
        })
        .collect();

    for orphan in orphans {
        match fs::remove_file(&orphan) {
            Ok(()) => {
                debug!("Removed orphan sidecar {}", orphan.display());
                actions.removed += 1;
            }
            Err(e) => warn!("Could not remove {}: {}", orphan.display(), e),
        }
    }

    Ok(actions)
}

/// Outcome of a tracked sidecar write
enum SidecarWrite {
    Created,
    Updated,
    Unchanged,
}

trait TrackedWrite {
    fn write_sidecar_tracked(&self, dir: &Path, name: &str, style: &Style) -> io::Result<SidecarWrite>;
}

impl<T: StyleResolver + ?Sized> TrackedWrite for T {
    fn write_sidecar_tracked(&self, dir: &Path, name: &str, style: &Style) -> io::Result<SidecarWrite> {
        let existed = sidecar_path(dir, name).exists();
        Ok(match (self.write_sidecar(dir, name, style)?, existed) {
            (false, _) => SidecarWrite::Unchanged,
            (true, true) => SidecarWrite::Updated,
            (true, false) => SidecarWrite::Created,
        })
    }
}

fn tally(write: SidecarWrite, actions: &mut RepairActions) {
    match write {
        SidecarWrite::Created => actions.created += 1,
        SidecarWrite::Updated => actions.updated += 1,
        SidecarWrite::Unchanged => {}
    }
}
