// src/config/run.rs
//
// Per-engine run configuration and override file discovery.

use serde_json::Value;
use std::path::{Path, PathBuf};

/// Settings supplied by the caller when constructing an engine
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Optional subfolder of the hub that receives organized content
    pub output_folder_name: Option<String>,
    /// Application config directory searched first for overrides
    pub config_dir: Option<PathBuf>,
    pub tuning_path: Option<PathBuf>,
    pub bucket_hints_path: Option<PathBuf>,
    /// Inline hints win over every hint file
    pub bucket_hints: Option<Value>,
    /// Worker count; falls back to the tuning default
    pub workers: Option<usize>,
}

impl RunConfig {
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }

    /// Validated output folder name, or `None` when unset or unsafe
    pub fn output_folder(&self) -> Option<&str> {
        let name = self.output_folder_name.as_deref()?.trim();
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
            || name.eq_ignore_ascii_case("logs")
        {
            return None;
        }
        Some(name)
    }

    pub fn tuning_candidates(&self, hub: &Path) -> Vec<PathBuf> {
        self.candidates(hub, "tuning.json", self.tuning_path.as_ref())
    }

    pub fn hint_candidates(&self, hub: &Path) -> Vec<PathBuf> {
        self.candidates(hub, "bucket_hints.json", self.bucket_hints_path.as_ref())
    }

    fn candidates(&self, hub: &Path, file_name: &str, explicit: Option<&PathBuf>) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = &self.config_dir {
            paths.push(dir.join(file_name));
        }
        if let Some(path) = explicit {
            paths.push(path.clone());
        }
        paths.push(hub.join("config").join(file_name));
        paths.push(hub.join(file_name));
        paths
    }
}

#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn output_folder_name(mut self, name: impl Into<String>) -> Self {
        self.config.output_folder_name = Some(name.into());
        self
    }

    pub fn config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.config_dir = Some(dir.into());
        self
    }

    pub fn tuning_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tuning_path = Some(path.into());
        self
    }

    pub fn bucket_hints_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.bucket_hints_path = Some(path.into());
        self
    }

    pub fn bucket_hints(mut self, hints: Value) -> Self {
        self.config.bucket_hints = Some(hints);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = Some(workers.max(1));
        self
    }

    pub fn build(self) -> RunConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_folder_validation() {
        let named = |n: &str| RunConfig::builder().output_folder_name(n).build();
        assert_eq!(named("Organized").output_folder(), Some("Organized"));
        assert_eq!(named("  Organized ").output_folder(), Some("Organized"));
        assert_eq!(named("").output_folder(), None);
        assert_eq!(named("..").output_folder(), None);
        assert_eq!(named("a/b").output_folder(), None);
        assert_eq!(named("logs").output_folder(), None);
        assert_eq!(RunConfig::default().output_folder(), None);
    }

    #[test]
    fn test_candidate_order() {
        let config = RunConfig::builder()
            .config_dir("/cfg")
            .tuning_path("/explicit/t.json")
            .build();
        let hub = Path::new("/hub");
        assert_eq!(
            config.tuning_candidates(hub),
            vec![
                PathBuf::from("/cfg/tuning.json"),
                PathBuf::from("/explicit/t.json"),
                PathBuf::from("/hub/config/tuning.json"),
                PathBuf::from("/hub/tuning.json"),
            ]
        );
        assert_eq!(config.hint_candidates(hub).len(), 3);
    }
}
