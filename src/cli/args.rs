//! Command-line arguments

use crate::config::RunConfig;
use crate::engine::Mode;
use clap::Parser;
use std::path::PathBuf;

pub const STYLES_FILE_NAME: &str = "styles.json";
pub const BUCKET_NAMES_FILE_NAME: &str = "buckets.json";

#[derive(Parser, Debug)]
#[command(name = "samplehub")]
#[command(about = "Classify audio sample packs and organize them into a hub")]
pub struct Args {
    /// Inbox folder holding sample packs
    #[arg(short, long, env = "SAMPLEHUB_INBOX")]
    pub inbox: PathBuf,

    /// Hub folder that receives organized content
    #[arg(short = 'H', long, env = "SAMPLEHUB_HUB")]
    pub hub: PathBuf,

    /// analyze, dry-run, copy, move or repair-styles
    #[arg(short, long, default_value_t = Mode::Analyze)]
    pub mode: Mode,

    /// Worker threads for feature extraction
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Revert the most recent move run and exit
    #[arg(long, conflicts_with = "benchmark")]
    pub undo: bool,

    /// Run an analyze benchmark and write the JSON summary here
    #[arg(long, value_name = "FILE")]
    pub benchmark: Option<PathBuf>,

    /// Confusion pairs listed in the benchmark
    #[arg(long, default_value = "20")]
    pub top_confusions: usize,

    /// Limit the benchmark to the first N classified files
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Organize into this subfolder of the hub
    #[arg(short, long)]
    pub output_folder: Option<String>,

    /// Directory searched first for tuning, hints, styles and names
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Tuning override file
    #[arg(long, value_name = "FILE")]
    pub tuning: Option<PathBuf>,

    /// Bucket hints override file
    #[arg(long, value_name = "FILE")]
    pub hints: Option<PathBuf>,

    /// Folder style table
    #[arg(long, value_name = "FILE")]
    pub styles: Option<PathBuf>,

    /// Bucket id to folder name mapping
    #[arg(long, value_name = "FILE")]
    pub bucket_names: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,

    /// Print per-file classifications
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Explicit config dir, else `<user config>/samplehub`
    pub fn config_dir(&self) -> Option<PathBuf> {
        self.config_dir
            .clone()
            .or_else(|| dirs::config_dir().map(|d| d.join("samplehub")))
    }

    pub fn to_run_config(&self) -> RunConfig {
        let mut builder = RunConfig::builder();
        if let Some(dir) = self.config_dir() {
            builder = builder.config_dir(dir);
        }
        if let Some(name) = &self.output_folder {
            builder = builder.output_folder_name(name.as_str());
        }
        if let Some(path) = &self.tuning {
            builder = builder.tuning_path(path);
        }
        if let Some(path) = &self.hints {
            builder = builder.bucket_hints_path(path);
        }
        if let Some(workers) = self.workers {
            builder = builder.workers(workers);
        }
        builder.build()
    }

    /// Explicit flag, then the config dir, then the hub's config folder
    pub fn styles_path(&self) -> Option<PathBuf> {
        self.locate(self.styles.as_ref(), STYLES_FILE_NAME)
    }

    pub fn bucket_names_path(&self) -> Option<PathBuf> {
        self.locate(self.bucket_names.as_ref(), BUCKET_NAMES_FILE_NAME)
    }

    fn locate(&self, explicit: Option<&PathBuf>, file_name: &str) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.clone());
        }
        let mut candidates: Vec<PathBuf> = self.config_dir().into_iter().map(|d| d.join(file_name)).collect();
        candidates.push(self.hub.join("config").join(file_name));
        candidates.into_iter().find(|p| p.is_file())
    }
}
