//! samplehub - Classify audio samples and organize them into a hub
//!
//! Combines lexical hints from folder and file names with DSP features
//! (spectral shape, transients, pitch and pitch glides) to sort one-shot
//! samples into production buckets, then files them into a styled,
//! auditable and reversible destination tree.
//!
//! ## Features
//!
//! - **Hybrid scoring**: folder/filename keyword hints plus rule-based audio and pitch scores
//! - **808 glide detection**: YIN F0 tracking with a robust descending-slide detector
//! - **Persistent feature cache**: keyed by path, size and mtime
//! - **Safe transfers**: idempotent copy/move that never overwrites or renames
//! - **Audit and undo**: move runs write a CSV trail that can be replayed backwards
//! - **Folder styling**: `.nfo` sidecars per category, bucket and pack
//!
//! ## Module Structure
//!
//! - `core` - Decoding, DSP utilities, feature extraction and the feature cache
//! - `classify` - Bucket taxonomy, hint scanning, scoring and the classifier
//! - `config` - Tuning, bucket hints and run settings
//! - `engine` - Run orchestration, transfer, audit, undo and benchmarks
//! - `styles` - Style resolution and sidecar files
//! - `cli` - Terminal output for the binary
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use samplehub::{Engine, Mode, RunConfig, RunOptions};
//!
//! let engine = Engine::new("/samples/inbox", "/samples/hub", RunConfig::default())?;
//! let report = engine.run(Mode::Analyze, &RunOptions::default())?;
//! println!("classified {} files", report.files_processed);
//! ```
//!
//! ## Modes
//!
//! | Mode          | Hub / sidecars | Logs / report | Transfer | Inbox layout       |
//! |---------------|----------------|---------------|----------|--------------------|
//! | analyze       | no             | no            | no       | no                 |
//! | dry-run       | no             | yes           | no       | loose-file wrap    |
//! | copy          | yes            | yes           | copy     | yes                |
//! | move          | yes            | yes           | move     | yes                |
//! | repair-styles | sidecars+cache | yes           | no       | no                 |

// Decoding, DSP and feature extraction
pub mod core;

// Classification
pub mod classify;

// Configuration
pub mod config;

// Run orchestration
pub mod engine;

// Folder styling
pub mod styles;

// Terminal output
pub mod cli;

mod error;

pub use error::{Error, Result};

// Re-export commonly used types at crate root for convenience
pub use classify::{Bucket, Category, ClassificationResult, Classifier};
pub use config::{BucketHints, RunConfig, Tuning, TuningBuilder};
pub use core::{AudioBackend, FeatureCache, FeatureVector, NullBackend, SymphoniaBackend};
pub use engine::{BenchmarkOptions, BenchmarkReport, Engine, EngineBuilder, Mode, RunOptions, RunReport, UndoSummary};
pub use styles::{BucketNames, Style, StyleBook, StyleResolver};
