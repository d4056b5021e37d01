// src/cli/mod.rs
//
// Command-line interface module

mod args;
mod output;

pub use args::{Args, BUCKET_NAMES_FILE_NAME, STYLES_FILE_NAME};
pub use output::{
    format_benchmark, format_entry, format_run_report, format_undo_summary, print_benchmark,
    print_run_report, print_undo_summary,
};
