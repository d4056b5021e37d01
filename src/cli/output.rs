//! Output formatting for CLI results

use crate::engine::{BenchmarkReport, FileEntry, RunReport, TransferAction, UndoSummary};
use colorful::Colorful;

/// One line per classified file
pub fn format_entry(entry: &FileEntry) -> String {
    let name = entry
        .source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let bucket = if entry.classification.chosen_bucket.is_none() || entry.classification.low_confidence {
        entry.bucket.clone().yellow().to_string()
    } else {
        entry.bucket.clone().green().to_string()
    };
    let action = match entry.action {
        TransferAction::None => String::new(),
        TransferAction::Failed => format!(" [{}]", entry.action.as_str().red()),
        _ => format!(" [{}]", entry.action.as_str()),
    };
    format!(
        "    {} -> {} ({:.2}){}",
        name,
        bucket,
        entry.confidence,
        action
    )
}

/// Run summary; per-file lines only when verbose
pub fn format_run_report(report: &RunReport, verbose: bool) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{} {} [{}]\n",
        "samplehub".cyan(),
        report.run_id,
        report.mode
    ));

    if let Some(actions) = report.repair_actions {
        output.push_str(&format!(
            "  Sidecars: {} created, {} updated, {} removed\n",
            actions.created, actions.updated, actions.removed
        ));
    }

    if verbose {
        for pack in &report.packs {
            output.push_str(&format!("\n  {}\n", pack.pack.clone().cyan()));
            for entry in &pack.files {
                output.push_str(&format_entry(entry));
                output.push('\n');
            }
        }
        output.push('\n');
    }

    output.push_str(&format!("  Packs: {}\n", report.packs.len()));
    output.push_str(&format!("  Processed: {}\n", report.files_processed));
    if report.mode.transfers() {
        output.push_str(&format!(
            "  Copied: {}  Moved: {}  Skipped existing: {}\n",
            report.files_copied, report.files_moved, report.skipped_existing
        ));
    }
    if report.unsorted > 0 {
        output.push_str(&format!("  {}\n", format!("Unsorted: {}", report.unsorted).yellow()));
    }
    if report.files_skipped_non_wav > 0 {
        output.push_str(&format!("  Skipped non-WAV: {}\n", report.files_skipped_non_wav));
    }
    if report.failed > 0 {
        output.push_str(&format!("  {}\n", format!("Failed: {}", report.failed).red()));
    }

    let stats = &report.feature_cache_stats;
    output.push_str(&format!(
        "  Feature cache: {} hits, {} misses, {} saved\n",
        stats.hits, stats.misses, stats.saved_entries
    ));
    if let Some(dir) = &report.log_dir {
        output.push_str(&format!("  Logs: {}\n", dir.display()));
    }
    output
}

pub fn format_undo_summary(summary: &UndoSummary) -> String {
    let mut output = format!(
        "{} {}\n  Restored: {}\n",
        "Undo".cyan(),
        summary.audit_file.display(),
        format!("{}", summary.reverted_count).green()
    );
    if summary.skipped_missing > 0 {
        output.push_str(&format!("  Already gone: {}\n", summary.skipped_missing));
    }
    for conflict in &summary.conflicts {
        output.push_str(&format!(
            "  {}\n",
            format!("Conflict: {} -> {}", conflict.file, conflict.quarantined_to.display()).yellow()
        ));
    }
    output
}

pub fn format_benchmark(bench: &BenchmarkReport) -> String {
    let mut output = format!(
        "{} {} files in {:.2}s\n",
        "Benchmark".cyan(),
        bench.files_classified,
        bench.runtime_seconds
    );
    output.push_str(&format!(
        "  Low confidence: {} ({:.1}%)\n",
        bench.low_confidence.count,
        bench.low_confidence.rate * 100.0
    ));

    output.push_str("\n  Buckets:\n");
    for share in &bench.bucket_distribution {
        output.push_str(&format!("    {:<12} {:>6} {:>8.2}%\n", share.bucket, share.count, share.percent));
    }

    if !bench.confusion_pairs.is_empty() {
        output.push_str("\n  Confusions:\n");
        for pair in &bench.confusion_pairs {
            output.push_str(&format!("    {} / {}: {}\n", pair.chosen, pair.runner_up, pair.count));
        }
    }
    output
}

pub fn print_run_report(report: &RunReport, verbose: bool) {
    print!("{}", format_run_report(report, verbose));
}

pub fn print_undo_summary(summary: &UndoSummary) {
    print!("{}", format_undo_summary(summary));
}

pub fn print_benchmark(bench: &BenchmarkReport) {
    print!("{}", format_benchmark(bench));
}
