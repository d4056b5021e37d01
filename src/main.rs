// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use colorful::Colorful;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use samplehub::cli::{self, Args};
use samplehub::{BenchmarkOptions, BucketNames, Engine, RunOptions, StyleBook};

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if !args.inbox.exists() && !args.undo {
        println!("{}", format!("Inbox {} does not exist, nothing to do", args.inbox.display()).yellow());
    }

    let mut builder = Engine::builder(&args.inbox, &args.hub).config(args.to_run_config());
    if let Some(path) = args.styles_path() {
        builder = builder.styles(Box::new(StyleBook::load(&path)));
    }
    if let Some(path) = args.bucket_names_path() {
        builder = builder.bucket_names(BucketNames::load(&path));
    }
    let engine = builder.build().context("Failed to prepare engine")?;

    if args.undo {
        let summary = engine.undo_last_run().context("Undo failed")?;
        cli::print_undo_summary(&summary);
        return Ok(());
    }

    let progress = create_progress_bar(args.quiet)?;
    let options = RunOptions {
        workers: args.workers,
        progress: Some(progress.clone()),
    };

    if let Some(output) = &args.benchmark {
        let bench_options = BenchmarkOptions {
            top_confusions: args.top_confusions,
            max_files: args.max_files,
            ..BenchmarkOptions::default()
        };
        let bench = engine
            .run_benchmark(&bench_options, &options, Some(output))
            .context("Benchmark failed")?;
        progress.finish_and_clear();
        cli::print_benchmark(&bench);
        println!("  Written to {}", output.display().to_string().cyan());
        return Ok(());
    }

    let report = engine
        .run(args.mode, &options)
        .with_context(|| format!("{} run failed", args.mode))?;
    progress.finish_and_clear();
    cli::print_run_report(&report, args.verbose);

    if report.failed > 0 {
        println!("{}", "Some files could not be transferred, see the run log".red());
    } else {
        println!("{}", "Done".green());
    }
    Ok(())
}

fn create_progress_bar(hidden: bool) -> Result<ProgressBar> {
    let pb = ProgressBar::new(0);
    if hidden {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, ETA: {eta})")
                .context("Invalid progress template")?
                .progress_chars("=> "),
        );
    }
    pb.set_message("Classifying");
    Ok(pb)
}
