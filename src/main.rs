/*!
 * Command-line interface for codepack
 */

use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use codepack::config::{Args, Config, ReportKind};
use codepack::report::{ReportFormat, Reporter, ScanReport};
use codepack::{pack_with_progress, Result};

fn main() -> ExitCode {
    let args = Args::parse();
    setup_tracing(args.verbose);
    debug!("Parsed CLI arguments: {args:?}");

    if let Some(shell) = args.generate {
        clap_complete::generate(shell, &mut Args::command(), "codepack", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = Config::from_args(args);

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos} files ⏱️  {elapsed_precise}")
        {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_prefix("📦 Packing");
        bar.set_message(format!("📂 Scanning directory: {}", config.target_dir.display()));
        bar
    };

    let start_time = Instant::now();
    let result = pack_with_progress(&config, Arc::new(progress.clone()));
    progress.finish_and_clear();
    let summary = result?;

    if args.quiet {
        return Ok(());
    }

    let report = ScanReport {
        output: config.output.to_string(),
        duration: start_time.elapsed(),
        summary,
    };
    let format = match args.report {
        ReportKind::Table => ReportFormat::ConsoleTable,
        ReportKind::Json => ReportFormat::Json,
    };
    Reporter::new(format).print_report(&report)
}

fn setup_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .compact()
        .init();
}
