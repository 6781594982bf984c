//! ts CLI - timestamp sender and receiver
//!
//! `ts -s` writes timestamped messages, `ts -r` reads them and prints the
//! arrival timing of each one.

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tstamp::config::{CliArgs, Commands, OutputFormat, SessionConfig};
use tstamp::core::{Receiver, Sender};
use tstamp::error::{Result, TimestampError};
use tstamp::progress::ProgressReporter;
use tstamp::report::{format_samples, read_report, resolve_report_path, sample_records, SummaryBuilder};
use tstamp::timestamp::TimeStampMode;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging; stdout carries data, so logs go to stderr
    init_logging(args.verbose, args.quiet);

    // Handle result
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: CliArgs) -> Result<()> {
    // Handle subcommands
    if let Some(command) = &args.command {
        return handle_command(command);
    }

    if !args.send && !args.receive {
        eprintln!("Usage: ts -s [-b SIZE] [-c COUNT] [-i INTERVAL] [--connect ADDR]");
        eprintln!("       ts -r [-b SIZE] [-c COUNT] [--listen ADDR] [-o REPORT]");
        eprintln!("       ts sample <REPORT>   - Print random samples of a report");
        eprintln!("       ts --help for more information");
        std::process::exit(1);
    }

    // Build configuration
    let config = SessionConfig::from_cli(&args).map_err(TimestampError::ConfigError)?;

    if args.verbose > 0 {
        print_config(&config);
    }

    // Create progress reporter
    let progress = if config.progress && !config.quiet {
        match config.mode {
            TimeStampMode::Send => ProgressReporter::new(Some(config.send_count()), "send"),
            TimeStampMode::Receive => ProgressReporter::new(config.count, "recv"),
        }
    } else {
        ProgressReporter::disabled()
    };

    match config.mode {
        TimeStampMode::Send => {
            let sender = Sender::new(config.clone()).with_progress(progress);
            sender.cancel_on_signal()?;
            let stats = sender.execute()?;
            if config.summary_format().is_some() {
                eprintln!("{}", stats.summary());
            }
        }
        TimeStampMode::Receive => {
            let summary = Receiver::new(config.clone()).with_progress(progress).execute()?;
            if let Some(format) = config.summary_format() {
                eprint!("{}", summary.render(format)?);
            }
        }
    }

    Ok(())
}

fn handle_command(command: &Commands) -> Result<()> {
    match command {
        Commands::Sample { report, count, seed } => cmd_sample(report, *count, *seed),
        Commands::Summary { report, format } => cmd_summary(report, *format),
    }
}

fn print_config(config: &SessionConfig) {
    eprintln!("=== Session Configuration ===");
    eprintln!("Mode:      {}", config.mode);
    eprintln!("Endpoint:  {}", config.endpoint);
    eprintln!("Padding:   {}", humansize::format_size(u64::from(config.pad_size), humansize::BINARY));
    match config.mode {
        TimeStampMode::Send => {
            eprintln!("Count:     {}", config.send_count());
            eprintln!("Interval:  {}", humantime::format_duration(config.interval));
        }
        TimeStampMode::Receive => {
            match config.count {
                Some(count) => eprintln!("Count:     {}", count),
                None => eprintln!("Count:     until sender finishes"),
            }
            if let Some(path) = &config.report_path {
                eprintln!("Report:    {}", resolve_report_path(path).display());
            }
        }
    }
    eprintln!();
}

/// Prefer the path as given; fall back to where the receiver puts relative reports
fn locate_report(path: &Path) -> PathBuf {
    if path.exists() {
        path.to_path_buf()
    } else {
        resolve_report_path(path)
    }
}

fn cmd_sample(report: &Path, count: usize, seed: Option<u64>) -> Result<()> {
    let path = locate_report(report);
    let records = read_report(&path)?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let samples = sample_records(&mut rng, &records, count)?;

    println!("{}", path.display());
    println!("Deltas|{}", format_samples(&samples, |r| r.delta.as_millis()));
    println!("Normalized|{}", format_samples(&samples, |r| r.normalized.as_millis()));

    Ok(())
}

fn cmd_summary(report: &Path, format: OutputFormat) -> Result<()> {
    let path = locate_report(report);
    let records = read_report(&path)?;

    let mut builder = SummaryBuilder::new();
    for record in &records {
        builder.add(record);
    }

    print!("{}", builder.build(None).render(format)?);
    Ok(())
}
