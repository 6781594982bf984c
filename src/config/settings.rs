//! Configuration settings for tstamp
//!
//! Defines the CLI arguments, their defaults, and the runtime session
//! configuration derived from them.

use crate::network::Endpoint;
use crate::protocol::MAX_PADDING;
use crate::timestamp::{TimeStampMode, ENV_TIMESTAMP_OUTPUT};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Messages sent when no count is given
pub const DEFAULT_COUNT: u64 = 1024;

/// ts - timestamp sender and receiver
#[derive(Parser, Debug, Clone)]
#[command(name = "ts")]
#[command(author = "tstamp Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Send and receive timestamped messages to measure arrival timing")]
#[command(long_about = r#"
ts sends a stream of timestamped messages and measures how they arrive.

The sender writes stamps to stdout (or a TCP connection); the receiver reads
them from stdin (or a TCP listener) and prints one line per message:

  DELTA,NORMALIZED

where DELTA is the arrival time minus the previous arrival and NORMALIZED
is the arrival time minus the first arrival, both in milliseconds.

If TIMESTAMP_OUTPUT is set, the receiver also writes a detailed CSV report
to that file (relative names are placed in the temporary directory).
Nothing else is written unless --summary, --format or -v asks for the
end-of-session summary on stderr.

Examples:
  ts -s -b 512 -c 1024 | ssh host ts -r -b 512 -c 1024
  ts -r --listen 0.0.0.0:9870 &  ts -s --connect host:9870 -i 10ms
  ts sample /tmp/tsLog.csv -n 8
"#)]
#[command(group(ArgGroup::new("role").args(["send", "receive"])))]
pub struct CliArgs {
    /// Run as the sender
    #[arg(short = 's', long)]
    pub send: bool,

    /// Run as the receiver
    #[arg(short = 'r', long)]
    pub receive: bool,

    /// Padding bytes appended to each message (e.g., 512, 8K)
    #[arg(short = 'b', long = "pad-size", default_value = "0", value_name = "SIZE")]
    pub pad_size: String,

    /// Number of messages (sender default: 1024; receiver: until the sender finishes)
    #[arg(short = 'c', long, value_name = "NUM")]
    pub count: Option<u64>,

    /// Delay between messages on the sender (e.g., 10ms, 1s)
    #[arg(short = 'i', long, value_name = "DURATION")]
    pub interval: Option<String>,

    /// Send to a listening receiver over TCP instead of stdout
    #[arg(long, value_name = "ADDR", conflicts_with = "listen")]
    pub connect: Option<String>,

    /// Receive from one sender over TCP instead of stdin
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<String>,

    /// Detailed receiver report file
    #[arg(short = 'o', long, env = ENV_TIMESTAMP_OUTPUT, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print the session summary on stderr when the session ends
    #[arg(long)]
    pub summary: bool,

    /// Format of the session summary (implies --summary)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Show a progress bar on stderr
    #[arg(short = 'p', long)]
    pub progress: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only, overrides --summary)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print random samples of a detailed report
    #[command(name = "sample")]
    Sample {
        /// Detailed report file
        report: PathBuf,
        /// Number of samples
        #[arg(short = 'n', long, default_value_t = crate::report::DEFAULT_SAMPLE_COUNT)]
        count: usize,
        /// Seed for reproducible picks
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Recompute the session summary from a detailed report
    #[command(name = "summary")]
    Summary {
        /// Detailed report file
        report: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output format for summaries
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sender or receiver
    pub mode: TimeStampMode,
    /// Padding bytes per message
    pub pad_size: u32,
    /// Messages to send, or stamps to wait for
    pub count: Option<u64>,
    /// Delay between messages (sender)
    pub interval: Duration,
    /// Stream endpoint
    pub endpoint: Endpoint,
    /// Detailed report path (receiver)
    pub report_path: Option<PathBuf>,
    /// Summary format
    pub format: OutputFormat,
    /// Print a summary once the session ends
    pub summary: bool,
    /// Show progress bar
    pub progress: bool,
    /// Errors only
    pub quiet: bool,
}

impl SessionConfig {
    /// Create a sender configuration with defaults
    pub fn sender() -> Self {
        Self {
            mode: TimeStampMode::Send,
            count: Some(DEFAULT_COUNT),
            ..Self::receiver()
        }
    }

    /// Create a receiver configuration with defaults
    pub fn receiver() -> Self {
        Self {
            mode: TimeStampMode::Receive,
            pad_size: 0,
            count: None,
            interval: Duration::ZERO,
            endpoint: Endpoint::Stdio,
            report_path: None,
            format: OutputFormat::Text,
            summary: false,
            progress: false,
            quiet: false,
        }
    }

    /// Number of messages the sender emits
    pub fn send_count(&self) -> u64 {
        self.count.unwrap_or(DEFAULT_COUNT)
    }

    /// Format to print the end-of-session summary in, if one is wanted
    ///
    /// Stdout carries the CSV lines and remote harnesses often merge stderr
    /// into it, so nothing else is printed unless asked for.
    pub fn summary_format(&self) -> Option<OutputFormat> {
        (self.summary && !self.quiet).then_some(self.format)
    }

    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        let mut config = match (args.send, args.receive) {
            (true, false) => Self::sender(),
            (false, true) => Self::receiver(),
            _ => return Err("exactly one of --send (-s) or --receive (-r) is required".to_string()),
        };

        let pad_size = parse_size(&args.pad_size).map_err(|e| format!("Invalid pad size: {}", e))?;
        if pad_size > u64::from(MAX_PADDING) {
            return Err(format!(
                "Pad size {} exceeds limit of {} bytes",
                pad_size, MAX_PADDING
            ));
        }
        config.pad_size = pad_size as u32;

        if let Some(count) = args.count {
            config.count = Some(count);
        }

        if let Some(interval) = &args.interval {
            config.interval = humantime::parse_duration(interval)
                .map_err(|e| format!("Invalid interval '{}': {}", interval, e))?;
        }

        config.endpoint = match (config.mode, &args.connect, &args.listen) {
            (_, None, None) => Endpoint::Stdio,
            (TimeStampMode::Send, Some(addr), None) => Endpoint::Connect(addr.clone()),
            (TimeStampMode::Receive, None, Some(addr)) => Endpoint::Listen(addr.clone()),
            (TimeStampMode::Send, _, Some(_)) => {
                return Err("--listen is only valid for the receiver".to_string())
            }
            (TimeStampMode::Receive, Some(_), _) => {
                return Err("--connect is only valid for the sender".to_string())
            }
        };

        config.report_path = args.output.clone();
        config.format = args.format.unwrap_or_default();
        config.summary = args.summary || args.format.is_some() || args.verbose > 0;
        config.progress = args.progress;
        config.quiet = args.quiet;

        Ok(config)
    }
}

/// Parse human-readable size string to bytes
pub fn parse_size(size: &str) -> Result<u64, String> {
    let size = size.trim().to_uppercase();

    if size.is_empty() {
        return Err("Empty size string".to_string());
    }

    let (num_str, multiplier) = if size.ends_with("MB") || size.ends_with('M') {
        (size.trim_end_matches(['M', 'B']), 1024u64 * 1024)
    } else if size.ends_with("KB") || size.ends_with('K') {
        (size.trim_end_matches(['K', 'B']), 1024u64)
    } else if size.ends_with('B') {
        (size.trim_end_matches('B'), 1u64)
    } else {
        // Assume bytes if no suffix
        (size.as_str(), 1u64)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: {}", num_str))?;

    if !num.is_finite() {
        return Err(format!("Invalid number: {}", num_str));
    }
    if num < 0.0 {
        return Err(format!("Negative size: {}", num_str));
    }

    Ok((num * multiplier as f64) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("0").unwrap(), 0);
        assert_eq!(parse_size("8192").unwrap(), 8192);
        assert_eq!(parse_size("1K").unwrap(), 1024);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("2M").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("1.5K").unwrap(), 1536);
        assert!(parse_size("").is_err());
        assert!(parse_size("lots").is_err());
        assert!(parse_size("-1").is_err());
    }

    #[test]
    fn test_parse_size_rejects_non_finite() {
        assert!(parse_size("nan").is_err());
        assert!(parse_size("NaN").is_err());
        assert!(parse_size("inf").is_err());
        assert!(parse_size("-infK").is_err());
        assert!(SessionConfig::from_cli(&parse(&["ts", "-s", "-b", "nan"])).is_err());
    }

    #[test]
    fn test_summary_is_opt_in() {
        let plain = ["ts", "-r", "-b", "32", "-c", "5"];
        let config = SessionConfig::from_cli(&parse(&plain)).unwrap();
        assert_eq!(config.summary_format(), None);
        let config = SessionConfig::from_cli(&parse(&["ts", "-s", "-b", "32", "-c", "5"])).unwrap();
        assert_eq!(config.summary_format(), None);

        let config = SessionConfig::from_cli(&parse(&["ts", "-r", "--summary"])).unwrap();
        assert_eq!(config.summary_format(), Some(OutputFormat::Text));
        let config = SessionConfig::from_cli(&parse(&["ts", "-r", "--format", "json"])).unwrap();
        assert_eq!(config.summary_format(), Some(OutputFormat::Json));
        let config = SessionConfig::from_cli(&parse(&["ts", "-s", "-v"])).unwrap();
        assert_eq!(config.summary_format(), Some(OutputFormat::Text));

        let config = SessionConfig::from_cli(&parse(&["ts", "-r", "--summary", "-q"])).unwrap();
        assert_eq!(config.summary_format(), None);
    }

    #[test]
    fn test_sender_from_cli() {
        let config = SessionConfig::from_cli(&parse(&["ts", "-s", "-b", "512", "-c", "16"])).unwrap();
        assert_eq!(config.mode, TimeStampMode::Send);
        assert_eq!(config.pad_size, 512);
        assert_eq!(config.send_count(), 16);
        assert_eq!(config.endpoint, Endpoint::Stdio);
    }

    #[test]
    fn test_receiver_defaults() {
        let config = SessionConfig::from_cli(&parse(&["ts", "-r", "-o", "tsLog.csv"])).unwrap();
        assert_eq!(config.mode, TimeStampMode::Receive);
        assert_eq!(config.count, None);
        assert_eq!(config.report_path, Some(PathBuf::from("tsLog.csv")));
    }

    #[test]
    fn test_sender_default_count() {
        let config = SessionConfig::from_cli(&parse(&["ts", "-s"])).unwrap();
        assert_eq!(config.send_count(), DEFAULT_COUNT);
    }

    #[test]
    fn test_interval_and_tcp() {
        let config = SessionConfig::from_cli(&parse(&[
            "ts", "-s", "-i", "10ms", "--connect", "10.0.0.2:9870",
        ]))
        .unwrap();
        assert_eq!(config.interval, Duration::from_millis(10));
        assert_eq!(config.endpoint, Endpoint::Connect("10.0.0.2:9870".into()));

        let config =
            SessionConfig::from_cli(&parse(&["ts", "-r", "--listen", "0.0.0.0:9870"])).unwrap();
        assert_eq!(config.endpoint, Endpoint::Listen("0.0.0.0:9870".into()));
    }

    #[test]
    fn test_invalid_combinations() {
        assert!(SessionConfig::from_cli(&parse(&["ts"])).is_err());
        assert!(SessionConfig::from_cli(&parse(&["ts", "-s", "--listen", "x:1"])).is_err());
        assert!(SessionConfig::from_cli(&parse(&["ts", "-r", "--connect", "x:1"])).is_err());
        assert!(SessionConfig::from_cli(&parse(&["ts", "-s", "-i", "soon"])).is_err());
        assert!(SessionConfig::from_cli(&parse(&["ts", "-s", "-b", "32M"])).is_err());

        assert!(CliArgs::try_parse_from(["ts", "-s", "-r"]).is_err());
    }

    #[test]
    fn test_sample_subcommand() {
        let args = parse(&["ts", "sample", "/tmp/tsLog.csv", "-n", "4", "--seed", "9"]);
        match args.command {
            Some(Commands::Sample { report, count, seed }) => {
                assert_eq!(report, PathBuf::from("/tmp/tsLog.csv"));
                assert_eq!(count, 4);
                assert_eq!(seed, Some(9));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
