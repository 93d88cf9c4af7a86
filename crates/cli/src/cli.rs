//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::InferenceMode;
use std::path::PathBuf;

/// VisionLink - real-time object detection over a paired camera session
#[derive(Parser, Debug)]
#[command(
    name = "visionlink",
    author,
    version,
    about = "Real-time detection session with latency telemetry",
    long_about = "Captures frames at a fixed rate, runs detection locally or on a relay \n\
                  server, draws the overlay and reports end-to-end latency.\n\n\
                  The relay channel speaks newline-delimited JSON over TCP."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "VISIONLINK_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "VISIONLINK_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a live session until Ctrl+C (or --duration)
    Run(RunArgs),

    /// Run a fixed-duration benchmark and export the summary
    Bench(BenchArgs),

    /// Validate a configuration file without running
    Validate(ValidateArgs),

    /// Display the effective configuration
    Info(InfoArgs),
}

/// Settings shared by `run` and `bench`
#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// Configuration file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "VISIONLINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the initial inference mode
    #[arg(long, value_enum, env = "VISIONLINK_MODE")]
    pub mode: Option<ModeArg>,

    /// Override the relay host
    #[arg(long, env = "VISIONLINK_HOST")]
    pub host: Option<String>,

    /// Override the relay port
    #[arg(long, env = "VISIONLINK_PORT")]
    pub port: Option<u16>,

    /// Override the capture rate cap (frames per second)
    #[arg(long)]
    pub fps: Option<f64>,

    /// Raw f32 output tensor to replay through the local decoder
    #[arg(long, env = "VISIONLINK_TENSOR")]
    pub tensor: Option<PathBuf>,

    /// Prometheus exporter port (overrides config; 0 = disabled)
    #[arg(long, env = "VISIONLINK_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Synthetic camera resolution, before downscale
    #[arg(long, default_value = "640x480", value_parser = parse_resolution)]
    pub source_size: (u32, u32),

    /// Write the final overlay as PNG on exit
    #[arg(long)]
    pub overlay_out: Option<PathBuf>,
}

/// Arguments for the `run` command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Stop after this many seconds (0 = run until interrupted)
    #[arg(long, default_value = "0", env = "VISIONLINK_DURATION")]
    pub duration: u64,

    /// Ask the server for telemetry every N seconds (0 = never)
    #[arg(long, default_value = "0")]
    pub server_metrics_every: u64,

    /// Validate configuration and exit without starting a session
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `bench` command
#[derive(Args, Debug, Clone)]
pub struct BenchArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Benchmark length in seconds (overrides metrics.benchmark_seconds)
    #[arg(long)]
    pub duration: Option<u64>,

    /// Summary file (overrides metrics.export_path)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "visionlink.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Configuration file; built-in defaults when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, conflicts_with = "toml")]
    pub json: bool,

    /// Print the full effective configuration as TOML
    #[arg(long)]
    pub toml: bool,

    /// Show the detector model layout
    #[arg(long)]
    pub model: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// On-device decode
    #[value(alias = "wasm")]
    Local,
    /// Upload frames to the relay server
    #[value(alias = "server")]
    Remote,
}

impl From<ModeArg> for InferenceMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Local => Self::Local,
            ModeArg::Remote => Self::Remote,
        }
    }
}

fn parse_resolution(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<u32>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| format!("invalid dimension '{s}'"))
    };
    Ok((parse(w)?, parse(h)?))
}
