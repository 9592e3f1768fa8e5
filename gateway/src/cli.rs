use chrono::TimeDelta;
use clap::Parser;
use std::num::ParseIntError;
use std::path::PathBuf;

fn parse_delta(s: &str) -> Result<TimeDelta, String> {
    let millis: i64 = s.parse().map_err(|e: ParseIntError| e.to_string())?;
    TimeDelta::try_milliseconds(millis).ok_or_else(|| format!("{millis}ms is out of range"))
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)] // read from Cargo.toml
pub struct Cli {
    /// Virtual devices configuration file
    #[arg(env = "GATEWAY_VDEV_CONFIG", long = "vdev-config", value_name = "path")]
    pub vdev_config: Option<PathBuf>,

    /// Warn about polls taking longer than the device refresh time plus
    /// this many milliseconds. May be negative.
    #[arg(
        env = "GATEWAY_POLL_WARN_THRESHOLD_MS",
        long = "poll-warn-threshold-ms",
        value_name = "ms",
        value_parser = parse_delta,
        allow_hyphen_values = true
    )]
    pub poll_warn_threshold: Option<TimeDelta>,

    /// Maximum number of devices polled at the same time
    #[arg(
        env = "GATEWAY_POLL_CONCURRENCY",
        long = "poll-concurrency",
        value_name = "n",
        default_value_t = 8
    )]
    pub poll_concurrency: usize,
}

/// Parse the command line arguments
pub fn parse() -> Cli {
    Cli::parse()
}
