use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use super::parsers::{parse_duration_arg, parse_header};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Rate-limited, retrying HTTP API prober with running latency statistics."
)]
pub struct ProbeCliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a config file (.toml or .json)
    #[arg(long = "config", short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Global request rate limit (requests per second)
    #[arg(long = "rate", short = 'r', global = true)]
    pub rate: Option<u32>,

    /// Enable verbose logging
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Print the engine metrics snapshot after the run
    #[arg(long = "metrics", global = true)]
    pub metrics: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Probe a single endpoint and print the outcome as JSON
    Probe(ProbeArgs),
    /// Run a batch described by a JSON file and print the result as JSON
    Batch(BatchArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ProbeArgs {
    /// Target URL
    pub url: String,

    /// HTTP method
    #[arg(long = "method", short = 'X', default_value = "GET")]
    pub method: String,

    /// HTTP header in 'Name: Value' form (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request body
    #[arg(long = "data", short = 'd')]
    pub data: Option<String>,

    /// Per-attempt timeout (e.g. 500ms, 10s, 1m)
    #[arg(long = "timeout", short = 't', value_parser = parse_duration_arg)]
    pub timeout: Option<Duration>,

    /// Maximum retries (capped at 2)
    #[arg(long = "retries")]
    pub retries: Option<u32>,

    /// Do not follow redirects
    #[arg(long = "no-redirects")]
    pub no_redirects: bool,

    /// Endpoint identifier echoed in the outcome
    #[arg(long = "endpoint-id")]
    pub endpoint_id: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    /// JSON file holding the batch request
    pub file: PathBuf,

    /// Maximum probes in flight (defaults to the configured concurrency)
    #[arg(long = "concurrency", short = 'n', default_value_t = 0)]
    pub concurrency: usize,
}
