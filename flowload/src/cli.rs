use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use flowload_core::LoadOverrides;

fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 10s, 250ms, 1m)".to_string());
    }

    // Bare integers are seconds.
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    humantime::parse_duration(s)
        .map_err(|_| format!("invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"))
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Progress bar and human-readable analytics.
    HumanReadable,
    /// Emit NDJSON progress and summary lines to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "flowload",
    author,
    version,
    about = "Register/login/endpoint load generator for HTTP auth services",
    long_about = "flowload drives a population of simulated users through a registration, login, and authenticated endpoint workflow, records the outcome of every request, and reports per-stage analytics.\n\nConfiguration comes from built-in defaults, an optional YAML file (--config), and CLI flags / environment variables, in increasing order of precedence.",
    after_help = "Examples:\n  flowload run\n  flowload run --base-url http://127.0.0.1:8080 --users 500 --concurrency 64\n  flowload run --config flowload.yaml --output json --series-out series.json\n  flowload init"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the register -> login -> endpoints workflow for every simulated user
    Run(RunArgs),

    /// Write a starter flowload.yaml
    Init(InitArgs),
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Target directory (created if missing)
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,

    /// Config filename to create in the target directory
    #[arg(long, default_value = "flowload.yaml")]
    pub file: String,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// YAML config file; CLI flags override its values
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the service under test
    #[arg(long, env = "FLOWLOAD_BASE_URL")]
    pub base_url: Option<String>,

    /// Registration path (POST)
    #[arg(long)]
    pub register_path: Option<String>,

    /// Login path (POST)
    #[arg(long)]
    pub login_path: Option<String>,

    /// Authenticated endpoint path (GET, repeatable, called in the order given)
    #[arg(long = "endpoint", value_name = "PATH")]
    pub endpoints: Vec<String>,

    /// Number of simulated users
    #[arg(long, env = "FLOWLOAD_USERS")]
    pub users: Option<u64>,

    /// Maximum number of sessions in flight (unbounded when unset)
    #[arg(long, env = "FLOWLOAD_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Per-request timeout (e.g. 10s, 250ms, 1m)
    #[arg(long, value_parser = parse_duration)]
    pub request_timeout: Option<Duration>,

    /// TCP connect timeout (e.g. 3s)
    #[arg(long, value_parser = parse_duration)]
    pub connect_timeout: Option<Duration>,

    /// Where to write the per-request results file
    #[arg(long, default_value = "test_results.txt", value_name = "PATH")]
    pub results_file: PathBuf,

    /// Skip writing the results file
    #[arg(long, conflicts_with = "results_file")]
    pub no_results_file: bool,

    /// Write chart-ready series (per-stage stats, cumulative errors, per-endpoint timings) as JSON
    #[arg(long, value_name = "PATH")]
    pub series_out: Option<PathBuf>,

    /// Exit with code 10 when any request failed
    #[arg(long)]
    pub fail_on_errors: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}

impl RunArgs {
    pub fn overrides(&self) -> LoadOverrides {
        LoadOverrides {
            base_url: self.base_url.clone(),
            register_path: self.register_path.clone(),
            login_path: self.login_path.clone(),
            endpoints: (!self.endpoints.is_empty()).then(|| self.endpoints.clone()),
            users: self.users,
            concurrency: self.concurrency,
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
        }
    }
}
