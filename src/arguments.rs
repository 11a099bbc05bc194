/// Command-line argument handling for WhaleWatch
///
/// `clap` parses the documented flags for the binary. The raw argument list is
/// also kept in `CMD_ARGS` so the logger can pick up `--debug-<tag>` flags
/// without every module threading the parsed struct around.
use clap::Parser;
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Override the stored arguments (used by binaries and tests)
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// WhaleWatch - Solana whale wallet and token activity monitor
#[derive(Debug, Parser)]
#[command(name = "whalewatch", version, about)]
pub struct Arguments {
    /// Path to the TOML configuration file (defaults to the data directory)
    #[arg(long)]
    pub config: Option<String>,

    /// Keep all state in memory instead of the SQLite database
    #[arg(long)]
    pub dry_run: bool,

    /// Probe every configured endpoint once and exit
    #[arg(long)]
    pub check_endpoints: bool,

    /// Show verbose logs for every subsystem
    #[arg(long)]
    pub verbose: bool,

    /// Only show warnings and errors
    #[arg(long)]
    pub quiet: bool,

    /// Do not write a log file
    #[arg(long)]
    pub no_log_file: bool,
}

impl Arguments {
    /// Parse arguments, ignoring the `--debug-<tag>`/`--only-<tag>` flags that clap does not know
    pub fn from_env() -> Self {
        let filtered: Vec<String> = get_cmd_args()
            .into_iter()
            .filter(|a| !a.starts_with("--debug-") && !a.starts_with("--only-"))
            .collect();
        Self::parse_from(filtered)
    }
}
