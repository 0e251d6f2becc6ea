//! CLI argument definitions for logwell-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Logwell syslog collection daemon.
///
/// Receives syslog messages over UDP and TLS, deduplicates them within a
/// sliding time window, and writes each accepted record as a JSON line to
/// one of eight severity-named files.
#[derive(Parser, Debug)]
#[command(name = "logwell-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to the logwell.toml configuration file.
    ///
    /// `SYSLOG_*` environment variables override values from the file.
    #[arg(short, long, default_value = "logwell.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}
