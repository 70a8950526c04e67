//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "dispenser", version, about = "Medication dispenser control")]
pub struct Cli {
    /// Schedule file to load at startup (TOML, or CSV by extension)
    #[arg(long, value_name = "FILE", default_value = "etc/schedule.toml")]
    pub schedule: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Optional log file (JSON lines, written through a non-blocking appender)
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the dispense tick loop against the loaded schedule
    Run {
        /// Tick interval in milliseconds
        #[arg(long, value_name = "MS", default_value_t = 1000)]
        tick_ms: u64,

        /// Dose event log path (append-only, one line per event)
        #[arg(long, value_name = "FILE", default_value = "dose_events.log")]
        event_log: PathBuf,

        /// Stop after this many ticks (0 = run until Ctrl-C)
        #[arg(long, value_name = "N", default_value_t = 0)]
        max_ticks: u64,
    },
    /// Quick health check (hardware presence / sim ok)
    SelfCheck,
    /// Drive the carousel to its home position
    Home,
    /// Load, validate and print the schedule file
    Schedule,
}
