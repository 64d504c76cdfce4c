//! Clap derive structures for the `sitekeep` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sitekeep -- keeps hosted static sites alive, backed up, and audited
#[derive(Debug, Parser)]
#[command(
    name = "sitekeep",
    version,
    about = "Maintenance worker for hosted static sites",
    long_about = "Runs uptime probes, backups, and SEO re-audits for every deployed site,\n\
        gated by each site's subscription plan.\n\n\
        Without a subcommand the worker runs a startup pass and then stays\n\
        resident on its cron cadences.",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    /// Run the startup pass and exit
    #[arg(long)]
    pub once: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "SITEKEEP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default)
    Table,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a site bundle (ZIP) and print its SEO metrics
    Analyze(AnalyzeArgs),

    /// Show recent maintenance log entries for a site
    #[command(alias = "log")]
    History(HistoryArgs),

    /// Probe one site now and record the result
    Ping(SiteArgs),

    /// Back up one site now and record the result
    Backup(SiteArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Path to the bundle
    pub bundle: PathBuf,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Site identifier
    pub site_id: String,

    /// Maximum entries to show (clamped to 1..=100)
    #[arg(long, short = 'n', default_value_t = 20)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct SiteArgs {
    /// Site identifier
    pub site_id: String,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}
