//! Clap derive structures for the `perla` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// perla -- poll a BWT Perla water softener over its local API
#[derive(Debug, Parser)]
#[command(
    name = "perla",
    version,
    about = "Monitor a BWT Perla water softener from the command line",
    long_about = "Reads the local status endpoint of a BWT Perla water softener.\n\n\
        Configure an appliance once with `perla setup`, then query it with\n\
        `perla status` or follow it with `perla watch`.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configured appliance entry to use
    #[arg(long, short = 'e', env = "PERLA_ENTRY", global = true)]
    pub entry: Option<String>,

    /// Appliance host (overrides entry)
    #[arg(long, short = 'H', env = "PERLA_HOST", global = true)]
    pub host: Option<String>,

    /// Appliance port (overrides entry)
    #[arg(long, env = "PERLA_PORT", global = true)]
    pub port: Option<u16>,

    /// Basic-auth username (overrides entry)
    #[arg(long, short = 'u', env = "PERLA_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PERLA_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides entry)
    #[arg(long, env = "PERLA_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one `key=value` per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add an appliance: validate, probe, and save it as an entry
    Setup(SetupArgs),

    /// Fetch once and print every reading
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Poll continuously and print a line per refresh cycle
    Watch(WatchArgs),

    /// Fetch once and print a redacted diagnostics report
    #[command(alias = "diag")]
    Diagnostics,

    /// Manage CLI configuration and entries
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Setup ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SetupArgs {
    /// Entry name to save under (defaults to --entry or "default")
    #[arg(long)]
    pub name: Option<String>,

    /// Poll interval in seconds (5-3600)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Read the password from this environment variable at runtime
    #[arg(long)]
    pub password_env: Option<String>,

    /// Store the password in the system keyring instead of the config file
    #[arg(long)]
    pub keyring: bool,

    /// Never prompt; fail if --host is missing
    #[arg(long)]
    pub non_interactive: bool,

    /// Make this the default entry
    #[arg(long)]
    pub set_default: bool,
}

// ── Status ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Include readings the appliance did not report
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Print the raw status document instead of readings
    #[arg(long)]
    pub raw: bool,
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll interval in seconds (overrides entry)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Stop after this many cycles
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the current configuration with secrets masked
    Show,

    /// Print the config file path
    Path,

    /// Remove an entry (and its keyring password)
    Remove {
        /// Entry name
        name: String,
    },

    /// Set the default entry
    Use {
        /// Entry name
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
