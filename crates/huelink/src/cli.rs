//! Clap derive structures for the `huelink` CLI.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// huelink -- keep an eye on a Hue bridge from the command line
#[derive(Debug, Parser)]
#[command(
    name = "huelink",
    version,
    about = "Watch and control the lights, sensors and groups of a Hue bridge",
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
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "HUELINK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Bridge host or IP address (overrides the config file)
    #[arg(long, short = 'H', env = "HUELINK_HOST", global = true)]
    pub host: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "HUELINK_OUTPUT",
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
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one id per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
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
    /// Poll the bridge and print changes until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Poll once and list lights, sensors or groups
    #[command(alias = "ls")]
    List(ListArgs),

    /// Pair with the bridge (press its link button first)
    Pair(PairArgs),

    /// Change the state of one light
    Set(SetArgs),

    /// Inspect the configuration
    Config(ConfigArgs),
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    pub duration: Option<u64>,

    /// Do not poll sensors
    #[arg(long)]
    pub no_sensors: bool,
}

// ── List ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ListArgs {
    /// What to list
    #[arg(value_enum)]
    pub kind: ListKind,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListKind {
    Lights,
    Sensors,
    Groups,
}

// ── Pair ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PairArgs {
    /// How long to wait for the link button, in seconds
    #[arg(long, default_value = "30")]
    pub wait: u64,
}

// ── Set ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("change")
        .required(true)
        .multiple(true)
        .args(["on", "off", "bri", "ct"])
))]
pub struct SetArgs {
    /// Light id or name
    pub light: String,

    /// Switch the light on
    #[arg(long, conflicts_with = "off")]
    pub on: bool,

    /// Switch the light off
    #[arg(long)]
    pub off: bool,

    /// Brightness (1-254)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=254))]
    pub bri: Option<u8>,

    /// Color temperature in mired (153-500)
    #[arg(long, value_parser = clap::value_parser!(u16).range(153..=500))]
    pub ct: Option<u16>,

    /// Fade duration in milliseconds
    #[arg(long)]
    pub transition_ms: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (credentials redacted)
    Show,
    /// Print the config file path
    Path,
}
