//! Clap derive structures for the `bigip` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// bigip -- drive a BIG-IP load balancer the way the provisioning layer does
#[derive(Debug, Parser)]
#[command(
    name = "bigip",
    version,
    about = "Drive BIG-IP load balancer appliances from the command line",
    long_about = "Runs load-balancer driver commands against a BIG-IP appliance.\n\n\
        Guest VLAN association and load-balancer rules are read from JSON\n\
        files and converged idempotently; usage reports per-address traffic.",
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
    /// Appliance profile to use
    #[arg(long, short = 'p', env = "BIGIP_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Appliance management address (overrides profile)
    #[arg(long, short = 'H', env = "BIGIP_HOST", global = true)]
    pub host: Option<String>,

    /// Appliance username (overrides profile)
    #[arg(long, short = 'u', env = "BIGIP_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "BIGIP_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "BIGIP_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "BIGIP_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the appliance accepts a login
    Ready,

    /// Send a maintenance notification
    Maintain,

    /// Associate or release guest VLANs from a JSON file
    #[command(name = "ip-assoc")]
    IpAssoc(FileArgs),

    /// Apply load-balancer rules from a JSON file
    #[command(name = "lb-config", alias = "lb")]
    LbConfig(FileArgs),

    /// Report per-address traffic counters
    Usage,

    /// Show the startup announcement for the configured appliance
    Startup,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FileArgs {
    /// Path to the JSON command payload (`-` for stdin)
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,
    /// Show the effective configuration (passwords masked)
    Show,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
