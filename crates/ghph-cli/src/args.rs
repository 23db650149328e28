use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use ghph_core::ApplyOptions;

/// Turn a declarative project plan into GitHub milestones, epic issues,
/// child issues and Projects V2 board items.
///
/// Re-running a plan is safe: issues are matched by exact title and only
/// the missing ones are created.
#[derive(Parser)]
#[command(version, about, name = "ghph")]
pub struct Args {
    /// Path to a YAML config file. Defaults to
    /// $XDG_CONFIG_HOME/ghph/config.yaml when it exists
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// GitHub token; overrides GHPH_TOKEN and the config file
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for the ghph CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Create milestones, issues and board items from a plan
    Apply(ApplyArgs),
    /// Check a plan file without contacting GitHub
    Validate(ValidateArgs),
    /// Show the account the token authenticates as
    Whoami,
    /// Start the MCP server on stdio
    Serve,
    /// Print version information
    Version,
}

#[derive(ClapArgs)]
pub struct ApplyArgs {
    /// Plan file (YAML, or JSON with a .json extension)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Show what would be created without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl From<&ApplyArgs> for ApplyOptions {
    fn from(args: &ApplyArgs) -> Self {
        ApplyOptions {
            dry_run: args.dry_run,
        }
    }
}

#[derive(ClapArgs)]
pub struct ValidateArgs {
    /// Plan file (YAML, or JSON with a .json extension)
    #[arg(short, long)]
    pub file: PathBuf,
}
