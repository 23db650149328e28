//! ghph CLI application
//!
//! Applies project plans to GitHub issues and Projects V2 boards, either
//! from the command line or as an MCP server.

mod args;
mod cli;
mod mcp;
mod renderer;

use anyhow::Result;
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use ghph_core::ConfigBuilder;
use log::debug;
use renderer::TerminalRenderer;
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        config,
        token,
        no_color,
        command,
    } = Args::parse();

    let config = ConfigBuilder::new()
        .with_config_path(config)
        .with_token(token);
    let cli = Cli::new(config, TerminalRenderer::new(!no_color));

    debug!("ghph started");

    match command {
        Apply(args) => cli.apply(&args).await,
        Validate(args) => cli.validate(&args),
        Whoami => cli.whoami().await,
        Serve => cli.serve().await,
        Version => {
            cli.version();
            Ok(())
        }
    }
}
