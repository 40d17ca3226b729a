//! CLI module for RAiDesk
//!
//! - `serve`: Run the HTTP server (default)
//! - `sweep`: Purge expired entries once
//! - `clear`: Delete everything in the configured backend
//! - `check`: Verify the storage backend is reachable

use clap::{Parser, Subcommand};

pub mod data;

/// RAiDesk backend CLI
#[derive(Parser, Debug)]
#[command(name = "raidesk")]
#[command(about = "Regulatory planning backend: session and plan storage")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server (default)
    Serve,
    /// Purge expired sessions and plans once
    Sweep,
    /// Delete ALL stored sessions and plans
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Check that the storage backend is reachable
    Check,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        None | Some(Commands::Serve) => crate::server::run().await,
        Some(Commands::Sweep) => data::sweep().await,
        Some(Commands::Clear { force }) => data::clear(force).await,
        Some(Commands::Check) => data::check().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["raidesk"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["raidesk", "clear", "--force"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Clear { force: true })));

        let cli = Cli::try_parse_from(["raidesk", "clear"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Clear { force: false })));

        assert!(Cli::try_parse_from(["raidesk", "migrate"]).is_err());
    }
}
