//! CLI module for the account service
//!
//! - `serve`: HTTP API server
//! - `migrate`: apply or revert the PostgreSQL schema

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Account Service - user accounts and credential verification
#[derive(Parser)]
#[command(name = "account-service")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Run PostgreSQL schema migrations
    Migrate(migrate::MigrateArgs),
}

/// Load `.env`, configuration and the log subscriber
pub(crate) fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration, using defaults: {}", e);
            AppConfig::default()
        }
    };

    logging::init_logging(&config.logging);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["account-service", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve));
    }

    #[test]
    fn test_parse_migrate_revert() {
        let cli = Cli::try_parse_from(["account-service", "migrate", "--revert"]).unwrap();

        match cli.command {
            Command::Migrate(args) => assert!(args.revert),
            Command::Serve => panic!("expected migrate"),
        }
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["account-service", "ui"]).is_err());
    }
}
