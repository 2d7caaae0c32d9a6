//! Command-line interface for Fanbroj.
//!
//! Without a subcommand the binary runs the daemon.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::DayMode;

/// Fanbroj - streaming catalog and subscription backend
#[derive(Parser)]
#[command(name = "fanbroj")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web API and background scheduler
    #[command(alias = "-d", alias = "--daemon")]
    Daemon,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Insert default categories, ad slots and leagues
    Seed,

    /// Run one background job now
    Job {
        /// rotate-free-movie, trial-expiry, match-reminders,
        /// expire-subscriptions or sync-fixtures
        name: String,
    },

    /// Pull fixtures from API-Football
    #[command(alias = "sync")]
    SyncFixtures {
        #[arg(long, value_enum, default_value_t = SyncMode::All)]
        mode: SyncMode,
    },

    /// Mark subscriptions past their expiry as expired
    ExpireSubscriptions,

    /// Manage the admin account
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Print the admin API key
    ApiKey {
        #[arg(long, default_value = crate::constants::auth::DEFAULT_ADMIN_USERNAME)]
        username: String,
    },
    /// Replace the admin API key with a new random one
    #[command(alias = "regen")]
    RegenerateKey {
        #[arg(long, default_value = crate::constants::auth::DEFAULT_ADMIN_USERNAME)]
        username: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SyncMode {
    Yesterday,
    Today,
    Tomorrow,
    All,
}

impl SyncMode {
    /// `None` means every day.
    #[must_use]
    pub const fn day(self) -> Option<DayMode> {
        match self {
            Self::Yesterday => Some(DayMode::Yesterday),
            Self::Today => Some(DayMode::Today),
            Self::Tomorrow => Some(DayMode::Tomorrow),
            Self::All => None,
        }
    }
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_sync_mode() {
        let cli = Cli::try_parse_from(["fanbroj", "sync-fixtures", "--mode", "today"]).unwrap();
        match cli.command {
            Some(Commands::SyncFixtures { mode }) => assert_eq!(mode.day(), Some(DayMode::Today)),
            _ => panic!("expected sync-fixtures"),
        }
    }

    #[test]
    fn test_admin_username_defaults() {
        let cli = Cli::try_parse_from(["fanbroj", "admin", "api-key"]).unwrap();
        match cli.command {
            Some(Commands::Admin {
                command: AdminCommands::ApiKey { username },
            }) => assert_eq!(username, "admin"),
            _ => panic!("expected admin api-key"),
        }
    }

    #[test]
    fn test_no_subcommand_is_daemon() {
        let cli = Cli::try_parse_from(["fanbroj"]).unwrap();
        assert!(cli.command.is_none());
    }
}
