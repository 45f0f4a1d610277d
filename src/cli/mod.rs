//! CLI module for Plantworks
//!
//! - `serve`: Start the HTTP server
//! - `ask`: Run a single turn from the terminal

use clap::{Parser, Subcommand};

pub mod ask;

/// Plantworks plant assistant CLI
#[derive(Parser, Debug)]
#[command(name = "plantworks")]
#[command(about = "Multi-agent plant assistant")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Listen host (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Listen port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Ask a single question
    Ask {
        /// The question
        query: String,
        /// Session id
        #[arg(long, short)]
        session: Option<String>,
        /// User id
        #[arg(long, default_value = "cli")]
        user: String,
        /// Print the full turn as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve { host, port }) => crate::server::run(host, port).await,
        Some(Commands::Ask {
            query,
            session,
            user,
            json,
        }) => ask::run(&query, session, &user, json).await,
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["plantworks", "serve", "--port", "9000"]);
        match cli.command {
            Some(Commands::Serve { host, port }) => {
                assert!(host.is_none());
                assert_eq!(port, Some(9000));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from(["plantworks", "ask", "What is a rose?", "--session", "s-1"]);
        match cli.command {
            Some(Commands::Ask {
                query,
                session,
                user,
                json,
            }) => {
                assert_eq!(query, "What is a rose?");
                assert_eq!(session.as_deref(), Some("s-1"));
                assert_eq!(user, "cli");
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
