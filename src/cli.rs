//! Command-line surface. With no subcommand the interactive console starts.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Admin console for document-grounded agents
#[derive(Parser, Debug)]
#[command(name = "agentdesk", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Tui)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive console (default)
    Tui,
    /// List agents and their readiness
    #[command(alias = "ls")]
    List,
    /// Create an agent and process its files
    Create {
        /// Agent name
        name: String,
        /// Persona prompt for the agent
        #[arg(short, long, default_value = "")]
        persona: String,
        /// PDFs to upload after the agent exists
        files: Vec<PathBuf>,
    },
    /// Add files to an agent and process them
    Upload {
        /// Agent name
        name: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Follow processing still running for an agent
    Status {
        /// Agent name
        name: String,
    },
    /// Delete an agent
    #[command(alias = "rm")]
    Delete {
        /// Agent name
        name: String,
    },
    /// Write the default config/console.toml
    Init,
}
