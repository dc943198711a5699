//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{
    HistoryCommand, ListCommand, RenderCommand, ResolveCommand, RunCommand, ValidateCommand,
};

/// Deployment descriptor tool: proxy route tables and CI pipeline runs
#[derive(Debug, Parser, Clone)]
#[command(name = "deployctl")]
#[command(author = "Deployctl Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Route-table and pipeline tool for deployment descriptors", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a pipeline
    Run(RunCommand),

    /// Validate a deployment descriptor
    Validate(ValidateCommand),

    /// Inspect the proxy route table
    #[command(subcommand)]
    Routes(RoutesCommand),

    /// List pipelines with recorded runs
    List(ListCommand),

    /// Show run history
    History(HistoryCommand),
}

/// Route table subcommands
#[derive(Debug, Subcommand, Clone)]
pub enum RoutesCommand {
    /// Resolve a request path against the route table
    Resolve(ResolveCommand),

    /// Render the descriptor to an nginx configuration
    Render(RenderCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

use std::ffi::OsString;
