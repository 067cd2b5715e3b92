//! CLI command definitions for the `helpdesk` binary.
//!
//! Uses clap derive macros for argument parsing. Besides `serve`, the
//! commands cover the operator chores the HTTP surface does not expose:
//! maintaining the organization directory and minting member credentials
//! for local testing.

pub mod org;
pub mod token;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Help-desk chat service.
#[derive(Parser)]
#[command(name = "helpdesk", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to `server.port` from config).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host address to bind to (defaults to `server.host` from config).
        #[arg(long)]
        host: Option<String>,
    },

    /// Manage the organization directory.
    #[command(alias = "orgs")]
    Org {
        #[command(subcommand)]
        action: org::OrgCommand,
    },

    /// Mint a member credential signed with the configured JWT secret.
    Token {
        /// Member id to put in the `sub` claim.
        #[arg(long)]
        user: String,

        /// Role claim.
        #[arg(long)]
        role: Option<String>,

        /// Organization claim.
        #[arg(long)]
        org: Option<i64>,

        /// Lifetime in minutes.
        #[arg(long, default_value_t = 60)]
        ttl_minutes: i64,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
