//! CLI command definitions for the `chatbox` binary.
//!
//! Uses clap derive macros for argument parsing. Global flags control log
//! verbosity and format; subcommands either run the REST API or query the
//! speech provider directly.

pub mod voices;

use clap::{Parser, Subcommand};

/// Persona chat backend with spoken replies.
#[derive(Parser)]
#[command(name = "chatbox", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all log output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,

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
        /// Port to listen on.
        #[arg(long, short, default_value = "3000", env = "CHATBOX_PORT")]
        port: u16,

        /// Host address to bind to.
        #[arg(long, default_value = "127.0.0.1", env = "CHATBOX_HOST")]
        host: String,
    },

    /// List the English neural voices available for personas.
    Voices,
}
