//! CLI argument definitions.

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `device-id`.
#[derive(Debug, Parser)]
#[command(name = "device-id", version, about = "Provision a reinstall-surviving device identifier")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the device id, creating it (and asking for consent) if needed.
    Get,
    /// Print the device id only if it is already stored.
    Peek,
    /// Show the platform level, selected backend and stored state.
    Status,
}
