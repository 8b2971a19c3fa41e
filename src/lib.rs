//! Core library for provisioning a reinstall-surviving device identifier.
//!
//! The identifier is stored outside the app sandbox, either as a well-known
//! entry in shared storage or in a directory the user grants. See
//! [`provider::DeviceIdProvider`] for the entry point.

pub mod adapters;
pub mod backend;
pub mod cassette;
pub mod cli;
pub mod codec;
pub mod commands;
pub mod config;
pub mod consent;
pub mod context;
pub mod error;
pub mod logging;
pub mod ports;
pub mod provider;

#[cfg(test)]
mod testing;

use clap::Parser;

pub use codec::DeviceId;
pub use error::{AppError, ErrorCode, ProvisionError};
pub use provider::{DeviceIdCallback, DeviceIdProvider};

/// Run the CLI with the provided arguments.
///
/// Configuration comes from the environment; the command's output goes to
/// stdout.
///
/// # Errors
///
/// Returns an error when argument parsing, configuration or the command fails.
pub fn run<I, T>(args: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args)?;
    let config = config::ProviderConfig::from_env()?;
    logging::init(config.log_level);

    let output = commands::dispatch(cli.command, &config)?;
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::error::AppError;

    #[test]
    fn run_errors_on_unknown_subcommand() {
        let result = run(["device-id", "unknown"]);
        assert!(matches!(result, Err(AppError::Cli(_))));
    }

    #[test]
    fn run_errors_without_subcommand() {
        assert!(run(["device-id"]).is_err());
    }
}
