//! Command dispatch and handlers.

pub mod get;
pub mod peek;
pub mod status;

use tracing::debug;

use crate::adapters::live::consent::TerminalConsentSurface;
use crate::cli::Command;
use crate::config::ProviderConfig;
use crate::context::ServiceContext;
use crate::error::AppError;
use crate::provider::DeviceIdProvider;

/// Dispatch a parsed command to its handler and return what it printed.
///
/// When `DEVID_REPLAY` is set, consent decisions and identifiers come from
/// that cassette. Otherwise, when `DEVID_RECORD` is set, they are recorded
/// to it.
///
/// # Errors
///
/// Returns an error if the context cannot be built or the command fails.
pub fn dispatch(command: Command, config: &ProviderConfig) -> Result<String, AppError> {
    let ctx = context_for(config)?;
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(dispatch_with_context(command, ctx, config))
}

fn context_for(config: &ProviderConfig) -> Result<ServiceContext, AppError> {
    if let Some(path) = &config.replay {
        debug!(path = %path.display(), "replaying cassette");
        return Ok(ServiceContext::replaying(config, path)?);
    }
    if let Some(path) = &config.record {
        debug!(path = %path.display(), "recording cassette");
        return Ok(ServiceContext::recording(config, path));
    }
    Ok(ServiceContext::live(config))
}

/// Dispatch a command with the given service context.
async fn dispatch_with_context(
    command: Command,
    mut ctx: ServiceContext,
    config: &ProviderConfig,
) -> Result<String, AppError> {
    if let Some(requests) = ctx.take_consent_requests() {
        tokio::spawn(TerminalConsentSurface::stdin().serve(requests));
    }
    let provider = DeviceIdProvider::new(&ctx, config);

    match command {
        Command::Get => get::run(&provider).await,
        Command::Peek => Ok(peek::run(&provider)),
        Command::Status => Ok(status::run(&ctx, config, &provider)),
    }
}
