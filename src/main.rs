//! Binary entrypoint for the `device-id` CLI.

use std::process::ExitCode;

use device_id_provider::AppError;

fn main() -> ExitCode {
    // A missing .env file is fine; the process environment still applies.
    let _ = dotenvy::dotenv();

    // Recording and replay are handled in commands::dispatch via DEVID_RECORD / DEVID_REPLAY.
    match device_id_provider::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::Cli(err)) => err.exit(),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
