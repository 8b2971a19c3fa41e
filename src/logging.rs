//! Log subscriber setup for the binary.

use tracing::Level;

/// Installs a stderr fmt subscriber capped at `level`.
///
/// Stdout carries command output only. Calling this again after a
/// subscriber is installed does nothing.
pub fn init(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init(Level::WARN);
        init(Level::DEBUG);
        tracing::warn!("logging initialised");
    }
}
