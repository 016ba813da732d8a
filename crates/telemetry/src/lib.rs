//! Tracing subscriber bootstrap.

use std::io;

use bookshelf_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. Calling this more
/// than once is harmless; later calls leave the first subscriber in place.
pub fn init(settings: &TelemetrySettings) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.filter));

    let installed = match settings.log_format {
        LogFormat::Pretty => fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .with_writer(io::stdout)
            .try_init()
            .is_ok(),
        LogFormat::Json => fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .with_writer(io::stdout)
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::debug!(
            target: "bookshelf-telemetry",
            format = ?settings.log_format,
            "tracing subscriber installed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_does_not_panic() {
        let settings = TelemetrySettings::default();
        init(&settings);
        init(&TelemetrySettings {
            log_format: LogFormat::Json,
            ..settings
        });
    }
}
