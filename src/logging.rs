//! Diagnostic output: tracing setup plus the timestamped stderr line format

use std::fmt::Display;

use chrono::Utc;

/// Installs the global tracing subscriber, writing to stderr so the
/// stdout response line stays machine-readable.
///
/// Honors `RUST_LOG` when set; defaults to `info`.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Writes one timestamp-prefixed diagnostic line to stderr.
///
/// The host treats these lines as advisory; only the stdout response line
/// is machine-parsed.
pub fn log(message: impl Display) {
    eprintln!("{}", format_line(&message));
}

fn format_line(message: &impl Display) -> String {
    format!(
        "[{}] {}",
        Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
        message
    )
}
