use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Pick the filter directive when `RUST_LOG` is not set.
pub fn default_directive(verbose: bool, log_level: &str) -> String {
    if verbose {
        "debug".to_string()
    } else {
        log_level.to_string()
    }
}

pub fn init_tracing(verbose: bool, log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose, log_level)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries relayed device output, logs stay on stderr
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .without_time();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
