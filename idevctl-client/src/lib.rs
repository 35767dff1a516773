pub mod clients;
pub mod config;
pub mod devices;
pub mod error;
pub mod profile;
pub mod syslog;
pub mod tui;
pub mod util;

// === CLI entrypoint ===
pub mod cli;

/// Entrypoint used by `main.rs` and tests to run the full CLI.
pub async fn run_cli() -> anyhow::Result<()> {
    cli::cli().await
}
