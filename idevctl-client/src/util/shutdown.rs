//! Process wide interrupt signal.
//!
//! Ctrl+C cancels [`SHUTDOWN`]; long running operations race a child token
//! so they can be cancelled individually in tests.

use once_cell::sync::Lazy;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Cancelled once the operator presses Ctrl+C.
pub static SHUTDOWN: Lazy<CancellationToken> = Lazy::new(CancellationToken::new);

/// Spawn the Ctrl+C listener. Must be called from within the runtime.
pub fn listen_for_ctrl_c() {
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received");
            SHUTDOWN.cancel();
        }
    });
}

/// A token cancelled together with [`SHUTDOWN`].
pub fn interrupt_token() -> CancellationToken {
    SHUTDOWN.child_token()
}
