//! Graceful shutdown wiring.

use tokio_util::sync::CancellationToken;

/// Install the Ctrl+C handler.
///
/// The first Ctrl+C cancels the returned token so in-flight work can finish
/// and commit; a second Ctrl+C force-quits.
pub(crate) fn install() -> CancellationToken {
    let token = CancellationToken::new();
    let handle = token.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");

        tracing::warn!("Shutdown requested, finishing current operations");
        eprintln!("\nShutdown requested, finishing current operations...");
        eprintln!("Press Ctrl+C again to force quit.");
        handle.cancel();

        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install second Ctrl+C handler");
        eprintln!("Force quit!");
        std::process::exit(130);
    });

    token
}
