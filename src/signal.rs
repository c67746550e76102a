//! Termination signals.

use std::future::Future;
use std::io;

/// Wait for `listen` to report a signal.
///
/// A listener that could not be installed is logged and never fires, so the
/// engine keeps running instead of stopping at once.
pub async fn hold_on_error<F>(name: &str, listen: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = listen.await {
        log::warn!("[sys]failed to listen for {}: {}", name, e);
        std::future::pending::<()>().await;
    }
}

/// Resolve on ctrl-c, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = hold_on_error("ctrl-c", tokio::signal::ctrl_c());

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let term = hold_on_error("SIGTERM", async {
            signal(SignalKind::terminate())?.recv().await;
            Ok::<_, io::Error>(())
        });

        tokio::select! {
            _ = ctrl_c => {},
            _ = term => {},
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;

    log::info!("[engine]received termination request");
}
