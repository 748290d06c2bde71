// Shutdown signal handling
//
// SIGTERM and SIGINT both request a graceful stop: the accept loop stops
// taking new connections and in-flight requests are drained.

use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{error, info};

/// Register shutdown signal handlers. The returned `Notify` carries a permit
/// once a shutdown signal arrives.
#[cfg(unix)]
pub fn shutdown_signal() -> Arc<Notify> {
    use tokio::signal::unix::{signal, SignalKind};

    let notify = Arc::new(Notify::new());
    let tx = Arc::clone(&notify);

    tokio::spawn(async move {
        let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
            error!("failed to register SIGTERM handler");
            return;
        };
        let Ok(mut sigint) = signal(SignalKind::interrupt()) else {
            error!("failed to register SIGINT handler");
            return;
        };

        tokio::select! {
            _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
            _ = sigint.recv() => info!("SIGINT received, shutting down"),
        }

        tx.notify_one();
    });

    notify
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn shutdown_signal() -> Arc<Notify> {
    let notify = Arc::new(Notify::new());
    let tx = Arc::clone(&notify);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, shutting down");
            tx.notify_one();
        }
    });

    notify
}
