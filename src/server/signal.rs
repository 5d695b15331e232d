// Signal handling module
//
// - SIGTERM: graceful shutdown
// - SIGINT:  graceful shutdown (Ctrl+C)
//
// Other platforms only get Ctrl+C.

use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Spawn a task that notifies `shutdown` on the first termination signal.
///
/// `notify_one` stores a permit, so the accept loop sees the signal even if it is
/// not waiting at that instant.
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    logger::log_error(&format!("[Signal] Failed to register handlers: {e}"));
                    wait_for_ctrl_c(shutdown).await;
                    return;
                }
            };

        logger::log_debug(&format!(
            "[Signal] Handlers registered, process ID: {}",
            std::process::id()
        ));

        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        logger::log_info(&format!("[Signal] {name} received, shutting down"));
        shutdown.notify_one();
    });
}

#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    tokio::spawn(wait_for_ctrl_c(shutdown));
}

async fn wait_for_ctrl_c(shutdown: Arc<Notify>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            logger::log_info("[Signal] Ctrl+C received, shutting down");
            shutdown.notify_one();
        }
        Err(e) => logger::log_error(&format!("[Signal] Unable to listen for Ctrl+C: {e}")),
    }
}
