//! Interrupt handling.

use std::future::Future;
use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::warn;

/// How long finished work gets to wind down before the runtime is dropped.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Run `future` to completion on a fresh multi-threaded runtime.
///
/// Blocking tasks still running afterwards (a stdin read parked in
/// `spawn_blocking`, for one) are abandoned instead of joined, so an
/// interrupted process exits promptly.
pub fn block_on<F: Future>(future: F) -> std::io::Result<F::Output> {
    let rt = Runtime::new()?;
    let output = rt.block_on(future);
    rt.shutdown_timeout(DRAIN_TIMEOUT);
    Ok(output)
}

/// Resolve when the process is asked to stop.
///
/// Handles SIGINT (Ctrl-C) everywhere and SIGTERM on Unix. If a handler
/// cannot be installed, that signal is never observed.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => warn!("Received SIGINT, shutting down"),
        () = terminate => warn!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_block_on_abandons_parked_blocking_task() {
        let started = Instant::now();

        let value = block_on(async {
            tokio::task::spawn_blocking(|| std::thread::sleep(Duration::from_secs(3600)));
            7
        })
        .unwrap();

        assert_eq!(value, 7);
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
