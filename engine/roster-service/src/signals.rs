//! Signal handling for graceful shutdown

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::service::ServiceState;

const SIGNAL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Resolve the returned receiver on Ctrl+C or SIGTERM
pub fn setup_signal_handlers() -> Result<oneshot::Receiver<()>> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let terminate = Arc::new(AtomicBool::new(false));

    #[cfg(unix)]
    {
        use anyhow::Context;
        use signal_hook::consts::SIGTERM;
        signal_hook::flag::register(SIGTERM, Arc::clone(&terminate)).context("Failed to register SIGTERM handler")?;
    }

    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => info!("Ctrl+C signal received"),
                Err(e) => {
                    error!("Failed to listen for Ctrl+C signal: {}", e);
                    wait_for_flag(terminate).await;
                    info!("SIGTERM signal received");
                }
            },
            _ = wait_for_flag(Arc::clone(&terminate)) => info!("SIGTERM signal received"),
        }
        let _ = shutdown_tx.send(());
    });

    Ok(shutdown_rx)
}

/// Resolve once `flag` is set
async fn wait_for_flag(flag: Arc<AtomicBool>) {
    while !flag.load(Ordering::Relaxed) {
        tokio::time::sleep(SIGNAL_POLL_INTERVAL).await;
    }
}

/// Graceful shutdown handler
pub async fn graceful_shutdown(
    service_state: Arc<ServiceState>,
    scheduler_handle: JoinHandle<()>,
    logger_handle: JoinHandle<()>,
) -> Result<()> {
    info!("Starting graceful shutdown...");

    if let Err(e) = service_state.stop_scheduler().await {
        error!("Failed to stop UpdateScheduler: {}", e);
    }

    let shutdown_timeout = Duration::from_secs(service_state.config.service.shutdown_timeout_secs);
    match timeout(shutdown_timeout, scheduler_handle).await {
        Ok(Ok(())) => info!("UpdateScheduler stopped gracefully"),
        Ok(Err(e)) => error!("UpdateScheduler task failed: {}", e),
        Err(_) => warn!("UpdateScheduler did not stop within timeout, forcing shutdown"),
    }

    logger_handle.abort();

    if let Err(e) = service_state.shutdown().await {
        error!("Failed to shutdown service components: {}", e);
    }

    info!("Graceful shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_flag_resolves_after_flag_is_set() {
        let flag = Arc::new(AtomicBool::new(false));
        let waiter = tokio::spawn(wait_for_flag(Arc::clone(&flag)));

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(!waiter.is_finished());

        flag.store(true, Ordering::Relaxed);
        tokio::time::sleep(SIGNAL_POLL_INTERVAL * 2).await;
        assert!(waiter.is_finished());
        waiter.await.unwrap();
    }
}
