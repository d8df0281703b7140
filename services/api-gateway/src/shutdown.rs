//! Graceful Shutdown Module
//!
//! The server stops accepting connections on SIGINT/SIGTERM, then gets at most
//! the configured drain timeout to finish in-flight requests.

use std::future::Future;
use std::time::Duration;

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Shutdown coordinator for graceful termination
#[derive(Debug)]
pub struct ShutdownCoordinator {
    shutdown_tx: watch::Sender<bool>,
}

impl ShutdownCoordinator {
    /// Creates a new shutdown coordinator
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self { shutdown_tx }
    }

    /// Gets a shutdown receiver
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.shutdown_tx.subscribe(),
        }
    }

    /// Signals every subscriber. Idempotent.
    pub fn trigger(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Whether shutdown has been signalled
    pub fn is_triggered(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Shutdown signal receiver
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Waits for shutdown signal
    pub async fn recv(mut self) {
        // A dropped coordinator also means shutdown
        let _ = self.receiver.wait_for(|triggered| *triggered).await;
    }
}

/// Waits for SIGTERM or SIGINT
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}

/// Runs a server until `trigger` fires, then drains it for at most
/// `drain_timeout`.
///
/// The server must stop accepting work once `coordinator`'s signal fires.
pub async fn run_until<F, T, E>(
    server: F,
    trigger: T,
    coordinator: &ShutdownCoordinator,
    drain_timeout: Duration,
) -> Result<(), E>
where
    F: Future<Output = Result<(), E>> + Send,
    T: Future<Output = ()> + Send,
    E: std::fmt::Display,
{
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            if let Err(e) = &result {
                error!(error = %e, "Server error");
            }
            return result;
        }
        () = trigger => {
            info!("Shutdown signal received");
        }
    }

    coordinator.trigger();

    match tokio::time::timeout(drain_timeout, server).await {
        Ok(result) => {
            info!("In-flight requests drained");
            result
        }
        Err(_) => {
            warn!(timeout_secs = drain_timeout.as_secs(), "Shutdown timeout reached, abandoning in-flight requests");
            Ok(())
        }
    }
}

/// Runs a server with graceful shutdown support
pub async fn run_with_graceful_shutdown<F, E>(
    server: F,
    coordinator: &ShutdownCoordinator,
    drain_timeout: Duration,
) -> Result<(), E>
where
    F: Future<Output = Result<(), E>> + Send,
    E: std::fmt::Display,
{
    run_until(server, wait_for_signal(), coordinator, drain_timeout).await
}
