//! # Cross-platform OS signal handling.
//!
//! Provides [`ShutdownSignal`]: listeners are registered by [`ShutdownSignal::install`]
//! (before any worker starts) and [`ShutdownSignal::recv`] completes on the first
//! termination signal.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//!
//! **Other platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

/// Registered termination-signal listeners.
pub(crate) struct ShutdownSignal {
    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
}

impl ShutdownSignal {
    /// Registers the listeners.
    ///
    /// Returns `Err` if signal registration fails. Must be called inside a tokio runtime.
    #[cfg(unix)]
    pub(crate) fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    /// Registers the listeners.
    #[cfg(not(unix))]
    pub(crate) fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// Waits for the first termination signal.
    #[cfg(unix)]
    pub(crate) async fn recv(mut self) {
        tokio::select! {
            _ = self.sigint.recv()  => {},
            _ = self.sigterm.recv() => {},
        }
    }

    /// Waits for the first termination signal.
    #[cfg(not(unix))]
    pub(crate) async fn recv(self) {
        let _ = tokio::signal::ctrl_c().await;
    }
}
