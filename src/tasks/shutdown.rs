//! Shutdown Signal
//!
//! One-shot, broadcast-style stop signal for the TTL sweeper.

use tokio::sync::watch;

use crate::error::{CacheError, Result};

/// Creates a connected signal/listener pair.
pub fn shutdown_channel() -> (ShutdownSignal, ShutdownListener) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSignal { tx }, ShutdownListener { rx })
}

// == Shutdown Signal ==
/// Producer side. Fires at most once.
///
/// Dropping the signal without firing also releases every listener.
#[derive(Debug)]
pub struct ShutdownSignal {
    tx: watch::Sender<bool>,
}

impl ShutdownSignal {
    /// Fires the signal.
    ///
    /// Exactly one call ever succeeds, even when several threads race to
    /// fire. Every later call gets [`CacheError::SweeperStopped`].
    pub fn fire(&self) -> Result<()> {
        if self.tx.send_replace(true) {
            Err(CacheError::SweeperStopped)
        } else {
            Ok(())
        }
    }

    /// Returns true once the signal has fired.
    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }
}

// == Shutdown Listener ==
/// Consumer side, held by the sweeper task.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Resolves once the signal fires or its producer is dropped.
    ///
    /// Returns immediately if that already happened. Safe to use as a
    /// `tokio::select!` branch inside a loop.
    pub async fn recv(&mut self) {
        // Err means the producer is gone, which also means stop
        let _ = self.rx.wait_for(|fired| *fired).await;
    }
}
