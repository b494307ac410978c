use tokio::sync::watch;

/// Transmitter side of the cancellation signal.
///
/// The signal is level-triggered: once raised it stays raised, so tasks subscribing late still
/// observe it.
#[derive(Debug, Clone)]
pub struct ShutdownTx(watch::Sender<bool>);

impl ShutdownTx {
    /// Wraps a watch sender into a [`ShutdownTx`].
    pub fn wrap(tx: watch::Sender<bool>) -> Self {
        Self(tx)
    }

    /// Raises the signal.
    ///
    /// Returns `true` if this call raised it and `false` if it was already raised.
    pub fn shutdown(&self) -> bool {
        // `send_replace` succeeds even when no receiver is subscribed yet.
        !self.0.send_replace(true)
    }

    /// Returns `true` once the signal has been raised.
    pub fn is_shutdown(&self) -> bool {
        *self.0.borrow()
    }

    /// Creates a new receiver subscription.
    pub fn subscribe(&self) -> ShutdownRx {
        ShutdownRx(self.0.subscribe())
    }
}

/// Receiver side of the cancellation signal.
#[derive(Debug, Clone)]
pub struct ShutdownRx(watch::Receiver<bool>);

impl ShutdownRx {
    /// Returns `true` once the signal has been raised.
    pub fn is_shutdown(&self) -> bool {
        *self.0.borrow()
    }

    /// Waits until the signal is raised.
    ///
    /// Never resolves if every [`ShutdownTx`] is dropped without raising the signal. Cancel safe,
    /// so it can be used as a `tokio::select!` branch.
    pub async fn wait_for_shutdown(&mut self) {
        if self.0.wait_for(|shutdown| *shutdown).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Result of an operation that can be interrupted by the cancellation signal.
///
/// `Shutdown` hands back whatever the interrupted operation was holding.
#[derive(Debug, PartialEq)]
pub enum ShutdownResult<T, I> {
    Ok(T),
    Shutdown(I),
}

/// Creates a new, not yet raised, cancellation signal.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTx::wrap(tx), ShutdownRx(rx))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn late_subscribers_observe_a_raised_signal() {
        let (tx, _rx) = create_shutdown_channel();

        assert!(tx.shutdown());
        assert!(!tx.shutdown());

        let mut late_rx = tx.subscribe();
        assert!(late_rx.is_shutdown());
        tokio::time::timeout(Duration::from_secs(1), late_rx.wait_for_shutdown())
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_does_not_resolve_without_a_signal() {
        let (tx, mut rx) = create_shutdown_channel();
        drop(tx);

        let result = tokio::time::timeout(Duration::from_secs(5), rx.wait_for_shutdown()).await;

        assert!(result.is_err());
        assert!(!rx.is_shutdown());
    }
}
