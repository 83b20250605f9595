//! Shutdown coordination for the server.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::lifecycle::signals::Signal;

/// Why a running server was unblocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// An OS termination signal arrived.
    Signal(Signal),
    /// The listener task ended on its own (bind/accept failure or drained).
    ListenerExited,
    /// Cancelled programmatically through a handle or `stop`.
    Requested,
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownCause::Signal(signal) => write!(f, "signal {signal}"),
            ShutdownCause::ListenerExited => f.write_str("listener exited"),
            ShutdownCause::Requested => f.write_str("cancellation requested"),
        }
    }
}

/// One-shot cancellation token shared by every producer and the waiting `run`.
///
/// The first `trigger` records its cause; every later trigger is ignored, so
/// concurrent producers unblock waiters exactly once.
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<Option<ShutdownCause>>>,
}

impl Shutdown {
    /// Create a new, untriggered token.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Trigger the token. Returns `true` if this call recorded the cause.
    pub fn trigger(&self, cause: ShutdownCause) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(cause);
            true
        })
    }

    /// The recorded cause, if the token has fired.
    pub fn cause(&self) -> Option<ShutdownCause> {
        *self.tx.borrow()
    }

    pub fn is_triggered(&self) -> bool {
        self.cause().is_some()
    }

    /// Wait until the token fires and return the winning cause.
    pub async fn wait(&self) -> ShutdownCause {
        let mut rx = self.tx.subscribe();
        let cause = rx.wait_for(Option::is_some).await.ok().and_then(|cause| *cause);
        match cause {
            Some(cause) => cause,
            // The sender lives as long as `self`, so the channel cannot close here.
            None => std::future::pending().await,
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_first_trigger_wins() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());

        assert!(shutdown.trigger(ShutdownCause::ListenerExited));
        assert!(!shutdown.trigger(ShutdownCause::Signal(Signal::Terminate)));
        assert!(!shutdown.trigger(ShutdownCause::Requested));

        assert_eq!(shutdown.cause(), Some(ShutdownCause::ListenerExited));
    }

    #[tokio::test]
    async fn test_wait_after_trigger_returns_immediately() {
        let shutdown = Shutdown::new();
        shutdown.trigger(ShutdownCause::Requested);

        let cause = tokio::time::timeout(Duration::from_millis(100), shutdown.wait())
            .await
            .unwrap();
        assert_eq!(cause, ShutdownCause::Requested);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_triggers_unblock_once() {
        let shutdown = Shutdown::new();
        let waiter = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { shutdown.wait().await })
        };

        let producers: Vec<_> = [
            ShutdownCause::Signal(Signal::Interrupt),
            ShutdownCause::ListenerExited,
            ShutdownCause::Requested,
        ]
        .into_iter()
        .map(|cause| {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { shutdown.trigger(cause) })
        })
        .collect();

        let mut winners = 0;
        for producer in producers {
            if producer.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);

        let cause = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(Some(cause), shutdown.cause());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ShutdownCause::Signal(Signal::Hangup).to_string(),
            "signal SIGHUP"
        );
        assert_eq!(ShutdownCause::ListenerExited.to_string(), "listener exited");
    }
}
