//! Cooperative shutdown for the simulation's long-lived tasks. The teacher's
//! own `express_tasks::ShutdownGuard` polls a `should_shutdown()` flag
//! rather than using a cancellation token; this crate keeps the teacher's
//! name and "every long-lived task holds a clone" shape but swaps the
//! polled-flag mechanism for `tokio_util::sync::CancellationToken`'s
//! `cancelled().await`, the pattern used for the same purpose elsewhere in
//! the retrieval pack (e.g. `zircuit-labs-zr-kona-public`,
//! `lambdaclass-ethrex`) — a better fit here since every task already waits
//! in a `tokio::select!` rather than polling on an interval.

use tokio_util::sync::CancellationToken;

/// Cloneable shutdown handle. Every long-lived task (miner loop, aggregator
/// loop, gossip loop) holds a clone and races `cancelled()` against its
/// normal event sources in a `tokio::select!`.
#[derive(Clone, Default)]
pub struct ShutdownGuard {
    token: CancellationToken,
}

impl ShutdownGuard {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Signal every clone of this guard to stop. Idempotent.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once `shutdown()` has been called on this guard or any of
    /// its clones. Intended for use inside `tokio::select!` branches.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_is_observed_by_clones() {
        let guard = ShutdownGuard::new();
        let clone = guard.clone();
        assert!(!clone.is_shutdown());
        guard.shutdown();
        assert!(clone.is_shutdown());
        clone.cancelled().await;
    }

    #[tokio::test]
    async fn child_guard_cancelled_independently_of_parent() {
        let parent = ShutdownGuard::new();
        let child = parent.child();
        child.shutdown();
        assert!(child.is_shutdown());
        assert!(!parent.is_shutdown());
    }
}
