//! Cooperative cancellation for background work.
//!
//! A task receives a [`CancellationToken`] when it is launched and checks it
//! between units of work. [`CancelCoordinator::cancel_all`] cancels every
//! token handed out so far and starts a new generation, so tasks launched
//! afterwards are unaffected.

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
pub struct CancelCoordinator {
    current: Mutex<CancellationToken>,
}

impl CancelCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for a task about to be launched.
    pub fn token(&self) -> CancellationToken {
        self.current.lock().clone()
    }

    /// Cancel all outstanding tokens and install a fresh one.
    pub fn cancel_all(&self) {
        let previous = std::mem::take(&mut *self.current.lock());
        previous.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_all_reaches_earlier_tokens_only() {
        let coordinator = CancelCoordinator::new();
        let first = coordinator.token();
        let second = coordinator.token();

        coordinator.cancel_all();
        assert!(first.is_cancelled());
        assert!(second.is_cancelled());

        let third = coordinator.token();
        assert!(!third.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_task_exits() {
        let coordinator = CancelCoordinator::new();
        let token = coordinator.token();
        let task = tokio::spawn(async move {
            let mut steps = 0u32;
            while !token.is_cancelled() {
                steps += 1;
                tokio::task::yield_now().await;
            }
            steps
        });
        tokio::task::yield_now().await;
        coordinator.cancel_all();
        assert!(task.await.is_ok());
    }
}
