//! Strictly ordered fire-and-forget task chain.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Runs spawned futures one after another in enqueue order.
///
/// Each enqueued future is spawned immediately but waits for its predecessor
/// before running, so callers never block while ordering still holds.
/// Must be used from within a tokio runtime.
#[derive(Default)]
pub(crate) struct TaskChain {
    tail: Mutex<Option<JoinHandle<()>>>,
}

impl TaskChain {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn enqueue<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tail = self.tail.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = tail.take();
        *tail = Some(tokio::spawn(async move {
            if let Some(previous) = previous {
                // A panicked predecessor must not stall the chain.
                let _ = previous.await;
            }
            fut.await;
        }));
    }

    /// Waits until everything enqueued so far has run.
    pub(crate) async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.enqueue(async move {
            let _ = tx.send(());
        });
        let _ = rx.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_runs_in_enqueue_order() {
        let chain = TaskChain::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for (i, delay) in [30u64, 0, 10].into_iter().enumerate() {
            let log = log.clone();
            chain.enqueue(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                log.lock().unwrap().push(i);
            });
        }
        chain.flush().await;

        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_flush_on_empty_chain_returns() {
        TaskChain::new().flush().await;
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_stall_chain() {
        let chain = TaskChain::new();
        let ran = Arc::new(Mutex::new(false));

        chain.enqueue(async { panic!("boom") });
        let flag = ran.clone();
        chain.enqueue(async move {
            *flag.lock().unwrap() = true;
        });
        chain.flush().await;

        assert!(*ran.lock().unwrap());
    }
}
