//! Detached background tasks.
//!
//! Cache writes and stale-while-revalidate refreshes run here, off the
//! response path. Nothing awaits them except [`PendingWrites::settle`], which
//! shutdown and tests use to drain outstanding work.

use std::future::Future;
use std::sync::Mutex;

use tokio::task::JoinSet;

#[derive(Debug, Default)]
pub struct PendingWrites {
    tasks: Mutex<JoinSet<()>>,
}

impl PendingWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a task and detach it from the caller.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    /// Wait until every spawned task, including ones spawned meanwhile, has finished.
    pub async fn settle(&self) {
        loop {
            let mut batch = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner()));
            if batch.is_empty() {
                return;
            }
            while let Some(result) = batch.join_next().await {
                if let Err(e) = result {
                    tracing::debug!(error = %e, "background task did not complete");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_settle_waits_for_tasks() {
        let writes = PendingWrites::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let counter = counter.clone();
            writes.spawn(async move {
                tokio::task::yield_now().await;
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        writes.settle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_settle_covers_nested_spawns() {
        let writes = Arc::new(PendingWrites::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let inner_writes = writes.clone();
        let inner_counter = counter.clone();
        writes.spawn(async move {
            inner_writes.spawn(async move {
                inner_counter.fetch_add(1, Ordering::SeqCst);
            });
        });

        writes.settle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_settle_empty() {
        PendingWrites::new().settle().await;
    }
}
