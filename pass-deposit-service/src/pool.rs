// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::error;

/// Runs jobs concurrently, at most `workers` at a time.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `job` for every item and collects the results in item order.
    /// A job that panics is logged and left out.
    pub async fn run<I, F, Fut, T>(&self, items: Vec<I>, job: F) -> Vec<(I, T)>
    where
        I: Clone + std::fmt::Debug + Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let job = Arc::new(job);
        let handles: Vec<_> = items
            .into_iter()
            .map(|item| {
                let permits = Arc::clone(&self.permits);
                let job = Arc::clone(&job);
                let key = item.clone();
                let handle = tokio::spawn(async move {
                    // The semaphore is never closed.
                    let _permit = permits.acquire_owned().await.ok();
                    job(item).await
                });
                (key, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (item, handle) in handles {
            match handle.await {
                Ok(result) => results.push((item, result)),
                Err(e) => error!(?item, error = %e, "worker job did not complete"),
            }
        }
        results
    }
}
