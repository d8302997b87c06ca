// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded-concurrency task pool with shared state.
//!
//! Tasks never return values through the pool. Whatever a task wants to
//! report it writes into the shared state under [`PoolHandle::lock`], and
//! the owner reads it back from [`WorkerPool::wait`] once every task is done.

use parking_lot::{Mutex, MutexGuard};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Concurrency ceiling used when none is configured.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Access to the pool's shared state from inside a task.
pub struct PoolHandle<S> {
    state: Arc<Mutex<S>>,
}

impl<S> PoolHandle<S> {
    /// Lock the shared state. Hold the guard only for the mutation itself.
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.state.lock()
    }
}

impl<S> Clone for PoolHandle<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

/// Runs submitted tasks with at most `max_concurrency` executing at once.
pub struct WorkerPool<S> {
    permits: Arc<Semaphore>,
    state: Arc<Mutex<S>>,
    tasks: JoinSet<()>,
}

impl<S: Default + Send + 'static> WorkerPool<S> {
    /// Create a pool. A ceiling of 0 is treated as 1.
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrency)),
            state: Arc::new(Mutex::new(S::default())),
            tasks: JoinSet::new(),
        }
    }

    /// Number of submitted tasks that have not been reaped yet.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Submit a task. Returns immediately; the task starts once a slot frees up.
    pub fn spawn<F, Fut>(&mut self, task: F)
    where
        F: FnOnce(PoolHandle<S>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let handle = PoolHandle {
            state: Arc::clone(&self.state),
        };
        self.tasks.spawn(async move {
            // The semaphore is owned by the pool and never closed
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            task(handle).await;
        });
    }

    /// Wait for every submitted task, then hand back the shared state.
    pub async fn wait(mut self) -> S {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "pool task did not complete");
            }
        }
        let mut state = self.state.lock();
        std::mem::take(&mut *state)
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
