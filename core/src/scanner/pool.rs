//! Semaphore-gated task spawner.
//!
//! A permit is taken *before* a task is spawned and released when it finishes, so no
//! more than `capacity` tasks are ever alive at once. Results are drained in one place
//! after the last task was submitted; tasks never see each other's output.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct BoundedPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl BoundedPool {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Runs `task` for every item and returns the outputs in completion order.
    ///
    /// A task that panics is logged and left out of the result.
    pub async fn run<I, F, Fut, T>(&self, items: I, task: F) -> Vec<T>
    where
        I: IntoIterator,
        F: Fn(I::Item) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let mut tasks: JoinSet<T> = JoinSet::new();

        for item in items {
            let permit = match Arc::clone(&self.permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    warn!("Worker pool closed early: {e}");
                    break;
                }
            };
            let fut = task(item);
            tasks.spawn(async move {
                let _permit = permit;
                fut.await
            });
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(output) => results.push(output),
                Err(e) => warn!("Worker task failed: {e}"),
            }
        }
        results
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
