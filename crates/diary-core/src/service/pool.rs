//! Bounded pool for PBKDF2-heavy work.
//!
//! Every legacy field costs one 100k-iteration derivation, so an entry with a
//! handful of tags costs several of them. Work runs on tokio's blocking threads
//! and at most `limit` jobs run at once; further callers wait for a permit.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::{DiaryError, Result};

#[derive(Clone)]
pub struct DerivationPool {
    permits: Arc<Semaphore>,
    limit: usize,
}

impl DerivationPool {
    /// A pool allowing `limit` concurrent jobs (at least one).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// A pool sized to the machine's available parallelism.
    pub fn with_default_limit() -> Self {
        Self::new(default_limit())
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Permits not currently held by a running job.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `job` on a blocking thread once a permit is free.
    ///
    /// No lock is held across the job; the permit is released when it ends.
    pub async fn run<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| DiaryError::Crypto(format!("derivation pool closed: {}", e)))?;

        tokio::task::spawn_blocking(move || {
            let result = job();
            drop(permit);
            result
        })
        .await
        .map_err(|e| DiaryError::Crypto(format!("derivation task failed: {}", e)))?
    }
}

impl Default for DerivationPool {
    fn default() -> Self {
        Self::with_default_limit()
    }
}

impl std::fmt::Debug for DerivationPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivationPool")
            .field("limit", &self.limit)
            .field("available", &self.available())
            .finish()
    }
}

pub fn default_limit() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_limit_is_at_least_one() {
        assert_eq!(DerivationPool::new(0).limit(), 1);
        assert!(DerivationPool::default().limit() >= 1);
    }

    #[tokio::test]
    async fn test_run_returns_job_result() {
        let pool = DerivationPool::new(2);
        let value = pool.run(|| Ok(21 * 2)).await.unwrap();
        assert_eq!(value, 42);
        let err = pool
            .run(|| -> Result<()> { Err(DiaryError::DecryptionFailed) })
            .await;
        assert!(matches!(err, Err(DiaryError::DecryptionFailed)));
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let pool = DerivationPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            let running = running.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                pool.run(move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }
}
