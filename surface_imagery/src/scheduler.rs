use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::CatalogErrors;

/// Worker pool for catalog image loads.
///
/// Built explicitly by the caller and handed to the catalog, so its lifetime is
/// visible: construct, submit loads, wait for ready, drop. Dropping the pool
/// lets already-submitted tasks run to completion.
pub struct LoadScheduler {
    pool: ThreadPool,
    cancel: Arc<AtomicBool>,
}

impl LoadScheduler {
    /// `num_threads == 0` lets rayon pick one thread per logical cpu.
    pub fn new(num_threads: usize) -> Result<Self, CatalogErrors> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("image-load-{i}"))
            .build()?;
        Ok(Self {
            pool,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn spawn<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.spawn(task);
    }

    /// Asks tasks that have not started yet to stop. A decode already in
    /// progress runs to completion.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    pub(crate) fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }
}
