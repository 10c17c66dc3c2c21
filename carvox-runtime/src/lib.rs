use anyhow::Result;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

/// Tokio runtime that drives one carvox lookup from start to finish.
///
/// The lookup is strictly sequential, so the runtime runs on the calling
/// thread instead of spawning a worker pool.
pub struct CarvoxRuntime {
    runtime: Runtime,
}

impl CarvoxRuntime {
    /// Build a current-thread runtime with IO and timers enabled.
    ///
    /// ```
    /// use carvox_runtime::CarvoxRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = CarvoxRuntime::build("doctest-runtime").expect("runtime builds");
    /// let value = runtime.block_on(async { 2 + 2 });
    /// assert_eq!(value, 4);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn build(thread_name: &str) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .thread_name(thread_name)
            .build()?;
        Ok(Self { runtime })
    }

    /// Run a future to completion on the runtime.
    ///
    /// ```
    /// use carvox_runtime::CarvoxRuntime;
    ///
    /// let runtime = CarvoxRuntime::build("block-on-example").unwrap();
    /// let result = runtime.block_on(async {
    ///     tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    ///     "done"
    /// });
    /// assert_eq!(result, "done");
    /// ```
    pub fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Shut the runtime down, waiting at most `graceful` for blocking tasks.
    pub fn shutdown(self, graceful: Duration) {
        self.runtime.shutdown_timeout(graceful);
    }
}
