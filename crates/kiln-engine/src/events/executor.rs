use crate::constants::ASYNC_WORKER_THREAD_NAME;
use crate::error_ext::ErrorContext;
use kiln_domain::error::Result;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::debug;

/// Worker pool for asynchronous observers
///
/// Observers are blocking code, so they run on the runtime's blocking pool,
/// sized by `events.async_workers`. An externally supplied runtime is used
/// as is and never shut down by the container.
pub(crate) enum Executor {
    Owned(Option<Runtime>),
    External(Handle),
}

impl Executor {
    /// Dedicated runtime with `workers` blocking threads
    pub(crate) fn owned(workers: usize) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(workers.max(1))
            .thread_name(ASYNC_WORKER_THREAD_NAME)
            .enable_all()
            .build()
            .io_context("Failed to start the asynchronous observer runtime")?;
        debug!(workers, "Asynchronous observer runtime started");
        Ok(Self::Owned(Some(runtime)))
    }

    /// Use a runtime owned by the host
    pub(crate) fn external(handle: Handle) -> Self {
        Self::External(handle)
    }

    /// Submit a blocking task
    pub(crate) fn spawn<F, R>(&self, task: F) -> Option<JoinHandle<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        match self {
            Self::Owned(Some(runtime)) => Some(runtime.spawn_blocking(task)),
            Self::Owned(None) => None,
            Self::External(handle) => Some(handle.spawn_blocking(task)),
        }
    }

    /// Stop an owned runtime without waiting for running observers
    pub(crate) fn shutdown(&mut self) {
        if let Self::Owned(runtime) = self {
            if let Some(runtime) = runtime.take() {
                runtime.shutdown_background();
                debug!("Asynchronous observer runtime stopped");
            }
        }
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
