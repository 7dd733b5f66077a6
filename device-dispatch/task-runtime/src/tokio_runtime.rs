// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use device_dispatch_core::{RunOutcome, WorkerRuntime};
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};
use tracing::debug;

/// Tokio blocking-pool runtime.
///
/// Units are handed to `spawn_blocking` on the runtime behind `handle` and
/// joined with `Handle::block_on`, so the dispatcher using it must be
/// driven from a thread that is not itself executing async tasks.
#[derive(Debug, Clone)]
pub struct TokioRuntime {
    handle: Handle,
}

impl TokioRuntime {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Runtime of the current tokio context.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl WorkerRuntime for TokioRuntime {
    type Handle = JoinHandle<RunOutcome>;
    type Error = JoinError;

    fn spawn<F>(&self, name: String, f: F) -> Result<Self::Handle, Self::Error>
    where
        F: FnOnce() -> RunOutcome + Send + 'static,
    {
        debug!(unit = %name, "spawning blocking task");
        Ok(self.handle.spawn_blocking(f))
    }

    fn join(&self, handle: Self::Handle) -> Result<RunOutcome, Self::Error> {
        self.handle.block_on(handle)
    }
}
