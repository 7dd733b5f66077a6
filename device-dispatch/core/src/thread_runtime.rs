// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::worker_runtime::WorkerRuntime;
use crate::RunOutcome;
use std::thread::{self, JoinHandle};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("failed to spawn unit '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unit '{name}' terminated abnormally: {message}")]
    Join { name: String, message: String },
}

/// One named OS thread per unit
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRuntime;

impl ThreadRuntime {
    pub fn new() -> Self {
        Self
    }
}

impl WorkerRuntime for ThreadRuntime {
    type Handle = JoinHandle<RunOutcome>;
    type Error = RuntimeError;

    fn spawn<F>(&self, name: String, f: F) -> Result<Self::Handle, Self::Error>
    where
        F: FnOnce() -> RunOutcome + Send + 'static,
    {
        thread::Builder::new()
            .name(name.clone())
            .spawn(f)
            .map_err(|source| RuntimeError::Spawn { name, source })
    }

    fn join(&self, handle: Self::Handle) -> Result<RunOutcome, Self::Error> {
        let name = handle.thread().name().unwrap_or("unnamed").to_string();
        handle.join().map_err(|payload| RuntimeError::Join {
            name,
            message: crate::dispatcher::panic_message(payload.as_ref()),
        })
    }
}
