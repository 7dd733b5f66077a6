// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::RunOutcome;

/// Trait for abstracting how concurrent units are executed (threads, task pools)
pub trait WorkerRuntime: Send + Sync {
    type Handle: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Launch a unit; `name` identifies it in logs and thread names
    fn spawn<F>(&self, name: String, f: F) -> Result<Self::Handle, Self::Error>
    where
        F: FnOnce() -> RunOutcome + Send + 'static;

    /// Block until the unit has finished and return what it produced
    fn join(&self, handle: Self::Handle) -> Result<RunOutcome, Self::Error>;
}
