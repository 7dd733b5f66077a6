// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod work_set;
pub use work_set::WorkSet;

mod device;
pub use device::{DeviceId, DeviceList, Placement};

pub mod partition;
pub use partition::{partition, Assignment, Partition};

mod progress;
pub use progress::{ProgressCounter, ProgressSnapshot};

mod worker;
pub use worker::{Replica, ReplicaError, RunOutcome, WorkerPrototype};

pub mod worker_runtime;
pub use worker_runtime::WorkerRuntime;

pub mod thread_runtime;
pub use thread_runtime::{RuntimeError, ThreadRuntime};

mod dispatch_error;
pub use dispatch_error::{DispatchError, DispatchResult, ExecutionFault, ExecutionFaults};

mod dispatcher;
pub use dispatcher::{dispatch_on_threads, Dispatcher};
