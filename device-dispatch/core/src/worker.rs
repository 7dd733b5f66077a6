// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{Partition, Placement};

/// Failure cause reported by a replica.
pub type ReplicaError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of running one replica over its partition.
pub type RunOutcome = Result<(), ReplicaError>;

/// Trait for device-bound worker instances
pub trait Replica: Send + 'static {
    /// Process every work item of the partition, synchronously
    fn run(&mut self, partition: Partition) -> RunOutcome;
}

/// Trait for creating replicas of a worker
/// Takes `&self` so one prototype can serve any number of dispatches
pub trait WorkerPrototype: Sync {
    type Replica: Replica;

    /// Create a replica bound to the given placement
    fn place_on(&self, placement: &Placement) -> Result<Self::Replica, ReplicaError>;
}

impl<F, R> WorkerPrototype for F
where
    F: Fn(&Placement) -> Result<R, ReplicaError> + Sync,
    R: Replica,
{
    type Replica = R;

    fn place_on(&self, placement: &Placement) -> Result<R, ReplicaError> {
        (self)(placement)
    }
}
