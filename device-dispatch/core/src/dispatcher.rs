// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::partition::{partition, Assignment};
use crate::worker_runtime::WorkerRuntime;
use crate::{
    DeviceList, DispatchError, DispatchResult, ExecutionFault, ExecutionFaults, Partition,
    Replica, ReplicaError, RunOutcome, ThreadRuntime, WorkerPrototype,
};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Fault order for units whose failure was never observed by the unit itself.
const UNORDERED: usize = usize::MAX;

#[derive(Debug, thiserror::Error)]
#[error("replica panicked: {0}")]
struct ReplicaPanicked(String);

/// Dispatcher replicates a worker onto each assigned device and runs the
/// replicas side by side, returning once every one of them has stopped
pub struct Dispatcher<R: WorkerRuntime = ThreadRuntime> {
    runtime: R,
}

impl Dispatcher<ThreadRuntime> {
    pub fn on_threads() -> Self {
        Self::new(ThreadRuntime)
    }
}

impl<R: WorkerRuntime> Dispatcher<R> {
    pub fn new(runtime: R) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Partitions `item_count` items over `devices` and dispatches the result
    pub fn process<P: WorkerPrototype>(
        &self,
        item_count: usize,
        devices: &DeviceList,
        prototype: &P,
    ) -> DispatchResult {
        let assignments = partition(item_count, devices);
        info!(
            items = item_count,
            devices = devices.len(),
            units = assignments.len(),
            "partitioned work set"
        );
        self.dispatch(prototype, &assignments)
    }

    /// Runs one replica per assignment and waits for all of them.
    ///
    /// Every replica is placed before any of them runs, so a placement
    /// failure means no work was attempted. A single assignment runs inline
    /// on the calling thread. Failed replicas never stop their siblings;
    /// their faults are collected and reported together after the join.
    pub fn dispatch<P: WorkerPrototype>(
        &self,
        prototype: &P,
        assignments: &[Assignment],
    ) -> DispatchResult {
        if assignments.is_empty() {
            debug!("no assignments, nothing to dispatch");
            return Ok(());
        }

        let mut replicas = place_replicas(prototype, assignments)?;

        if replicas.len() == 1 {
            if let Some((assignment, replica)) = replicas.pop() {
                debug!(placement = %assignment.placement, "single assignment, running inline");
                return run_inline(assignment, replica);
            }
        }

        self.run_concurrently(replicas)
    }

    fn run_concurrently<Rep: Replica>(&self, replicas: Vec<(&Assignment, Rep)>) -> DispatchResult {
        info!(units = replicas.len(), "launching replicas");

        let fault_clock = Arc::new(AtomicUsize::new(0));
        let mut faults: Vec<(usize, ExecutionFault)> = Vec::new();
        let mut launched = Vec::with_capacity(replicas.len());

        for (assignment, mut replica) in replicas {
            let name = format!("dispatch-{}", assignment.placement);
            let fault_order = Arc::new(AtomicUsize::new(UNORDERED));

            let unit_clock = Arc::clone(&fault_clock);
            let unit_order = Arc::clone(&fault_order);
            let partition = assignment.partition;
            let unit = move || {
                let outcome = run_guarded(&mut replica, partition);
                if outcome.is_err() {
                    unit_order.store(unit_clock.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
                }
                outcome
            };

            match self.runtime.spawn(name, unit) {
                Ok(handle) => {
                    debug!(
                        placement = %assignment.placement,
                        partition = %partition,
                        "replica launched"
                    );
                    launched.push((assignment, handle, fault_order));
                }
                Err(e) => {
                    error!(placement = %assignment.placement, "failed to launch replica: {}", e);
                    let order = fault_clock.fetch_add(1, Ordering::SeqCst);
                    faults.push((order, fault(assignment, Box::new(e))));
                }
            }
        }

        for (assignment, handle, fault_order) in launched {
            match self.runtime.join(handle) {
                Ok(Ok(())) => {
                    debug!(placement = %assignment.placement, "replica completed");
                }
                Ok(Err(cause)) => {
                    error!(placement = %assignment.placement, "replica failed: {}", cause);
                    faults.push((fault_order.load(Ordering::SeqCst), fault(assignment, cause)));
                }
                Err(e) => {
                    error!(placement = %assignment.placement, "failed to join replica: {}", e);
                    let order = fault_clock.fetch_add(1, Ordering::SeqCst);
                    faults.push((order, fault(assignment, Box::new(e))));
                }
            }
        }

        if faults.is_empty() {
            info!("all replicas completed");
            return Ok(());
        }

        faults.sort_by_key(|(order, _)| *order);
        let faults = faults.into_iter().map(|(_, fault)| fault).collect();
        Err(ExecutionFaults::new(faults).into())
    }
}

/// Partitions and dispatches on OS threads
pub fn dispatch_on_threads<P: WorkerPrototype>(
    item_count: usize,
    devices: &DeviceList,
    prototype: &P,
) -> DispatchResult {
    Dispatcher::on_threads().process(item_count, devices, prototype)
}

fn place_replicas<'a, P: WorkerPrototype>(
    prototype: &P,
    assignments: &'a [Assignment],
) -> Result<Vec<(&'a Assignment, P::Replica)>, DispatchError> {
    let mut replicas = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        match prototype.place_on(&assignment.placement) {
            Ok(replica) => replicas.push((assignment, replica)),
            Err(source) => {
                error!(placement = %assignment.placement, "failed to place replica: {}", source);
                return Err(DispatchError::Placement {
                    placement: assignment.placement.clone(),
                    source,
                });
            }
        }
    }
    Ok(replicas)
}

fn run_inline<Rep: Replica>(assignment: &Assignment, mut replica: Rep) -> DispatchResult {
    match run_guarded(&mut replica, assignment.partition) {
        Ok(()) => Ok(()),
        Err(cause) => {
            error!(placement = %assignment.placement, "replica failed: {}", cause);
            Err(ExecutionFaults::new(vec![fault(assignment, cause)]).into())
        }
    }
}

/// Runs the replica, turning a panic into an ordinary failure.
fn run_guarded<Rep: Replica>(replica: &mut Rep, partition: Partition) -> RunOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| replica.run(partition))) {
        Ok(outcome) => outcome,
        Err(payload) => Err(Box::new(ReplicaPanicked(panic_message(payload.as_ref())))),
    }
}

fn fault(assignment: &Assignment, cause: ReplicaError) -> ExecutionFault {
    ExecutionFault {
        placement: assignment.placement.clone(),
        partition: assignment.partition,
        cause,
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
