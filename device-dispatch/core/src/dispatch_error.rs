// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{Partition, Placement, ReplicaError};
use std::fmt;

pub type DispatchResult = Result<(), DispatchError>;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Device list or work count is degenerate; nothing was placed
    #[error("invalid dispatch configuration: {0}")]
    Configuration(String),

    /// A replica could not be placed; no partition was run
    #[error("failed to place replica on {placement}: {source}")]
    Placement {
        placement: Placement,
        #[source]
        source: ReplicaError,
    },

    /// One or more replicas failed while every sibling ran to completion
    #[error(transparent)]
    Execution(#[from] ExecutionFaults),
}

impl DispatchError {
    /// Placements that faulted, in the order the faults were observed
    pub fn failed_placements(&self) -> Vec<&Placement> {
        match self {
            DispatchError::Configuration(_) => Vec::new(),
            DispatchError::Placement { placement, .. } => vec![placement],
            DispatchError::Execution(faults) => faults.iter().map(|f| &f.placement).collect(),
        }
    }
}

/// A replica that failed while running its partition.
#[derive(Debug)]
pub struct ExecutionFault {
    pub placement: Placement,
    pub partition: Partition,
    pub cause: ReplicaError,
}

impl fmt::Display for ExecutionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "replica on {} failed over {}: {}",
            self.placement, self.partition, self.cause
        )
    }
}

/// Every execution fault of one dispatch, first-encountered first.
#[derive(Debug)]
pub struct ExecutionFaults {
    faults: Vec<ExecutionFault>,
}

impl ExecutionFaults {
    /// # Panics
    /// Panics if `faults` is empty.
    pub(crate) fn new(faults: Vec<ExecutionFault>) -> Self {
        assert!(!faults.is_empty(), "an aggregate fault needs at least one fault");
        Self { faults }
    }

    pub fn first(&self) -> &ExecutionFault {
        &self.faults[0]
    }

    pub fn len(&self) -> usize {
        self.faults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExecutionFault> {
        self.faults.iter()
    }

    pub fn into_vec(self) -> Vec<ExecutionFault> {
        self.faults
    }
}

impl fmt::Display for ExecutionFaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} replica(s) failed; first: {}", self.faults.len(), self.first())?;
        for fault in self.faults.iter().skip(1) {
            write!(f, "; {}", fault)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExecutionFaults {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.first().cause.as_ref())
    }
}
