// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Static, contiguous partitioning of a work set across a device list.

use crate::{DeviceList, Placement};
use std::fmt;
use std::ops::Range;

/// Contiguous range of work-item indices, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Partition {
    start: usize,
    end: usize,
}

impl Partition {
    /// # Panics
    /// Panics if `end < start`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "partition end {} precedes start {}", end, start);
        Self { start, end }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn indices(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A partition bound to the placement that will process it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub placement: Placement,
    pub partition: Partition,
}

/// Splits `[0, item_count)` across `devices`.
///
/// - No items: no assignments at all, whatever the device list holds.
/// - No devices: one host assignment covering every item.
/// - Otherwise the first `min(devices, items)` devices each get one chunk.
///   Chunk sizes differ by at most one and the larger chunks come first,
///   so 10 items over 3 devices gives sizes 4, 3, 3.
pub fn partition(item_count: usize, devices: &DeviceList) -> Vec<Assignment> {
    if item_count == 0 {
        return Vec::new();
    }

    if devices.is_empty() {
        return vec![Assignment {
            placement: Placement::Host,
            partition: Partition::new(0, item_count),
        }];
    }

    let used_devices = devices.len().min(item_count);
    let base_size = item_count / used_devices;
    let remainder = item_count % used_devices;

    let mut assignments = Vec::with_capacity(used_devices);
    let mut start = 0;

    for (index, device) in devices.iter().take(used_devices).enumerate() {
        let size = if index < remainder {
            base_size + 1
        } else {
            base_size
        };
        let end = start + size;
        assignments.push(Assignment {
            placement: Placement::Device(device.clone()),
            partition: Partition::new(start, end),
        });
        start = end;
    }

    assignments
}
