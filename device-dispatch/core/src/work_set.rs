// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::Partition;
use std::sync::Arc;

/// Ordered, immutable sequence of work items addressed by position.
/// Clones share the same backing storage, so every replica can hold its own
/// read-only view.
#[derive(Debug)]
pub struct WorkSet<T> {
    items: Arc<[T]>,
}

impl<T> WorkSet<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Items covered by the partition.
    ///
    /// # Panics
    /// Panics if the partition reaches past the end of the set.
    pub fn slice(&self, partition: Partition) -> &[T] {
        &self.items[partition.indices()]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> Clone for WorkSet<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> From<Vec<T>> for WorkSet<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T> FromIterator<T> for WorkSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
