// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Point-in-time view of a progress counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
}

type Renderer = Box<dyn Fn(ProgressSnapshot) + Send + Sync>;

struct Inner {
    completed: AtomicUsize,
    total: usize,
    closed: AtomicBool,
    render: Renderer,
}

/// Shared, thread-safe progress indicator.
///
/// Every replica holds a clone and calls [`ProgressCounter::advance`] as it
/// finishes items. The owner calls [`ProgressCounter::close`] once the
/// dispatch has returned; advances after that are counted but not rendered.
#[derive(Clone)]
pub struct ProgressCounter {
    inner: Arc<Inner>,
}

impl ProgressCounter {
    /// Counter that renders nothing.
    pub fn new(total: usize) -> Self {
        Self::with_renderer(total, |_| {})
    }

    pub fn with_renderer<F>(total: usize, render: F) -> Self
    where
        F: Fn(ProgressSnapshot) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                completed: AtomicUsize::new(0),
                total,
                closed: AtomicBool::new(false),
                render: Box::new(render),
            }),
        }
    }

    /// Records `count` finished items and returns the new completed total.
    pub fn advance(&self, count: usize) -> usize {
        let completed = self.inner.completed.fetch_add(count, Ordering::AcqRel) + count;
        if !self.inner.closed.load(Ordering::Acquire) {
            (self.inner.render)(ProgressSnapshot {
                completed,
                total: self.inner.total,
            });
        }
        completed
    }

    pub fn completed(&self) -> usize {
        self.inner.completed.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.inner.total
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: self.completed(),
            total: self.inner.total,
        }
    }

    /// Renders the final snapshot. Only the first call has any effect.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            (self.inner.render)(self.snapshot());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ProgressCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressCounter")
            .field("completed", &self.completed())
            .field("total", &self.inner.total)
            .field("closed", &self.is_closed())
            .finish()
    }
}
