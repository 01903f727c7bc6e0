// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred actions: callbacks that run only after their pipeline commits.
//!
//! A handler enqueues work with [`Request::defer`](crate::context::Request::defer).
//! The queue belongs to one attempt. When the attempt commits, the router runs it
//! after the lifecycle exit hooks, in FIFO order, inside the same dispatch cycle.
//! When the attempt is skipped or aborted, the queue is dropped unrun.

use alloc::boxed::Box;
use alloc::collections::VecDeque;

use crate::error::HandlerError;
use crate::pipeline::HandlerResult;

/// A zero-argument callback scheduled for after commit.
pub type DeferredAction = Box<dyn FnOnce() -> HandlerResult>;

/// FIFO queue of deferred actions for a single attempt.
#[derive(Default)]
pub struct DeferredQueue {
    actions: VecDeque<DeferredAction>,
}

impl core::fmt::Debug for DeferredQueue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeferredQueue")
            .field("len", &self.actions.len())
            .finish()
    }
}

impl DeferredQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an action.
    pub fn push(&mut self, action: impl FnOnce() -> HandlerResult + 'static) {
        self.actions.push_back(Box::new(action));
    }

    /// Number of pending actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Drop every pending action without running it.
    pub fn clear(&mut self) {
        self.actions.clear();
    }

    /// Run every action in registration order.
    ///
    /// Stops at the first failure and drops the remaining actions. Returns the
    /// number of actions that completed successfully.
    pub fn run(mut self) -> Result<usize, HandlerError> {
        let mut ran = 0;
        while let Some(action) = self.actions.pop_front() {
            action()?;
            ran += 1;
        }
        Ok(ran)
    }
}
