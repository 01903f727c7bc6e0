// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Exit handlers: teardown that runs once, at the start of the next dispatch cycle.
//!
//! ## Usage
//!
//! A committed pipeline registers teardown (for example "drop the content I just
//! rendered") with [`Router::on_exit`](crate::router::Router::on_exit) or
//! [`Request::on_exit`](crate::context::Request::on_exit). The next cycle flushes it
//! before any pipeline is attempted, whether or not that cycle matches anything.
//!
//! The pending list is taken before the callbacks run, so a callback that registers
//! another exit handler schedules it for the following cycle, not the current flush.

use alloc::boxed::Box;
use alloc::vec::Vec;

/// A zero-argument teardown callback.
pub type ExitHandler = Box<dyn FnOnce()>;

/// Ordered list of pending exit handlers.
#[derive(Default)]
pub struct ExitRegistry {
    pending: Vec<ExitHandler>,
}

impl core::fmt::Debug for ExitRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ExitRegistry")
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl ExitRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler.
    pub fn push(&mut self, handler: impl FnOnce() + 'static) {
        self.pending.push(Box::new(handler));
    }

    /// Append every handler of `other`, preserving order.
    pub fn append(&mut self, other: &mut Self) {
        self.pending.append(&mut other.pending);
    }

    /// Number of pending handlers.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every pending handler, leaving this registry empty.
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }

    /// Invoke every handler in registration order, consuming them.
    ///
    /// Returns the number of handlers invoked.
    pub fn run(self) -> usize {
        let count = self.pending.len();
        for handler in self.pending {
            handler();
        }
        count
    }
}
