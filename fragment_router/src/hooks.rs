// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifecycle hooks: enter/exit pairs wrapped around pipeline attempts.
//!
//! ## Ordering
//!
//! Hooks nest like scopes:
//! - Enter callbacks run from the first registered to the last (outer → inner).
//! - Exit callbacks run from the last registered to the first (inner → outer).
//!
//! Enter runs once per attempt, after the request is created and before the first
//! handler. Exit runs only when the attempt commits, and before the attempt's
//! deferred actions.
//!
//! ## Minimal example
//!
//! ```
//! use core::cell::RefCell;
//! use std::rc::Rc;
//! use fragment_router::hooks::{Hook, HookStack};
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let mut stack = HookStack::new();
//! for name in ["outer", "inner"] {
//!     let (a, b) = (Rc::clone(&log), Rc::clone(&log));
//!     stack.push(Hook::new(
//!         move || a.borrow_mut().push(format!("enter {name}")),
//!         move || b.borrow_mut().push(format!("exit {name}")),
//!     ));
//! }
//! stack.enter();
//! stack.exit();
//! assert_eq!(
//!     *log.borrow(),
//!     ["enter outer", "enter inner", "exit inner", "exit outer"]
//! );
//! ```

use alloc::rc::Rc;
use alloc::vec::Vec;

/// An enter/exit pair registered on a router.
///
/// Plugins that need the in-flight request should hold a
/// [`WeakRouter`](crate::router::WeakRouter) and call
/// [`Router::current_request`](crate::router::Router::current_request).
pub trait Plugin {
    /// Called before the first handler of every attempt.
    fn enter(&self);
    /// Called after a pipeline commits, before its deferred actions.
    fn exit(&self);
}

/// A [`Plugin`] built from two closures.
pub struct Hook<E, X> {
    enter: E,
    exit: X,
}

impl<E, X> core::fmt::Debug for Hook<E, X> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hook").finish_non_exhaustive()
    }
}

impl<E: Fn(), X: Fn()> Hook<E, X> {
    /// Pair an enter callback with an exit callback.
    pub fn new(enter: E, exit: X) -> Self {
        Self { enter, exit }
    }
}

impl<E: Fn(), X: Fn()> Plugin for Hook<E, X> {
    fn enter(&self) {
        (self.enter)();
    }

    fn exit(&self) {
        (self.exit)();
    }
}

/// Ordered stack of lifecycle plugins.
#[derive(Clone, Default)]
pub struct HookStack {
    plugins: Vec<Rc<dyn Plugin>>,
}

impl core::fmt::Debug for HookStack {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HookStack")
            .field("plugins", &self.plugins.len())
            .finish()
    }
}

impl HookStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a plugin on top of the stack.
    pub fn push(&mut self, plugin: impl Plugin + 'static) {
        self.plugins.push(Rc::new(plugin));
    }

    /// Push an already shared plugin.
    pub fn push_shared(&mut self, plugin: Rc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin is registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Run every enter callback in registration order.
    pub fn enter(&self) {
        for plugin in &self.plugins {
            plugin.enter();
        }
    }

    /// Run every exit callback in reverse registration order.
    pub fn exit(&self) {
        for plugin in self.plugins.iter().rev() {
            plugin.exit();
        }
    }
}

impl Plugin for HookStack {
    fn enter(&self) {
        Self::enter(self);
    }

    fn exit(&self) {
        Self::exit(self);
    }
}
