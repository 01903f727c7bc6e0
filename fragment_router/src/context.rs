// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Request context: the per-attempt state a pipeline's handlers share.
//!
//! ## Lifetime
//!
//! The router creates a fresh [`Request`] for every pipeline attempt and drops it
//! the moment the attempt ends (committed, skipped, or aborted). Handlers receive it
//! as `&mut Request`. Collaborators that are not handlers (lifecycle plugins,
//! renderers) ask the router for a [`RequestHandle`] instead; the handle is weak and
//! stops working once the attempt is over.
//!
//! ## Extension bag
//!
//! [`Extensions`] is a type-keyed map for handler-produced data such as match
//! captures. [`Output`] is the well-known entry carrying a pipeline's visual output
//! for rendering collaborators.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use core::any::{Any, TypeId};
use core::cell::RefCell;

use crate::deferred::DeferredQueue;
use crate::error::RouteError;
use crate::exit::ExitRegistry;
use crate::pipeline::HandlerResult;
use crate::types::Control;

/// Type-keyed storage for handler-produced data.
///
/// Keys are [`TypeId`]s; wrap values in a newtype to avoid collisions.
#[derive(Default)]
pub struct Extensions {
    map: BTreeMap<TypeId, Box<dyn Any>>,
}

impl core::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.map.len())
            .finish_non_exhaustive()
    }
}

impl Extensions {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous value of the same type.
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.map
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|prev| prev.downcast::<T>().ok())
            .map(|prev| *prev)
    }

    /// Borrow a value by type.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    /// Mutably borrow a value by type.
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.map
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut::<T>())
    }

    /// Remove a value by type.
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.map
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }

    /// Whether a value of type `T` is present.
    pub fn contains<T: 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Remove every value.
    pub fn clear(&mut self) {
        self.map.clear();
    }
}

/// The value a pipeline produced for display.
///
/// Stored in the extension bag by [`Request::set_output`]; rendering collaborators
/// read it while the attempt is in flight.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Output<T>(pub T);

/// Per-attempt state shared by the handlers of one pipeline.
pub struct Request {
    identifier: String,
    prefix: String,
    control: Control,
    extensions: Extensions,
    deferred: DeferredQueue,
    exits: ExitRegistry,
}

impl core::fmt::Debug for Request {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Request")
            .field("identifier", &self.identifier)
            .field("prefix", &self.prefix)
            .field("control", &self.control)
            .field("extensions", &self.extensions)
            .field("deferred", &self.deferred.len())
            .finish_non_exhaustive()
    }
}

impl Request {
    /// Create a fresh request for `identifier`, with `prefix` already consumed by
    /// ancestor routers.
    pub fn new(identifier: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            prefix: prefix.into(),
            control: Control::None,
            extensions: Extensions::new(),
            deferred: DeferredQueue::new(),
            exits: ExitRegistry::new(),
        }
    }

    /// The remaining, unmatched identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Replace the remaining identifier.
    pub fn set_identifier(&mut self, identifier: impl Into<String>) {
        self.identifier = identifier.into();
    }

    /// The part of the identifier consumed so far.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The consumed prefix followed by the remaining identifier.
    pub fn full_identifier(&self) -> String {
        let mut out = String::with_capacity(self.prefix.len() + self.identifier.len());
        out.push_str(&self.prefix);
        out.push_str(&self.identifier);
        out
    }

    /// Strip `prefix` from the identifier and record it as consumed.
    ///
    /// Returns `false`, leaving the request untouched, if the identifier does not
    /// start with `prefix`. An empty `prefix` always matches.
    pub fn consume(&mut self, prefix: &str) -> bool {
        if prefix.is_empty() {
            return true;
        }
        if !self.identifier.starts_with(prefix) {
            return false;
        }
        self.identifier.replace_range(..prefix.len(), "");
        self.prefix.push_str(prefix);
        true
    }

    /// The current control signal.
    pub fn control(&self) -> Control {
        self.control
    }

    /// Set the control signal; the runner inspects it after the current handler returns.
    pub fn raise(&mut self, control: Control) {
        self.control = control;
    }

    /// Handler-produced data.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable access to handler-produced data.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Store the pipeline's produced value under [`Output`].
    pub fn set_output<T: 'static>(&mut self, value: T) {
        self.extensions.insert(Output(value));
    }

    /// Borrow the produced value, if one of type `T` was set.
    pub fn output<T: 'static>(&self) -> Option<&T> {
        self.extensions.get::<Output<T>>().map(|o| &o.0)
    }

    /// Take the produced value out of the request.
    pub fn take_output<T: 'static>(&mut self) -> Option<T> {
        self.extensions.remove::<Output<T>>().map(|o| o.0)
    }

    /// Schedule `action` to run after this attempt commits.
    ///
    /// Dropped unrun if the attempt is skipped or aborted.
    pub fn defer(&mut self, action: impl FnOnce() -> HandlerResult + 'static) {
        self.deferred.push(action);
    }

    /// Register an exit handler on the router running this attempt.
    ///
    /// The handler is handed over when the attempt ends, whatever its outcome, and
    /// runs at the start of the next dispatch cycle.
    pub fn on_exit(&mut self, handler: impl FnOnce() + 'static) {
        self.exits.push(handler);
    }

    pub(crate) fn take_deferred(&mut self) -> DeferredQueue {
        core::mem::take(&mut self.deferred)
    }

    pub(crate) fn take_exit_handlers(&mut self) -> ExitRegistry {
        self.exits.take()
    }
}

/// Weak handle to the request of the attempt currently in flight.
///
/// Obtained from [`Router::current_request`](crate::router::Router::current_request).
/// Access is scoped to a closure so the request cannot be retained past its attempt.
#[derive(Clone)]
pub struct RequestHandle {
    inner: Weak<RefCell<Request>>,
}

impl core::fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RequestHandle")
            .field("live", &self.is_live())
            .finish()
    }
}

impl RequestHandle {
    pub(crate) fn new(request: &Rc<RefCell<Request>>) -> Self {
        Self {
            inner: Rc::downgrade(request),
        }
    }

    /// Whether the attempt this handle belongs to is still in flight.
    pub fn is_live(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Read the request.
    ///
    /// Fails with [`RouteError::RequestExpired`] once the attempt ended, and with
    /// [`RouteError::RequestInUse`] while a handler holds the request mutably.
    pub fn with<R>(&self, f: impl FnOnce(&Request) -> R) -> Result<R, RouteError> {
        let cell = self.inner.upgrade().ok_or(RouteError::RequestExpired)?;
        let request = cell.try_borrow().map_err(|_| RouteError::RequestInUse)?;
        let out = f(&request);
        Ok(out)
    }

    /// Mutate the request. Fails like [`RequestHandle::with`].
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Request) -> R) -> Result<R, RouteError> {
        let cell = self.inner.upgrade().ok_or(RouteError::RequestExpired)?;
        let mut request = cell
            .try_borrow_mut()
            .map_err(|_| RouteError::RequestInUse)?;
        let out = f(&mut request);
        Ok(out)
    }
}
