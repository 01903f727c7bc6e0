// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Router: pipeline registry, mount graph, and the dispatch cycle.
//!
//! ## Dispatch cycle
//!
//! [`Router::dispatch`] runs one cycle for an identifier:
//!
//! 1. Flush pending exit handlers depth-first, every mounted subrouter before its parent.
//! 2. Try each pipeline in registration order, each with a fresh [`Request`]:
//!    entry guards (listen-time only), enter hooks, the pipeline, and on commit the
//!    exit hooks followed by the deferred actions. The first commit wins.
//! 3. If nothing committed or aborted, try each mount in order with its prefix
//!    trimmed from the identifier. The first subrouter that commits wins.
//!
//! An abort anywhere stops the whole cycle.
//!
//! ## Sharing
//!
//! [`Router`] is a cheap reference-counted handle. Router state is never borrowed
//! while user code runs, so handlers may register routes, mounts, plugins, and exit
//! handlers mid-cycle; they take effect from the next cycle. Collaborators stored
//! inside a router's own plugins should hold a [`WeakRouter`] to avoid a reference cycle.

use alloc::borrow::Cow;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::context::{Request, RequestHandle};
use crate::error::{HandlerError, RouteError};
use crate::exit::ExitRegistry;
use crate::hooks::{Hook, HookStack, Plugin};
use crate::listen::ListenOptions;
use crate::pipeline::{FailureHandling, FailureObserver, Pipeline};
use crate::types::{AbortCause, Dispatched, FailurePolicy, Outcome};

/// Construction-time configuration for a [`Router`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RouterOptions {
    /// Name recorded on every log event of this router.
    pub name: Option<Cow<'static, str>>,
    /// How handler failures that are not control signals are treated.
    pub failure_policy: FailurePolicy,
}

impl RouterOptions {
    /// Set the router name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

struct Mount {
    prefix: String,
    router: Router,
}

type Slot = RefCell<Option<Rc<RefCell<Request>>>>;

struct Inner {
    name: Option<Cow<'static, str>>,
    routes: RefCell<Vec<Rc<Pipeline>>>,
    mounts: RefCell<Vec<Mount>>,
    hooks: RefCell<HookStack>,
    exits: RefCell<ExitRegistry>,
    failures: RefCell<FailureHandling>,
    current: Slot,
    routing: Cell<bool>,
}

/// A fragment router.
///
/// Cloning yields another handle to the same router.
#[derive(Clone)]
pub struct Router {
    inner: Rc<Inner>,
}

impl core::fmt::Debug for Router {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Router")
            .field("name", &self.inner.name)
            .field("routes", &self.route_count())
            .field("mounts", &self.mount_count())
            .field("plugins", &self.plugin_count())
            .field("routing", &self.is_routing())
            .finish_non_exhaustive()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

enum Attempt {
    Skipped,
    Committed(Result<usize, HandlerError>),
    Aborted(AbortCause),
}

/// Marks a router as routing for as long as it lives.
struct RoutingGuard<'a>(&'a Cell<bool>);

impl<'a> RoutingGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for RoutingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Publishes the in-flight request for the duration of one attempt.
struct CurrentGuard<'a>(&'a Slot);

impl<'a> CurrentGuard<'a> {
    fn set(slot: &'a Slot, request: &Rc<RefCell<Request>>) -> Self {
        *slot.borrow_mut() = Some(Rc::clone(request));
        Self(slot)
    }
}

impl Drop for CurrentGuard<'_> {
    fn drop(&mut self) {
        self.0.borrow_mut().take();
    }
}

impl Router {
    /// Create an unnamed router with the default failure policy.
    pub fn new() -> Self {
        Self::with_options(RouterOptions::default())
    }

    /// Create a router from options.
    pub fn with_options(options: RouterOptions) -> Self {
        Self {
            inner: Rc::new(Inner {
                name: options.name,
                routes: RefCell::new(Vec::new()),
                mounts: RefCell::new(Vec::new()),
                hooks: RefCell::new(HookStack::new()),
                exits: RefCell::new(ExitRegistry::new()),
                failures: RefCell::new(FailureHandling {
                    policy: options.failure_policy,
                    observer: None,
                }),
                current: RefCell::new(None),
                routing: Cell::new(false),
            }),
        }
    }

    /// The router name, if one was configured.
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Register a pipeline. An empty pipeline is ignored.
    pub fn route(&self, pipeline: Pipeline) -> &Self {
        if !pipeline.is_empty() {
            self.inner.routes.borrow_mut().push(Rc::new(pipeline));
        }
        self
    }

    /// Number of registered pipelines.
    pub fn route_count(&self) -> usize {
        self.inner.routes.borrow().len()
    }

    /// Mount `child` under `prefix`.
    ///
    /// Ignored when `child` is this router, or when `child` can already reach this
    /// router through its own mounts.
    pub fn mount(&self, prefix: impl Into<String>, child: &Self) -> &Self {
        let prefix = prefix.into();
        if self.ptr_eq(child) {
            tracing::debug!(router = ?self.name(), prefix = prefix.as_str(), "ignoring self-mount");
            return self;
        }
        if child.reaches(self) {
            tracing::debug!(
                router = ?self.name(),
                child = ?child.name(),
                prefix = prefix.as_str(),
                "ignoring mount that would form a cycle"
            );
            return self;
        }
        self.inner.mounts.borrow_mut().push(Mount {
            prefix,
            router: child.clone(),
        });
        self
    }

    /// Number of mount links.
    pub fn mount_count(&self) -> usize {
        self.inner.mounts.borrow().len()
    }

    /// Whether `target` is this router or reachable from it through mounts.
    pub fn reaches(&self, target: &Self) -> bool {
        let mut visited: Vec<*const Inner> = Vec::new();
        let mut stack = alloc::vec![self.clone()];
        while let Some(router) = stack.pop() {
            if router.ptr_eq(target) {
                return true;
            }
            let ptr = Rc::as_ptr(&router.inner);
            if visited.contains(&ptr) {
                continue;
            }
            visited.push(ptr);
            stack.extend(router.children());
        }
        false
    }

    /// Push a lifecycle plugin.
    pub fn plugin(&self, plugin: impl Plugin + 'static) -> &Self {
        self.inner.hooks.borrow_mut().push(plugin);
        self
    }

    /// Push a lifecycle hook built from an enter and an exit closure.
    pub fn hook(&self, enter: impl Fn() + 'static, exit: impl Fn() + 'static) -> &Self {
        self.plugin(Hook::new(enter, exit))
    }

    /// Number of lifecycle plugins.
    pub fn plugin_count(&self) -> usize {
        self.inner.hooks.borrow().len()
    }

    /// Register an exit handler, run at the start of the next dispatch cycle.
    pub fn on_exit(&self, handler: impl FnOnce() + 'static) -> &Self {
        self.inner.exits.borrow_mut().push(handler);
        self
    }

    /// Number of exit handlers waiting for the next flush.
    pub fn pending_exits(&self) -> usize {
        self.inner.exits.borrow().len()
    }

    /// Set the failure policy.
    pub fn set_failure_policy(&self, policy: FailurePolicy) {
        self.inner.failures.borrow_mut().policy = policy;
    }

    /// The failure policy.
    pub fn failure_policy(&self) -> FailurePolicy {
        self.inner.failures.borrow().policy
    }

    /// Install a callback that receives every unrecognized handler failure.
    pub fn set_failure_observer(&self, observer: impl Fn(&HandlerError) + 'static) {
        let observer: FailureObserver = Rc::new(observer);
        self.inner.failures.borrow_mut().observer = Some(observer);
    }

    /// Handle to the request of the attempt in flight on this router, if any.
    pub fn current_request(&self) -> Option<RequestHandle> {
        self.inner.current.borrow().as_ref().map(RequestHandle::new)
    }

    /// Like [`Router::current_request`], but surfaces `failure` when no attempt is in flight.
    ///
    /// ```
    /// use fragment_router::{RouteError, Router};
    /// let router = Router::new();
    /// assert_eq!(
    ///     router.current_request_or(RouteError::NoRequest).unwrap_err(),
    ///     RouteError::NoRequest
    /// );
    /// ```
    pub fn current_request_or<E>(&self, failure: E) -> Result<RequestHandle, E> {
        self.current_request().ok_or(failure)
    }

    /// Whether a dispatch cycle is running through this router.
    pub fn is_routing(&self) -> bool {
        self.inner.routing.get()
    }

    /// A weak handle to this router.
    pub fn downgrade(&self) -> WeakRouter {
        WeakRouter {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether both handles point at the same router.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Run one dispatch cycle for `identifier`.
    pub fn dispatch(&self, identifier: &str) -> Result<Dispatched, RouteError> {
        self.dispatch_with(identifier, &ListenOptions::default())
    }

    /// Run one dispatch cycle with a listen prefix and entry guards.
    ///
    /// Exit handlers are flushed even when `identifier` lies outside the prefix.
    /// Fails with [`RouteError::Reentrant`] if this router is already routing.
    pub fn dispatch_with(
        &self,
        identifier: &str,
        options: &ListenOptions,
    ) -> Result<Dispatched, RouteError> {
        let _routing = RoutingGuard::acquire(&self.inner.routing).ok_or(RouteError::Reentrant)?;
        let span = tracing::debug_span!("dispatch", router = ?self.name(), identifier);
        let _enter = span.enter();

        let flushed = self.flush_exits();
        tracing::trace!(flushed, "exit handlers flushed");

        let Some(rest) = identifier.strip_prefix(options.prefix.as_str()) else {
            tracing::trace!(prefix = options.prefix.as_str(), "outside listen prefix");
            return Ok(Dispatched::Unmatched);
        };
        let guards = (!options.guards.is_empty()).then_some(&options.guards);
        let result = self.route_cycle(rest, &options.prefix, guards, 0);
        if matches!(result, Dispatched::Unmatched) {
            tracing::debug!("no route matched");
        }
        Ok(result)
    }

    /// Run every pending exit handler, mounted subrouters first.
    ///
    /// Dispatch does this at the start of every cycle. Returns the number of handlers run.
    /// Fails with [`RouteError::Reentrant`] while this router is routing.
    pub fn flush_exit_handlers(&self) -> Result<usize, RouteError> {
        let _routing = RoutingGuard::acquire(&self.inner.routing).ok_or(RouteError::Reentrant)?;
        Ok(self.flush_exits())
    }

    /// Every list is taken before any handler runs, so handlers registered by a
    /// flush always wait for the next one.
    fn flush_exits(&self) -> usize {
        let mut visited = Vec::new();
        let mut pending = Vec::new();
        self.take_exits(&mut visited, &mut pending);
        pending.into_iter().map(ExitRegistry::run).sum()
    }

    /// Post-order, each router once even when it is mounted more than once.
    fn take_exits(&self, visited: &mut Vec<*const Inner>, pending: &mut Vec<ExitRegistry>) {
        let ptr = Rc::as_ptr(&self.inner);
        if visited.contains(&ptr) {
            return;
        }
        visited.push(ptr);
        for child in self.children() {
            child.take_exits(visited, pending);
        }
        pending.push(self.inner.exits.borrow_mut().take());
    }

    fn children(&self) -> Vec<Self> {
        self.inner
            .mounts
            .borrow()
            .iter()
            .map(|mount| mount.router.clone())
            .collect()
    }

    fn route_cycle(
        &self,
        identifier: &str,
        prefix: &str,
        guards: Option<&Pipeline>,
        depth: usize,
    ) -> Dispatched {
        let routes = self.inner.routes.borrow().clone();
        let hooks = self.inner.hooks.borrow().clone();
        let failures = self.inner.failures.borrow().clone();

        for (index, pipeline) in routes.iter().enumerate() {
            tracing::trace!(router = ?self.name(), route = index, depth, "attempt");
            match self.attempt(pipeline, identifier, prefix, guards, &hooks, &failures) {
                Attempt::Skipped => {}
                Attempt::Committed(Ok(deferred)) => {
                    tracing::debug!(
                        router = ?self.name(),
                        route = index,
                        depth,
                        deferred,
                        "committed"
                    );
                    return Dispatched::Committed { route: index, depth };
                }
                Attempt::Committed(Err(err)) => {
                    tracing::warn!(
                        router = ?self.name(),
                        route = index,
                        error = %err,
                        "deferred action failed, aborting cycle"
                    );
                    return Dispatched::Aborted(AbortCause::Deferred(err));
                }
                Attempt::Aborted(cause) => {
                    tracing::debug!(router = ?self.name(), route = index, ?cause, "aborted");
                    return Dispatched::Aborted(cause);
                }
            }
        }

        let mounts: Vec<(String, Self)> = self
            .inner
            .mounts
            .borrow()
            .iter()
            .map(|mount| (mount.prefix.clone(), mount.router.clone()))
            .collect();
        for (mount_prefix, child) in mounts {
            let Some(rest) = identifier.strip_prefix(mount_prefix.as_str()) else {
                continue;
            };
            let Some(_routing) = RoutingGuard::acquire(&child.inner.routing) else {
                tracing::debug!(child = ?child.name(), "skipping mount that is already routing");
                continue;
            };
            let mut consumed = String::with_capacity(prefix.len() + mount_prefix.len());
            consumed.push_str(prefix);
            consumed.push_str(&mount_prefix);
            match child.route_cycle(rest, &consumed, None, depth + 1) {
                Dispatched::Unmatched => {}
                decided => return decided,
            }
        }
        Dispatched::Unmatched
    }

    fn attempt(
        &self,
        pipeline: &Pipeline,
        identifier: &str,
        prefix: &str,
        guards: Option<&Pipeline>,
        hooks: &HookStack,
        failures: &FailureHandling,
    ) -> Attempt {
        let request = Rc::new(RefCell::new(Request::new(identifier, prefix)));
        let _current = CurrentGuard::set(&self.inner.current, &request);
        let attempt = Self::run_attempt(&request, pipeline, guards, hooks, failures);
        let mut staged = request.borrow_mut().take_exit_handlers();
        self.inner.exits.borrow_mut().append(&mut staged);
        attempt
    }

    fn run_attempt(
        request: &RefCell<Request>,
        pipeline: &Pipeline,
        guards: Option<&Pipeline>,
        hooks: &HookStack,
        failures: &FailureHandling,
    ) -> Attempt {
        if let Some(guards) = guards {
            match guards.run(request, failures) {
                Outcome::Done => {}
                Outcome::Next => return Attempt::Skipped,
                Outcome::Abort(AbortCause::Signal) => return Attempt::Aborted(AbortCause::Guard),
                Outcome::Abort(cause) => return Attempt::Aborted(cause),
            }
        }
        hooks.enter();
        match pipeline.run(request, failures) {
            Outcome::Next => Attempt::Skipped,
            Outcome::Abort(cause) => Attempt::Aborted(cause),
            Outcome::Done => {
                hooks.exit();
                let deferred = request.borrow_mut().take_deferred();
                Attempt::Committed(deferred.run())
            }
        }
    }
}

/// Non-owning handle to a [`Router`].
#[derive(Clone, Default)]
pub struct WeakRouter {
    inner: Weak<Inner>,
}

impl core::fmt::Debug for WeakRouter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WeakRouter")
            .field("live", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl WeakRouter {
    /// Recover a strong handle if the router is still alive.
    pub fn upgrade(&self) -> Option<Router> {
        self.inner.upgrade().map(|inner| Router { inner })
    }

    /// Shortcut for [`Router::current_request`] through a weak handle.
    pub fn current_request(&self) -> Option<RequestHandle> {
        self.upgrade()?.current_request()
    }
}
