// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host listener: ties a router to a navigable location.
//!
//! ## Usage
//!
//! 1) Pick a [`Location`]: a closure returning the current fragment, or a
//!    [`MemoryLocation`] for tests and headless hosts.
//! 2) Call [`Router::listen`] (or [`Router::listen_with`] for a prefix and entry
//!    guards). The router dispatches once immediately.
//! 3) Whenever the host reports a change, or a re-dispatch is wanted, call
//!    [`Listener::notify`].
//!
//! ```
//! use fragment_router::listen::MemoryLocation;
//! use fragment_router::{Pipeline, Router};
//!
//! let router = Router::new();
//! router.route(Pipeline::new().then(|req| {
//!     req.set_output(req.identifier().to_owned());
//!     Ok(())
//! }));
//! let location = MemoryLocation::with_hash("#red");
//! let listener = router.listen(location.clone());
//! location.set_hash("#blue");
//! assert!(listener.notify().unwrap().is_committed());
//! ```

use alloc::rc::Rc;
use alloc::string::String;
use core::cell::RefCell;

use crate::context::Request;
use crate::error::RouteError;
use crate::pipeline::{HandlerResult, Pipeline};
use crate::router::Router;
use crate::types::Dispatched;

/// Source of the current navigable identifier.
pub trait Location {
    /// The current identifier, without any leading `#`.
    fn identifier(&self) -> String;
}

impl<F> Location for F
where
    F: Fn() -> String,
{
    fn identifier(&self) -> String {
        self()
    }
}

/// In-memory [`Location`]; clones share the same fragment.
#[derive(Clone, Debug, Default)]
pub struct MemoryLocation {
    hash: Rc<RefCell<String>>,
}

impl MemoryLocation {
    /// An empty location.
    pub fn new() -> Self {
        Self::default()
    }

    /// A location starting at `hash`.
    pub fn with_hash(hash: &str) -> Self {
        let location = Self::new();
        location.set_hash(hash);
        location
    }

    /// Replace the fragment. A leading `#` is stripped.
    pub fn set_hash(&self, hash: &str) {
        let hash = hash.strip_prefix('#').unwrap_or(hash);
        let mut current = self.hash.borrow_mut();
        current.clear();
        current.push_str(hash);
    }

    /// The current fragment.
    pub fn hash(&self) -> String {
        self.hash.borrow().clone()
    }
}

impl Location for MemoryLocation {
    fn identifier(&self) -> String {
        self.hash()
    }
}

/// Listen-time configuration for the root router.
#[derive(Clone, Debug, Default)]
pub struct ListenOptions {
    /// Identifiers must start with this prefix to be matched; it is trimmed first.
    pub prefix: String,
    /// Entry guards run before every root-level attempt.
    pub guards: Pipeline,
}

impl ListenOptions {
    /// No prefix and no guards.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listen prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Append an entry guard.
    #[must_use]
    pub fn with_guard<F>(mut self, guard: F) -> Self
    where
        F: Fn(&mut Request) -> HandlerResult + 'static,
    {
        self.guards = self.guards.then(guard);
        self
    }
}

/// A router attached to a [`Location`].
#[derive(Debug)]
pub struct Listener<L> {
    router: Router,
    location: L,
    options: ListenOptions,
}

impl<L: Location> Listener<L> {
    /// Dispatch the location's current identifier.
    pub fn notify(&self) -> Result<Dispatched, RouteError> {
        let identifier = self.location.identifier();
        self.router.dispatch_with(&identifier, &self.options)
    }

    /// The attached router.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The observed location.
    pub fn location(&self) -> &L {
        &self.location
    }

    /// The listen options in effect.
    pub fn options(&self) -> &ListenOptions {
        &self.options
    }
}

impl Router {
    /// Attach to `location` with default options and dispatch once.
    pub fn listen<L: Location>(&self, location: L) -> Listener<L> {
        self.listen_with(location, ListenOptions::default())
    }

    /// Attach to `location` and dispatch once.
    ///
    /// The result of the initial dispatch is logged; later ones are returned by
    /// [`Listener::notify`].
    pub fn listen_with<L: Location>(&self, location: L, options: ListenOptions) -> Listener<L> {
        let listener = Listener {
            router: self.clone(),
            location,
            options,
        };
        match listener.notify() {
            Ok(result) => tracing::debug!(?result, "initial dispatch"),
            Err(err) => tracing::warn!(error = %err, "initial dispatch refused"),
        }
        listener
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Control;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;

    fn recording_router() -> (Router, Rc<RefCell<Vec<String>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let router = Router::new();
        router.route(Pipeline::new().then(move |req| {
            sink.borrow_mut().push(req.identifier().to_string());
            Ok(())
        }));
        (router, seen)
    }

    #[test]
    fn memory_location_strips_hash() {
        let location = MemoryLocation::with_hash("#foo");
        assert_eq!(location.hash(), "foo");
        location.set_hash("bar");
        assert_eq!(location.identifier(), "bar");
    }

    #[test]
    fn listen_dispatches_immediately_and_on_notify() {
        let (router, seen) = recording_router();
        let location = MemoryLocation::with_hash("#one");
        let listener = router.listen(location.clone());
        assert_eq!(*seen.borrow(), vec!["one".to_string()]);
        location.set_hash("#two");
        assert!(listener.notify().unwrap().is_committed());
        assert_eq!(*seen.borrow(), vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn closure_location() {
        let (router, seen) = recording_router();
        let listener = router.listen(|| String::from("fixed"));
        listener.notify().unwrap();
        assert_eq!(seen.borrow().len(), 2);
        assert!(listener.router().ptr_eq(&router));
    }

    #[test]
    fn listen_prefix_trims_identifier() {
        let (router, seen) = recording_router();
        let location = MemoryLocation::with_hash("app/home");
        let listener = router.listen_with(location.clone(), ListenOptions::new().with_prefix("app/"));
        assert_eq!(listener.options().prefix, "app/");
        location.set_hash("elsewhere");
        assert!(matches!(listener.notify().unwrap(), Dispatched::Unmatched));
        assert_eq!(*seen.borrow(), vec!["home".to_string()]);
    }

    #[test]
    fn guard_aborts_every_cycle() {
        let (router, seen) = recording_router();
        let options = ListenOptions::new().with_guard(|req| {
            req.raise(Control::AbortAll);
            Ok(())
        });
        let listener = router.listen_with(MemoryLocation::new(), options);
        assert!(listener.notify().unwrap().is_aborted());
        assert!(seen.borrow().is_empty());
        assert_eq!(listener.location().hash(), "");
    }
}
