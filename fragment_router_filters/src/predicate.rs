// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Predicates and the adapters that turn them into handlers.

use fragment_router::{Control, HandlerResult, Request};

/// A yes/no question about the in-flight request.
///
/// Implemented for every `Fn(&mut Request) -> bool`. Predicates receive the request
/// mutably so they can record captures or consume a prefix when they match.
pub trait Predicate {
    /// Whether the request is accepted.
    fn test(&self, request: &mut Request) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(&mut Request) -> bool,
{
    #[inline]
    fn test(&self, request: &mut Request) -> bool {
        self(request)
    }
}

/// Handler that raises [`Control::NextRoute`] when `predicate` rejects the request.
pub fn check<P>(predicate: P) -> impl Fn(&mut Request) -> HandlerResult
where
    P: Predicate + 'static,
{
    move |request| {
        if !predicate.test(request) {
            tracing::trace!(identifier = request.identifier(), "check rejected");
            request.raise(Control::NextRoute);
        }
        Ok(())
    }
}

/// Handler that raises [`Control::AbortAll`] when `predicate` rejects the request.
pub fn require<P>(predicate: P) -> impl Fn(&mut Request) -> HandlerResult
where
    P: Predicate + 'static,
{
    move |request| {
        if !predicate.test(request) {
            tracing::debug!(identifier = request.identifier(), "requirement failed, aborting");
            request.raise(Control::AbortAll);
        }
        Ok(())
    }
}

/// Negate a predicate.
pub fn not<P>(predicate: P) -> impl Fn(&mut Request) -> bool
where
    P: Predicate + 'static,
{
    move |request| !predicate.test(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::is_home;
    use fragment_router::{Dispatched, Pipeline, Router};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn check_skips_to_next_route() {
        let data = Rc::new(RefCell::new(Vec::new()));
        let router = Router::new();
        let (foo, bar) = (Rc::clone(&data), Rc::clone(&data));
        router
            .route(
                Pipeline::new()
                    .then(check(is_home))
                    .then(move |req| {
                        foo.borrow_mut().push("foo");
                        req.raise(Control::AbortAll);
                        Ok(())
                    }),
            )
            .route(Pipeline::new().then(move |_| {
                bar.borrow_mut().push("bar");
                Ok(())
            }));

        for identifier in ["", "", "foo", "bar", "baz"] {
            router.dispatch(identifier).unwrap();
        }
        assert_eq!(*data.borrow(), ["foo", "foo", "bar", "bar", "bar"]);
    }

    #[test]
    fn require_aborts_cycle() {
        let router = Router::new();
        router
            .route(Pipeline::new().then(require(is_home)))
            .route(Pipeline::new().then(|_| Ok(())));
        assert!(matches!(
            router.dispatch("x").unwrap(),
            Dispatched::Aborted(_)
        ));
        assert!(router.dispatch("").unwrap().is_committed());
    }

    #[test]
    fn not_inverts() {
        let mut home = Request::new("", "");
        let mut away = Request::new("away", "");
        let away_from_home = not(is_home);
        assert!(!away_from_home.test(&mut home));
        assert!(away_from_home.test(&mut away));
    }
}
