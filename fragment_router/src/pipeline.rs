// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pipelines and the runner that drives them.
//!
//! ## Runner
//!
//! A pipeline run starts at handler `0` with a fresh request and steps through the
//! handlers in order. After every step the runner inspects the request's control
//! slot (or the signal the handler returned):
//!
//! - [`Control::AbortAll`] → [`Outcome::Abort`]: this attempt and the cycle stop.
//! - [`Control::NextRoute`] → [`Outcome::Next`]: the pipeline is abandoned.
//! - [`Control::None`] with handlers left → advance.
//! - [`Control::None`] after the last handler → [`Outcome::Done`]: the pipeline committed.
//!
//! A handler error that is not a signal is logged, reported to the failure observer,
//! and then classified by the router's [`FailurePolicy`].

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::context::Request;
use crate::error::HandlerError;
use crate::types::{AbortCause, Control, FailurePolicy, Outcome};

/// Return type of handlers, guards, and deferred actions.
pub type HandlerResult = Result<(), HandlerError>;

/// One step of a pipeline.
///
/// Implemented for every `Fn(&mut Request) -> HandlerResult`.
pub trait Handler {
    /// Run against the in-flight request.
    fn call(&self, request: &mut Request) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&mut Request) -> HandlerResult,
{
    #[inline]
    fn call(&self, request: &mut Request) -> HandlerResult {
        self(request)
    }
}

/// Callback receiving every unrecognized handler failure.
pub type FailureObserver = Rc<dyn Fn(&HandlerError)>;

/// An immutable, ordered sequence of handlers tried together as one unit.
///
/// Build with [`Pipeline::new`] and [`Pipeline::then`], then register with
/// [`Router::route`](crate::router::Router::route).
#[derive(Clone, Default)]
pub struct Pipeline {
    handlers: Vec<Rc<dyn Handler>>,
}

impl core::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pipeline")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a closure handler.
    #[must_use]
    pub fn then<F>(self, handler: F) -> Self
    where
        F: Fn(&mut Request) -> HandlerResult + 'static,
    {
        self.then_handler(handler)
    }

    /// Append any [`Handler`].
    #[must_use]
    pub fn then_handler(mut self, handler: impl Handler + 'static) -> Self {
        self.handlers.push(Rc::new(handler));
        self
    }

    /// Number of handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the pipeline has no handlers.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the pipeline against `request` until it reaches a terminal state.
    pub(crate) fn run(&self, request: &RefCell<Request>, failures: &FailureHandling) -> Outcome {
        let mut index = 0;
        loop {
            let Some(handler) = self.handlers.get(index) else {
                return Outcome::Done;
            };
            let result = handler.call(&mut request.borrow_mut());
            let control = request.borrow().control();
            match Step::classify(result, control, index, failures) {
                Step::Advance => index += 1,
                Step::Finish(outcome) => return outcome,
            }
        }
    }
}

/// How the router treats failures that are not control signals.
#[derive(Clone, Default)]
pub(crate) struct FailureHandling {
    pub(crate) policy: FailurePolicy,
    pub(crate) observer: Option<FailureObserver>,
}

enum Step {
    Advance,
    Finish(Outcome),
}

impl Step {
    fn classify(
        result: HandlerResult,
        control: Control,
        index: usize,
        failures: &FailureHandling,
    ) -> Self {
        let control = match result {
            Ok(()) => control,
            Err(HandlerError::Signal(signal)) => signal,
            Err(err) => return Self::failed(err, index, failures),
        };
        match control {
            Control::None => Self::Advance,
            Control::NextRoute => Self::Finish(Outcome::Next),
            Control::AbortAll => Self::Finish(Outcome::Abort(AbortCause::Signal)),
        }
    }

    fn failed(err: HandlerError, index: usize, failures: &FailureHandling) -> Self {
        tracing::error!(
            handler = index,
            error = %err,
            policy = ?failures.policy,
            "handler failed"
        );
        if let Some(observer) = &failures.observer {
            observer(&err);
        }
        match failures.policy {
            FailurePolicy::AbortAll => Self::Finish(Outcome::Abort(AbortCause::Handler(err))),
            FailurePolicy::SkipRoute => Self::Finish(Outcome::Next),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn push(log: Rc<RefCell<Vec<u32>>>, n: u32) -> impl Fn(&mut Request) -> HandlerResult {
        move |_| {
            log.borrow_mut().push(n);
            Ok(())
        }
    }

    fn run(p: &Pipeline, failures: &FailureHandling) -> Outcome {
        let req = RefCell::new(Request::new("", ""));
        p.run(&req, failures)
    }

    #[test]
    fn runs_every_handler_then_commits() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let p = Pipeline::new().then(push(Rc::clone(&log), 0)).then(push(Rc::clone(&log), 1));
        assert_eq!(p.len(), 2);
        assert!(matches!(run(&p, &FailureHandling::default()), Outcome::Done));
        assert_eq!(*log.borrow(), vec![0, 1]);
    }

    #[test]
    fn empty_pipeline_is_done_immediately() {
        let p = Pipeline::new();
        assert!(p.is_empty());
        assert!(matches!(run(&p, &FailureHandling::default()), Outcome::Done));
    }

    #[test]
    fn raised_next_route_stops_remaining_handlers() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let p = Pipeline::new()
            .then(push(Rc::clone(&log), 0))
            .then(|req| {
                req.raise(Control::NextRoute);
                Ok(())
            })
            .then(push(Rc::clone(&log), 1));
        assert!(matches!(run(&p, &FailureHandling::default()), Outcome::Next));
        assert_eq!(*log.borrow(), vec![0]);
    }

    #[test]
    fn returned_abort_signal_is_recognized() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let p = Pipeline::new()
            .then(|_| Err(Control::AbortAll.into()))
            .then(push(Rc::clone(&log), 1));
        assert!(matches!(
            run(&p, &FailureHandling::default()),
            Outcome::Abort(AbortCause::Signal)
        ));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn returned_none_signal_continues() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let p = Pipeline::new()
            .then(|_| Err(Control::None.into()))
            .then(push(Rc::clone(&log), 1));
        assert!(matches!(run(&p, &FailureHandling::default()), Outcome::Done));
        assert_eq!(*log.borrow(), vec![1]);
    }

    #[test]
    fn failure_aborts_by_default_and_reaches_observer() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let failures = FailureHandling {
            policy: FailurePolicy::AbortAll,
            observer: Some(Rc::new(move |err: &HandlerError| {
                sink.borrow_mut().push(alloc::format!("{err}"));
            })),
        };
        let p = Pipeline::new().then(|_| Err(HandlerError::message("broken")));
        match run(&p, &failures) {
            Outcome::Abort(AbortCause::Handler(err)) => {
                assert_eq!(alloc::format!("{err}"), "broken");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(*seen.borrow(), vec![alloc::string::String::from("broken")]);
    }

    #[test]
    fn failure_skips_route_under_skip_policy() {
        let failures = FailureHandling {
            policy: FailurePolicy::SkipRoute,
            observer: None,
        };
        let p = Pipeline::new().then(|_| Err(HandlerError::message("broken")));
        assert!(matches!(run(&p, &failures), Outcome::Next));
    }
}
