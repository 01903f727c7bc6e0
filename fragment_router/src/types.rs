// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types: control signals, failure policy, attempt outcomes, and dispatch results.
//!
//! ## Overview
//!
//! These types describe the dispatch protocol and its outputs.
//! They are referenced by the [`router`](crate::router) and the [`pipeline`](crate::pipeline) runner.

use crate::error::HandlerError;

/// Short-circuit directive set by a handler on the in-flight
/// [`Request`](crate::context::Request).
///
/// The runner inspects the slot after every handler step.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Control {
    /// Continue with the next handler.
    #[default]
    None,
    /// Abandon this pipeline; the dispatcher tries the next one with a fresh request.
    NextRoute,
    /// Stop this attempt and the entire dispatch cycle.
    AbortAll,
}

impl Control {
    /// Returns `true` for [`Control::None`].
    #[inline]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }
}

/// What to do when a handler fails with an error that is not a control signal.
///
/// Set via [`Router::set_failure_policy`](crate::router::Router::set_failure_policy)
/// or [`RouterOptions`](crate::router::RouterOptions). Every failure is logged and
/// handed to the failure observer regardless of policy.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum FailurePolicy {
    /// Treat the failure as [`Control::AbortAll`] for the current cycle.
    #[default]
    AbortAll,
    /// Abandon only the failing pipeline, as if it raised [`Control::NextRoute`].
    SkipRoute,
}

/// Terminal state of one pipeline run.
///
/// Produced by the runner; `Running` is internal to the runner loop and never escapes it.
#[derive(Debug)]
pub enum Outcome {
    /// The pipeline was abandoned; try the next one.
    Next,
    /// The attempt and the whole cycle stop.
    Abort(AbortCause),
    /// Every handler ran with no signal raised: the pipeline committed.
    Done,
}

/// Why a dispatch cycle stopped early.
#[derive(Debug)]
pub enum AbortCause {
    /// A pipeline handler raised [`Control::AbortAll`].
    Signal,
    /// A listen-time entry guard raised [`Control::AbortAll`].
    Guard,
    /// A handler failed with an unrecognized error under [`FailurePolicy::AbortAll`].
    Handler(HandlerError),
    /// A deferred action failed after its pipeline committed.
    Deferred(HandlerError),
}

impl AbortCause {
    /// The underlying failure, if the abort was not a plain signal.
    pub fn error(&self) -> Option<&HandlerError> {
        match self {
            Self::Signal | Self::Guard => None,
            Self::Handler(err) | Self::Deferred(err) => Some(err),
        }
    }
}

/// Result of one dispatch cycle.
///
/// Returned by [`Router::dispatch`](crate::router::Router::dispatch) and
/// [`Listener::notify`](crate::listen::Listener::notify).
#[derive(Debug)]
pub enum Dispatched {
    /// A pipeline committed.
    Committed {
        /// Registration index of the winning pipeline within its router.
        route: usize,
        /// Mount depth of the committing router; `0` is the router the cycle started on.
        depth: usize,
    },
    /// Nothing matched anywhere in the mount graph.
    Unmatched,
    /// The cycle was cut short.
    Aborted(AbortCause),
}

impl Dispatched {
    /// Returns `true` if a pipeline committed and its deferred actions succeeded.
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    /// Returns `true` if the cycle was aborted.
    pub const fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_defaults_to_none() {
        assert_eq!(Control::default(), Control::None);
        assert!(Control::None.is_none());
        assert!(!Control::NextRoute.is_none());
        assert!(!Control::AbortAll.is_none());
    }

    #[test]
    fn failure_policy_defaults_to_abort_all() {
        assert_eq!(FailurePolicy::default(), FailurePolicy::AbortAll);
    }

    #[test]
    fn abort_cause_exposes_failure_only_for_errors() {
        assert!(AbortCause::Signal.error().is_none());
        assert!(AbortCause::Guard.error().is_none());
        let cause = AbortCause::Deferred(HandlerError::message("boom"));
        assert_eq!(cause.error().map(|e| alloc::format!("{e}")).as_deref(), Some("boom"));
    }

    #[test]
    fn dispatched_predicates() {
        assert!(Dispatched::Committed { route: 0, depth: 0 }.is_committed());
        assert!(!Dispatched::Unmatched.is_committed());
        assert!(Dispatched::Aborted(AbortCause::Signal).is_aborted());
        assert!(!Dispatched::Unmatched.is_aborted());
    }
}
