// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! - [`HandlerError`] is what handlers, guards, and deferred actions return.
//!   It doubles as a way to raise a control signal by returning it.
//! - [`RouteError`] reports misuse of the router surface to the caller.

use alloc::borrow::Cow;
use alloc::boxed::Box;

use thiserror::Error;

use crate::types::Control;

/// Failure returned by a handler, guard, or deferred action.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A control signal returned instead of raised.
    ///
    /// Inside a pipeline this is equivalent to calling
    /// [`Request::raise`](crate::context::Request::raise). In the deferred phase it
    /// aborts the cycle like any other failure.
    #[error("control signal {0:?} returned as an error")]
    Signal(Control),
    /// A plain failure message.
    #[error("{0}")]
    Message(Cow<'static, str>),
    /// Any other error.
    #[error(transparent)]
    Other(Box<dyn core::error::Error + 'static>),
}

impl HandlerError {
    /// Build a failure from a message.
    pub fn message(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Message(msg.into())
    }

    /// Wrap an arbitrary error.
    pub fn other(err: impl core::error::Error + 'static) -> Self {
        Self::Other(Box::new(err))
    }

    /// The control signal carried by this error, if it is one.
    pub const fn signal(&self) -> Option<Control> {
        match self {
            Self::Signal(control) => Some(*control),
            Self::Message(_) | Self::Other(_) => None,
        }
    }
}

impl From<Control> for HandlerError {
    fn from(control: Control) -> Self {
        Self::Signal(control)
    }
}

/// Misuse of the router surface, surfaced synchronously to the caller.
#[derive(Copy, Clone, Debug, Error, Eq, PartialEq)]
pub enum RouteError {
    /// A dispatch was requested while this router was already routing.
    #[error("router is already dispatching")]
    Reentrant,
    /// No attempt is in flight for this router.
    #[error("no request is in flight for this router")]
    NoRequest,
    /// The attempt that produced this request handle has ended.
    #[error("request handle outlived its attempt")]
    RequestExpired,
    /// The request is currently lent to a running handler.
    #[error("request is lent to a running handler")]
    RequestInUse,
}
