// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=fragment_router --heading-base-level=0

//! Fragment Router: a deterministic, `no_std` dispatch engine for fragment navigation.
//!
//! ## Overview
//!
//! A [`Router`](crate::router::Router) holds an ordered list of handler
//! [`Pipeline`](crate::pipeline::Pipeline)s. Each time the navigable identifier changes
//! (a URL fragment, a view path, anything path-like), the router tries the pipelines in
//! registration order and runs the first one that accepts the identifier to completion.
//! It does not parse identifiers itself: predicate handlers, such as the ones in
//! `fragment_router_filters`, decide whether a pipeline matches.
//!
//! ## Control signals
//!
//! Handlers steer the cycle by raising a [`Control`](crate::types::Control) on the
//! [`Request`](crate::context::Request) (or by returning it as an error):
//! - `NextRoute` abandons the current pipeline; the next one starts with a fresh request.
//! - `AbortAll` stops the attempt and the whole cycle.
//!
//! ## Composition
//!
//! Routers mount other routers under a prefix. When no pipeline of a router commits,
//! its mounts are tried in order with the mount prefix trimmed from the identifier.
//! Mounting a router under itself, directly or through its descendants, is ignored.
//!
//! ## Around a commit
//!
//! - Lifecycle plugins ([`hooks`](crate::hooks)) enter before every attempt and exit, in
//!   reverse order, after a commit.
//! - Deferred actions ([`Request::defer`](crate::context::Request::defer)) run after the
//!   exit hooks, only for the committed attempt.
//! - Exit handlers ([`Router::on_exit`](crate::router::Router::on_exit)) run once at the
//!   start of the next cycle, whether or not that cycle matches.
//!
//! ## Workflow
//!
//! 1) Build pipelines with [`Pipeline::new`](crate::pipeline::Pipeline::new) and
//!    [`Pipeline::then`](crate::pipeline::Pipeline::then) and register them with
//!    [`Router::route`](crate::router::Router::route).
//! 2) Compose subrouters with [`Router::mount`](crate::router::Router::mount).
//! 3) Drive it: call [`Router::dispatch`](crate::router::Router::dispatch) yourself, or
//!    attach a [`Location`](crate::listen::Location) with
//!    [`Router::listen`](crate::router::Router::listen) and call
//!    [`Listener::notify`](crate::listen::Listener::notify) on every change.
//!
//! ## Example
//!
//! ```
//! use fragment_router::{Control, Dispatched, Pipeline, Router};
//!
//! let router = Router::new();
//! router
//!     .route(Pipeline::new().then(|req| {
//!         if !req.consume("users/") {
//!             req.raise(Control::NextRoute);
//!         }
//!         Ok(())
//!     }))
//!     .route(Pipeline::new().then(|req| {
//!         req.set_output(format!("fallback for {}", req.identifier()));
//!         Ok(())
//!     }));
//!
//! assert!(matches!(
//!     router.dispatch("users/42"),
//!     Ok(Dispatched::Committed { route: 0, depth: 0 })
//! ));
//! assert!(matches!(
//!     router.dispatch("about"),
//!     Ok(Dispatched::Committed { route: 1, depth: 0 })
//! ));
//! ```
//!
//! This crate is `no_std` and uses `alloc`. Logging goes through `tracing`.

#![no_std]

extern crate alloc;

pub mod context;
pub mod deferred;
pub mod error;
pub mod exit;
pub mod hooks;
pub mod listen;
pub mod pipeline;
pub mod router;
pub mod types;

pub use context::{Extensions, Output, Request, RequestHandle};
pub use error::{HandlerError, RouteError};
pub use hooks::{Hook, HookStack, Plugin};
pub use listen::{ListenOptions, Listener, Location, MemoryLocation};
pub use pipeline::{Handler, HandlerResult, Pipeline};
pub use router::{Router, RouterOptions, WeakRouter};
pub use types::{AbortCause, Control, Dispatched, FailurePolicy};
