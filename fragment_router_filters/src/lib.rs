// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fragment Router Filters: predicates that decide whether a pipeline matches.
//!
//! ## Overview
//!
//! A predicate looks at the in-flight [`Request`](fragment_router::Request) and answers
//! `true` or `false`. Predicates may also record what they found (regex captures) or
//! consume part of the identifier (a prefix). Turn one into a pipeline handler with:
//!
//! - [`check`](crate::predicate::check): a `false` answer raises `NextRoute`, so the
//!   router moves on to the next pipeline.
//! - [`require`](crate::predicate::require): a `false` answer raises `AbortAll`.
//!
//! ## Example
//!
//! ```
//! use fragment_router::{Pipeline, Router};
//! use fragment_router_filters::{Params, check, matches};
//! use regex::Regex;
//!
//! let router = Router::new();
//! router.route(
//!     Pipeline::new()
//!         .then(check(matches(Regex::new(r"^user/(?<name>[a-z]+)$").unwrap())))
//!         .then(|req| {
//!             let name = req.extensions().get::<Params>().and_then(|p| p.get("name"));
//!             assert_eq!(name, Some("ada"));
//!             Ok(())
//!         }),
//! );
//! assert!(router.dispatch("user/ada").unwrap().is_committed());
//! assert!(!router.dispatch("user/42").unwrap().is_committed());
//! ```

pub mod matchers;
pub mod predicate;

pub use matchers::{Captures, Params, equals, has_prefix, is_home, matches};
pub use predicate::{Predicate, check, not, require};
