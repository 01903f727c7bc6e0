// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nested mounts, exit handlers, and lifecycle hooks.
//!
//! A `docs/` subrouter and an `api/` subrouter hang off the root. Each committed
//! page schedules teardown with an exit handler, which runs at the start of the
//! next navigation wherever it goes. A lifecycle hook traces every attempt; run with
//! `RUST_LOG=debug` to see it.
//!
//! Run:
//! - `cargo run -p fragment_router_demos --example nested_mounts`

use fragment_router::{Control, HandlerResult, Pipeline, Request, Router, RouterOptions};
use fragment_router_filters::{check, equals, has_prefix};
use tracing_subscriber::EnvFilter;

fn page(name: &'static str) -> impl Fn(&mut Request) -> HandlerResult {
    move |req| {
        println!("   render {name} (consumed {:?}, rest {:?})", req.prefix(), req.identifier());
        req.on_exit(move || tracing::info!(page = name, "teardown"));
        req.defer(move || {
            tracing::info!(page = name, "viewed");
            Ok(())
        });
        Ok(())
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let root = Router::with_options(RouterOptions::default().with_name("root"));
    let docs = Router::with_options(RouterOptions::default().with_name("docs"));
    let api = Router::with_options(RouterOptions::default().with_name("api"));

    root.hook(
        || tracing::debug!(router = "root", "enter"),
        || tracing::debug!(router = "root", "exit"),
    );
    root.route(
        Pipeline::new()
            .then(check(equals("")))
            .then(|req| {
                req.set_output("home");
                Ok(())
            }),
    );
    docs.route(
        Pipeline::new()
            .then(check(equals("intro")))
            .then(page("docs intro")),
    )
    .route(
        Pipeline::new()
            .then(|req| {
                if req.identifier().starts_with("secret") {
                    req.raise(Control::AbortAll);
                }
                Ok(())
            })
            .then(page("docs guide")),
    );
    api.route(
        Pipeline::new()
            .then(check(has_prefix("v1/")))
            .then(|req| {
                println!("   api v1 call for {:?}", req.identifier());
                Ok(())
            }),
    );

    root.mount("docs/", &docs).mount("api/", &api);
    // Ignored: the root would become reachable from itself.
    docs.mount("up/", &root);

    for identifier in ["", "docs/intro", "docs/guide", "api/v1/users", "docs/secret", "nowhere"] {
        println!("== {identifier:?} ==");
        match root.dispatch(identifier) {
            Ok(result) => println!("   -> {result:?}"),
            Err(err) => tracing::warn!(error = %err, "dispatch refused"),
        }
    }
    println!("pending exits on docs: {}", docs.pending_exits());
}
