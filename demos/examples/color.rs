// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Colour switcher.
//!
//! One router listens under `color/` and picks a background colour; a second one
//! listens at the root and prints the named captures of user post links.
//!
//! Run:
//! - `cargo run -p fragment_router_demos --example color`
//! - `RUST_LOG=fragment_router=trace cargo run -p fragment_router_demos --example color`

use std::cell::RefCell;
use std::rc::Rc;

use fragment_router::{HandlerResult, ListenOptions, MemoryLocation, Pipeline, Request, Router};
use fragment_router_filters::{Params, check, equals, is_home, matches};
use regex::Regex;
use tracing_subscriber::EnvFilter;

fn change(
    background: &Rc<RefCell<String>>,
    color: &'static str,
) -> impl Fn(&mut Request) -> HandlerResult + use<> {
    let background = Rc::clone(background);
    move |_| {
        *background.borrow_mut() = color.to_owned();
        Ok(())
    }
}

fn main() -> Result<(), regex::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let background = Rc::new(RefCell::new(String::from("white")));
    let colors = Router::new();
    colors
        .route(
            Pipeline::new()
                .then(check(is_home))
                .then(change(&background, "pink")),
        )
        .route(
            Pipeline::new()
                .then(check(equals("green")))
                .then(change(&background, "green")),
        )
        .route(
            Pipeline::new()
                .then(check(matches(Regex::new("^blue$")?)))
                .then(change(&background, "blue")),
        )
        .route(Pipeline::new().then(change(&background, "yellow")));

    let posts = Router::new();
    posts.route(
        Pipeline::new()
            .then(check(matches(Regex::new(
                r"^user/(?<user>[a-zA-Z]+)/post/(?<post>\d+)$",
            )?)))
            .then(|req| {
                if let Some(params) = req.extensions().get::<Params>() {
                    tracing::info!(
                        user = params.get("user"),
                        post = params.get("post"),
                        "post link"
                    );
                }
                Ok(())
            }),
    );

    let location = MemoryLocation::new();
    let color_listener =
        colors.listen_with(location.clone(), ListenOptions::new().with_prefix("color/"));
    let post_listener = posts.listen(location.clone());

    for hash in [
        "#color/",
        "#color/green",
        "#color/blue",
        "#color/purple",
        "#user/ada/post/7",
        "#elsewhere",
    ] {
        location.set_hash(hash);
        println!("== {hash} ==");
        let colored = color_listener.notify();
        let posted = post_listener.notify();
        tracing::info!(?colored, ?posted, "dispatched");
        println!("   background = {}", background.borrow());
    }
    Ok(())
}
