// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering into an in-memory document.
//!
//! A static `about` section lives in the document. The `Writer` plugin swaps it for
//! fresh content while `#about` is current and restores it on the next navigation;
//! other pages appear temporarily at the end of the body.
//!
//! Run:
//! - `cargo run -p fragment_router_demos --example render_memory`

use std::cell::RefCell;
use std::rc::Rc;

use fragment_router::{MemoryLocation, Pipeline, Router};
use fragment_router_render::{Document, MemoryDocument, Renderer, Writer};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let doc = Rc::new(RefCell::new(MemoryDocument::new()));
    {
        let mut d = doc.borrow_mut();
        let about = d.create_text_element("section", "static about page");
        d.set_id(&about, "about");
        let body = d.body();
        d.append_child(&body, &about);
    }

    let router = Router::new();
    let renderer = Rc::new(Renderer::new(router.downgrade(), Rc::clone(&doc)));
    router.plugin(Writer::new(Rc::clone(&renderer)));

    let d = Rc::clone(&doc);
    router.route(Pipeline::new().then(move |req| {
        let text = format!("rendered {}", req.identifier());
        let element = d.borrow_mut().create_text_element("article", &text);
        req.set_output(element);
        Ok(())
    }));

    let location = MemoryLocation::new();
    let listener = router.listen(location.clone());
    println!("start:  {}", doc.borrow().markup());
    for hash in ["#about", "#news", "#about", "#"] {
        location.set_hash(hash);
        if let Err(err) = listener.notify() {
            tracing::warn!(error = %err, hash, "dispatch refused");
        }
        println!("{hash:<7} {}", doc.borrow().markup());
    }
}
