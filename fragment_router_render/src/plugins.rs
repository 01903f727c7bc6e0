// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifecycle plugins that render a committed pipeline's [`Output`](fragment_router::Output).
//!
//! Both plugins restore the document when an attempt enters, and on exit hand a
//! clone of the request's `Output<D::Element>`, if any, to their [`Renderer`]. The
//! output stays on the request, so deferred actions can still read it.
//!
//! ```
//! use core::cell::RefCell;
//! use std::rc::Rc;
//! use fragment_router::{Pipeline, Router};
//! use fragment_router_render::{MemoryDocument, Renderer, Writer};
//!
//! let doc = Rc::new(RefCell::new(MemoryDocument::new()));
//! let router = Router::new();
//! let renderer = Rc::new(Renderer::new(router.downgrade(), Rc::clone(&doc)));
//! router.plugin(Writer::new(Rc::clone(&renderer)));
//!
//! let d = Rc::clone(&doc);
//! router.route(Pipeline::new().then(move |req| {
//!     let text = format!("showing {}", req.identifier());
//!     req.set_output(d.borrow_mut().create_text_element("p", &text));
//!     Ok(())
//! }));
//!
//! router.dispatch("intro").unwrap();
//! assert_eq!(doc.borrow().markup(), "<body><p id=\"intro\">showing intro</p></body>");
//! ```

use alloc::rc::Rc;

use fragment_router::Plugin;

use crate::document::Document;
use crate::renderer::{RenderError, Renderer};

fn committed_output<D: Document>(renderer: &Renderer<D>) -> Option<D::Element> {
    let request = renderer.router().current_request()?;
    request
        .with(|req| req.output::<D::Element>().cloned())
        .ok()
        .flatten()
}

fn report(kind: &str, result: Result<(), RenderError>) {
    if let Err(err) = result {
        tracing::warn!(plugin = kind, error = %err, "render failed");
    }
}

/// Replaces the current fragment with the committed output; see [`Renderer::write`].
pub struct Writer<D: Document> {
    renderer: Rc<Renderer<D>>,
}

impl<D: Document> core::fmt::Debug for Writer<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Writer")
            .field("renderer", &self.renderer)
            .finish()
    }
}

impl<D: Document> Writer<D> {
    /// Wrap a shared renderer.
    pub fn new(renderer: Rc<Renderer<D>>) -> Self {
        Self { renderer }
    }

    /// The wrapped renderer.
    pub fn renderer(&self) -> &Rc<Renderer<D>> {
        &self.renderer
    }
}

impl<D: Document> Plugin for Writer<D> {
    fn enter(&self) {
        self.renderer.restore();
    }

    fn exit(&self) {
        if let Some(element) = committed_output(&self.renderer) {
            report("writer", self.renderer.write(element));
        }
    }
}

/// Appends the committed output to the container; see [`Renderer::append`].
pub struct Appender<D: Document> {
    renderer: Rc<Renderer<D>>,
}

impl<D: Document> core::fmt::Debug for Appender<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Appender")
            .field("renderer", &self.renderer)
            .finish()
    }
}

impl<D: Document> Appender<D> {
    /// Wrap a shared renderer.
    pub fn new(renderer: Rc<Renderer<D>>) -> Self {
        Self { renderer }
    }

    /// The wrapped renderer.
    pub fn renderer(&self) -> &Rc<Renderer<D>> {
        &self.renderer
    }
}

impl<D: Document> Plugin for Appender<D> {
    fn enter(&self) {
        self.renderer.restore();
    }

    fn exit(&self) {
        if let Some(element) = committed_output(&self.renderer) {
            report("appender", self.renderer.append(element));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ElementId, MemoryDocument};
    use alloc::string::String;
    use core::cell::RefCell;
    use fragment_router::{Control, HandlerError, ListenOptions, Pipeline, Router};

    struct Fixture {
        router: Router,
        doc: Rc<RefCell<MemoryDocument>>,
        renderer: Rc<Renderer<MemoryDocument>>,
    }

    fn fixture() -> Fixture {
        let router = Router::new();
        let doc = Rc::new(RefCell::new(MemoryDocument::new()));
        let renderer = Rc::new(Renderer::new(router.downgrade(), Rc::clone(&doc)));
        Fixture {
            router,
            doc,
            renderer,
        }
    }

    /// Route that outputs `<p>` with the remaining identifier as text.
    fn paragraph_route(fx: &Fixture) {
        let doc = Rc::clone(&fx.doc);
        fx.router.route(Pipeline::new().then(move |req| {
            let text = String::from(req.identifier());
            let p = doc.borrow_mut().create_text_element("p", &text);
            req.set_output(p);
            Ok(())
        }));
    }

    fn attach(doc: &Rc<RefCell<MemoryDocument>>, tag: &str, id: &str, text: &str) -> ElementId {
        let mut d = doc.borrow_mut();
        let el = d.create_text_element(tag, text);
        d.set_id(&el, id);
        let body = d.body();
        d.append_child(&body, &el);
        el
    }

    #[test]
    fn writer_shows_temporary_content_until_next_navigation() {
        let fx = fixture();
        fx.router.plugin(Writer::new(Rc::clone(&fx.renderer)));
        paragraph_route(&fx);

        fx.router.dispatch("one").unwrap();
        assert_eq!(fx.doc.borrow().markup(), "<body><p id=\"one\">one</p></body>");
        assert!(fx.renderer.has_pending_restore());

        fx.router.dispatch("two").unwrap();
        assert_eq!(fx.doc.borrow().markup(), "<body><p id=\"two\">two</p></body>");
    }

    #[test]
    fn writer_replaces_existing_fragment_and_restores_it() {
        let fx = fixture();
        let original = attach(&fx.doc, "section", "about", "static");
        fx.router.plugin(Writer::new(Rc::clone(&fx.renderer)));
        paragraph_route(&fx);

        fx.router.dispatch("about").unwrap();
        assert_eq!(fx.doc.borrow().markup(), "<body><p id=\"about\">about</p></body>");
        assert!(!fx.doc.borrow().is_attached(original));

        fx.router.dispatch("elsewhere").unwrap();
        assert_eq!(
            fx.doc.borrow().markup(),
            "<body><section id=\"about\">static</section><p id=\"elsewhere\">elsewhere</p></body>"
        );
        assert!(fx.doc.borrow().is_attached(original));
    }

    #[test]
    fn appender_keeps_content() {
        let fx = fixture();
        fx.router.plugin(Appender::new(Rc::clone(&fx.renderer)));
        paragraph_route(&fx);

        fx.router.dispatch("a").unwrap();
        fx.router.dispatch("b").unwrap();
        assert_eq!(
            fx.doc.borrow().markup(),
            "<body><p id=\"a\">a</p><p id=\"b\">b</p></body>"
        );
        assert!(!fx.renderer.has_pending_restore());
    }

    #[test]
    fn id_is_the_full_identifier() {
        let fx = fixture();
        fx.router.plugin(Writer::new(Rc::clone(&fx.renderer)));
        paragraph_route(&fx);
        let options = ListenOptions::new().with_prefix("app/");
        fx.router.dispatch_with("app/page", &options).unwrap();
        assert_eq!(
            fx.doc.borrow().markup(),
            "<body><p id=\"app/page\">page</p></body>"
        );
    }

    #[test]
    fn skipped_attempts_render_nothing() {
        let fx = fixture();
        fx.router.plugin(Writer::new(Rc::clone(&fx.renderer)));
        let doc = Rc::clone(&fx.doc);
        fx.router.route(Pipeline::new().then(move |req| {
            let p = doc.borrow_mut().create_text_element("p", "skipped");
            req.set_output(p);
            req.raise(Control::NextRoute);
            Ok(())
        }));
        fx.router.dispatch("x").unwrap();
        assert_eq!(fx.doc.borrow().markup(), "<body></body>");
    }

    #[test]
    fn deferred_actions_still_see_the_output() {
        let fx = fixture();
        fx.router.plugin(Writer::new(Rc::clone(&fx.renderer)));
        let seen = Rc::new(RefCell::new(None));
        let (doc, sink) = (Rc::clone(&fx.doc), Rc::clone(&seen));
        let router = fx.router.downgrade();
        fx.router.route(Pipeline::new().then(move |req| {
            let p = doc.borrow_mut().create_text_element("p", "kept");
            req.set_output(p);
            let (sink, router) = (Rc::clone(&sink), router.clone());
            req.defer(move || {
                let request = router.current_request().ok_or(HandlerError::message("gone"))?;
                let output = request
                    .with(|req| req.output::<ElementId>().copied())
                    .map_err(|_| HandlerError::message("in use"))?;
                *sink.borrow_mut() = output;
                Ok(())
            });
            Ok(())
        }));
        assert!(fx.router.dispatch("x").unwrap().is_committed());
        let rendered = fx.doc.borrow().element_by_id("x");
        assert!(rendered.is_some());
        assert_eq!(*seen.borrow(), rendered);
    }

    #[test]
    fn plugin_without_output_leaves_document_alone() {
        let fx = fixture();
        fx.router.plugin(Writer::new(Rc::clone(&fx.renderer)));
        fx.router.route(Pipeline::new().then(|_| Ok(())));
        fx.router.dispatch("x").unwrap();
        assert_eq!(fx.doc.borrow().markup(), "<body></body>");
    }
}
