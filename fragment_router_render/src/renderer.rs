// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The renderer: places a pipeline's output in the document and undoes it later.
//!
//! ## Writing
//!
//! [`Renderer::write`] gives the element the current request's full identifier as
//! its id. If the document already holds an element with that id, the new element
//! takes its place and the original is remembered. Otherwise the element is appended
//! to the container as temporary content. [`Renderer::restore`] removes temporary
//! content and puts replaced originals back, most recent first.
//!
//! [`Renderer::append`] also assigns the id, but appends permanently.
//!
//! Both need an attempt in flight on the renderer's router and fail with
//! [`RenderError::NoRequest`] otherwise.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use fragment_router::{Request, RouteError, WeakRouter};
use thiserror::Error;

use crate::document::Document;

/// Errors reported by [`Renderer`].
#[derive(Copy, Clone, Debug, Error, Eq, PartialEq)]
pub enum RenderError {
    /// The router is gone or has no attempt in flight.
    #[error("null request: no attempt is in flight for the renderer's router")]
    NoRequest,
    /// The in-flight request could not be read.
    #[error(transparent)]
    Request(#[from] RouteError),
}

/// Renderer configuration.
#[derive(Clone, Debug)]
pub struct RendererOptions<E> {
    /// Where new content is appended; the document body when `None`.
    pub container: Option<E>,
}

impl<E> Default for RendererOptions<E> {
    fn default() -> Self {
        Self { container: None }
    }
}

/// Draws pipeline output into a shared document.
pub struct Renderer<D: Document> {
    router: WeakRouter,
    document: Rc<RefCell<D>>,
    container: D::Element,
    temporary: RefCell<Vec<D::Element>>,
    replaced: RefCell<Vec<(D::Element, D::Element)>>,
}

impl<D: Document> core::fmt::Debug for Renderer<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Renderer")
            .field("router", &self.router)
            .field("temporary", &self.temporary.borrow().len())
            .field("replaced", &self.replaced.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<D: Document> Renderer<D> {
    /// A renderer appending to the document body.
    pub fn new(router: WeakRouter, document: Rc<RefCell<D>>) -> Self {
        Self::with_options(router, document, RendererOptions::default())
    }

    /// A renderer configured by `options`.
    pub fn with_options(
        router: WeakRouter,
        document: Rc<RefCell<D>>,
        options: RendererOptions<D::Element>,
    ) -> Self {
        let container = match options.container {
            Some(container) => container,
            None => document.borrow().body(),
        };
        Self {
            router,
            document,
            container,
            temporary: RefCell::new(Vec::new()),
            replaced: RefCell::new(Vec::new()),
        }
    }

    /// The element new content is appended to.
    pub fn container(&self) -> &D::Element {
        &self.container
    }

    /// The router whose in-flight request names the written fragments.
    pub fn router(&self) -> &WeakRouter {
        &self.router
    }

    /// The shared document.
    pub fn document(&self) -> &Rc<RefCell<D>> {
        &self.document
    }

    /// Replace the current fragment with `element`, or show it temporarily.
    pub fn write(&self, element: D::Element) -> Result<(), RenderError> {
        let id = self.current_id()?;
        self.restore();
        let mut document = self.document.borrow_mut();
        document.set_id(&element, &id);
        match document.element_by_id(&id) {
            Some(original) if original != element => {
                if document.replace_with(&original, &element) {
                    self.replaced.borrow_mut().push((original, element));
                }
            }
            Some(_) => {}
            None => {
                document.append_child(&self.container, &element);
                self.temporary.borrow_mut().push(element);
            }
        }
        tracing::trace!(id = id.as_str(), "wrote fragment");
        Ok(())
    }

    /// Append `element` to the container permanently.
    pub fn append(&self, element: D::Element) -> Result<(), RenderError> {
        let id = self.current_id()?;
        self.restore();
        let mut document = self.document.borrow_mut();
        document.set_id(&element, &id);
        document.append_child(&self.container, &element);
        tracing::trace!(id = id.as_str(), "appended fragment");
        Ok(())
    }

    /// Remove temporary content and put replaced elements back.
    pub fn restore(&self) {
        let mut document = self.document.borrow_mut();
        for element in self.temporary.borrow_mut().drain(..).rev() {
            document.remove(&element);
        }
        for (original, replacement) in self.replaced.borrow_mut().drain(..).rev() {
            document.replace_with(&replacement, &original);
        }
    }

    /// Whether any written content is waiting to be restored.
    pub fn has_pending_restore(&self) -> bool {
        !self.temporary.borrow().is_empty() || !self.replaced.borrow().is_empty()
    }

    fn current_id(&self) -> Result<String, RenderError> {
        let router = self.router.upgrade().ok_or(RenderError::NoRequest)?;
        let request = router.current_request_or(RenderError::NoRequest)?;
        Ok(request.with(Request::full_identifier)?)
    }
}
