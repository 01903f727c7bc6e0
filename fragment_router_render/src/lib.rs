// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fragment Router Render: show a committed pipeline's output in a document.
//!
//! ## Overview
//!
//! A pipeline stores the element it produced with
//! [`Request::set_output`](fragment_router::Request::set_output). A rendering plugin
//! registered on the router picks it up when the attempt commits:
//!
//! - [`Writer`](crate::plugins::Writer) swaps the element in for the fragment whose id
//!   equals the current identifier, or shows it temporarily when there is none. The
//!   next navigation undoes the change.
//! - [`Appender`](crate::plugins::Appender) appends the element permanently.
//!
//! Both go through a [`Renderer`](crate::renderer::Renderer), which can also be called
//! directly while an attempt is in flight.
//!
//! ## Documents
//!
//! Rendering targets a [`Document`](crate::document::Document). This crate ships
//! [`MemoryDocument`](crate::document::MemoryDocument), an arena-backed element tree
//! with generational [`ElementId`](crate::document::ElementId) handles.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod document;
pub mod plugins;
pub mod renderer;

pub use document::{Document, ElementId, MemoryDocument};
pub use plugins::{Appender, Writer};
pub use renderer::{RenderError, Renderer, RendererOptions};
