// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Documents the renderer draws into.
//!
//! [`Document`] is the small slice of a DOM-like tree the renderer needs.
//! [`MemoryDocument`] implements it over a generational arena, for tests and
//! headless hosts.

use alloc::string::String;
use alloc::vec::Vec;

/// A tree of elements addressable by string id.
pub trait Document {
    /// Handle to one element.
    type Element: Clone + PartialEq + 'static;

    /// The default container for appended content.
    fn body(&self) -> Self::Element;

    /// The attached element whose id is `id`.
    fn element_by_id(&self, id: &str) -> Option<Self::Element>;

    /// Assign `id` to `element`.
    fn set_id(&mut self, element: &Self::Element, id: &str);

    /// Put `replacement` where `original` is, detaching `original`.
    ///
    /// Returns `false` and does nothing when `original` is not attached to a parent,
    /// or when `replacement` is `original` or one of its ancestors.
    fn replace_with(&mut self, original: &Self::Element, replacement: &Self::Element) -> bool;

    /// Append `child` as the last child of `parent`, detaching it from any previous parent.
    ///
    /// Does nothing when `child` is `parent` or one of its ancestors.
    fn append_child(&mut self, parent: &Self::Element, child: &Self::Element);

    /// Detach `element` from its parent. The element stays usable.
    fn remove(&mut self, element: &Self::Element);
}

/// Generational handle of an element in a [`MemoryDocument`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ElementId(u32, u32);

impl ElementId {
    fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Element {
    generation: u32,
    tag: String,
    id: String,
    text: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

/// In-memory [`Document`] with a `body` root.
pub struct MemoryDocument {
    elements: Vec<Option<Element>>, // slots
    generations: Vec<u32>,          // last generation per slot
    free_list: Vec<usize>,
    body: ElementId,
}

impl core::fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let alive = self.elements.iter().filter(|e| e.is_some()).count();
        f.debug_struct("MemoryDocument")
            .field("elements_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// A document holding an empty `body`.
    pub fn new() -> Self {
        let mut doc = Self {
            elements: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            body: ElementId::new(0, 1),
        };
        doc.body = doc.create_element("body");
        doc
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        let element = |generation| Element {
            generation,
            tag: tag.into(),
            id: String::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        };
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.elements[idx] = Some(element(generation));
            (idx, generation)
        } else {
            self.elements.push(Some(element(1)));
            self.generations.push(1);
            (self.elements.len() - 1, 1)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "ElementId uses 32-bit indices."
        )]
        ElementId::new(idx as u32, generation)
    }

    /// Create a detached element with text content.
    pub fn create_text_element(&mut self, tag: &str, text: &str) -> ElementId {
        let id = self.create_element(tag);
        self.set_text(id, text);
        id
    }

    /// Destroy an element and its subtree. Stale handles stop resolving.
    pub fn destroy(&mut self, id: ElementId) {
        if !self.is_alive(id) || id == self.body {
            return;
        }
        self.detach(id);
        let mut stack = alloc::vec![id];
        while let Some(next) = stack.pop() {
            if let Some(element) = self.elements[next.idx()].take() {
                stack.extend(element.children);
                self.free_list.push(next.idx());
            }
        }
    }

    /// Whether `id` refers to a live element.
    pub fn is_alive(&self, id: ElementId) -> bool {
        self.get(id).is_some()
    }

    /// Whether `id` is reachable from the body.
    pub fn is_attached(&self, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(at) = current {
            if at == self.body {
                return true;
            }
            current = self.get(at).and_then(|e| e.parent);
        }
        false
    }

    /// The element's tag.
    pub fn tag(&self, id: ElementId) -> Option<&str> {
        self.get(id).map(|e| e.tag.as_str())
    }

    /// The element's id attribute; empty when unset.
    pub fn id_of(&self, id: ElementId) -> Option<&str> {
        self.get(id).map(|e| e.id.as_str())
    }

    /// The element's text content.
    pub fn text(&self, id: ElementId) -> Option<&str> {
        self.get(id).map(|e| e.text.as_str())
    }

    /// Replace the element's text content.
    pub fn set_text(&mut self, id: ElementId, text: &str) {
        if let Some(element) = self.get_mut(id) {
            element.text.clear();
            element.text.push_str(text);
        }
    }

    /// The element's parent.
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).and_then(|e| e.parent)
    }

    /// The element's children, in order.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.get(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    /// Serialize the attached tree, e.g. `<body><p id="a">hi</p></body>`.
    pub fn markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(self.body, &mut out);
        out
    }

    fn write_markup(&self, id: ElementId, out: &mut String) {
        let Some(element) = self.get(id) else {
            return;
        };
        out.push('<');
        out.push_str(&element.tag);
        if !element.id.is_empty() {
            out.push_str(" id=\"");
            out.push_str(&element.id);
            out.push('"');
        }
        out.push('>');
        out.push_str(&element.text);
        for &child in &element.children {
            self.write_markup(child, out);
        }
        out.push_str("</");
        out.push_str(&element.tag);
        out.push('>');
    }

    /// Whether `descendant` is `ancestor` or lies below it.
    fn contains(&self, ancestor: ElementId, descendant: ElementId) -> bool {
        let mut current = Some(descendant);
        while let Some(at) = current {
            if at == ancestor {
                return true;
            }
            current = self.parent(at);
        }
        false
    }

    fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements
            .get(id.idx())?
            .as_ref()
            .filter(|e| e.generation == id.1)
    }

    fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements
            .get_mut(id.idx())?
            .as_mut()
            .filter(|e| e.generation == id.1)
    }

    fn detach(&mut self, id: ElementId) -> Option<(ElementId, usize)> {
        let parent = self.get_mut(id)?.parent.take()?;
        let siblings = &mut self.get_mut(parent)?.children;
        let index = siblings.iter().position(|&c| c == id)?;
        siblings.remove(index);
        Some((parent, index))
    }

    fn find_attached(&self, root: ElementId, id: &str) -> Option<ElementId> {
        let mut stack = alloc::vec![root];
        while let Some(next) = stack.pop() {
            let element = self.get(next)?;
            if element.id == id {
                return Some(next);
            }
            stack.extend(element.children.iter().rev());
        }
        None
    }
}

impl Document for MemoryDocument {
    type Element = ElementId;

    fn body(&self) -> ElementId {
        self.body
    }

    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        if id.is_empty() {
            return None;
        }
        self.find_attached(self.body, id)
    }

    fn set_id(&mut self, element: &ElementId, id: &str) {
        if let Some(e) = self.get_mut(*element) {
            e.id.clear();
            e.id.push_str(id);
        }
    }

    fn replace_with(&mut self, original: &ElementId, replacement: &ElementId) -> bool {
        if self.contains(*replacement, *original)
            || !self.is_alive(*replacement)
            || self.parent(*original).is_none()
        {
            return false;
        }
        self.detach(*replacement);
        let Some((parent, index)) = self.detach(*original) else {
            return false;
        };
        if let Some(e) = self.get_mut(*replacement) {
            e.parent = Some(parent);
        }
        if let Some(p) = self.get_mut(parent) {
            p.children.insert(index, *replacement);
        }
        true
    }

    fn append_child(&mut self, parent: &ElementId, child: &ElementId) {
        if !self.is_alive(*parent) || !self.is_alive(*child) || self.contains(*child, *parent) {
            return;
        }
        self.detach(*child);
        if let Some(e) = self.get_mut(*child) {
            e.parent = Some(*parent);
        }
        if let Some(p) = self.get_mut(*parent) {
            p.children.push(*child);
        }
    }

    fn remove(&mut self, element: &ElementId) {
        self.detach(*element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_has_empty_body() {
        let doc = MemoryDocument::new();
        assert_eq!(doc.markup(), "<body></body>");
        assert!(doc.is_attached(doc.body()));
    }

    #[test]
    fn element_by_id_only_finds_attached_elements() {
        let mut doc = MemoryDocument::new();
        let p = doc.create_text_element("p", "hi");
        doc.set_id(&p, "greeting");
        assert_eq!(doc.element_by_id("greeting"), None);
        let body = doc.body();
        doc.append_child(&body, &p);
        assert_eq!(doc.element_by_id("greeting"), Some(p));
        assert_eq!(doc.markup(), "<body><p id=\"greeting\">hi</p></body>");
        doc.remove(&p);
        assert_eq!(doc.element_by_id("greeting"), None);
        assert!(doc.is_alive(p));
        assert!(!doc.is_attached(p));
    }

    #[test]
    fn replace_with_keeps_position() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("c");
        doc.append_child(&body, &a);
        doc.append_child(&body, &b);
        assert!(doc.replace_with(&a, &c));
        assert_eq!(doc.children(body), &[c, b]);
        assert_eq!(doc.parent(a), None);
        assert!(doc.replace_with(&c, &a));
        assert_eq!(doc.markup(), "<body><a></a><b></b></body>");
        assert!(!doc.replace_with(&c, &b), "detached original cannot be replaced");
        assert!(!doc.replace_with(&a, &body), "an ancestor cannot replace its descendant");
    }

    #[test]
    fn append_child_refuses_to_form_a_loop() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        doc.append_child(&body, &outer);
        doc.append_child(&outer, &inner);
        doc.append_child(&outer, &body);
        doc.append_child(&inner, &outer);
        doc.append_child(&inner, &inner);
        assert_eq!(doc.parent(body), None);
        assert_eq!(doc.parent(outer), Some(body));
        assert!(doc.children(inner).is_empty());
        assert_eq!(doc.markup(), "<body><div><span></span></div></body>");
    }

    #[test]
    fn destroy_invalidates_subtree_handles() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        doc.append_child(&body, &outer);
        doc.append_child(&outer, &inner);
        doc.destroy(outer);
        assert!(!doc.is_alive(outer));
        assert!(!doc.is_alive(inner));
        assert_eq!(doc.markup(), "<body></body>");
        let reused = doc.create_element("p");
        assert_ne!(reused, outer);
        assert_eq!(doc.tag(outer), None);
        doc.destroy(body);
        assert!(doc.is_alive(body), "body is never destroyed");
    }
}
