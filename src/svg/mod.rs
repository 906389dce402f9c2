//! Owned SVG element trees
//!
//! This module is organized into submodules:
//! - `parse`: raw markup to [`Element`] via roxmltree
//! - `write`: [`Element`] back to SVG text
//!
//! Trees are plain values. Composition builds new trees out of clones of the
//! parsed shapes instead of editing them in place.

pub mod parse;
pub mod write;

pub use parse::parse_markup;
pub use write::fmt_num;

/// SVG namespace URI
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// A node in an element tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An SVG element with ordered attributes and children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child appender
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Copies the `xmlns:prefix` declarations of `other`
    pub fn with_namespaces_of(mut self, other: &Element) -> Self {
        for (name, value) in &other.attrs {
            if name.starts_with("xmlns:") {
                self.set_attr(name.clone(), value.clone());
            }
        }
        self
    }

    /// Builder-style appender for several children
    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children
            .extend(children.into_iter().map(Node::Element));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(idx).1)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Child elements, skipping text nodes
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Depth-first search of the descendants (not including `self`) for an
    /// element with the given `id`.
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        for child in self.elements() {
            if child.id() == Some(id) {
                return Some(child);
            }
            if let Some(found) = child.find_by_id(id) {
                return Some(found);
            }
        }
        None
    }

    /// Number of descendant elements with the given tag
    pub fn count_tag(&self, tag: &str) -> usize {
        self.elements()
            .map(|e| usize::from(e.tag == tag) + e.count_tag(tag))
            .sum()
    }
}
