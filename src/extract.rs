//! Primitive extraction
//!
//! Flattens a shape's element tree into the ordered list of drawable
//! primitives it contains. Group transforms are pushed down onto the leaves
//! as text, outermost first, so `<g transform="A"><g transform="B"><rect
//! transform="C"/></g></g>` yields a rect carrying `transform="A B C"`.
//! Other group attributes are not inherited.
//!
//! Only the root's direct children are filtered by tag. Inside a group every
//! element is kept (text, `use`, images...), as [`PrimitiveKind::Other`].

use crate::svg::Element;

/// Tags that are copied as primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Path,
    Rect,
    Circle,
    Ellipse,
    Line,
    Polyline,
    Polygon,
    /// Any other element found inside a group
    Other,
}

impl PrimitiveKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "path" => PrimitiveKind::Path,
            "rect" => PrimitiveKind::Rect,
            "circle" => PrimitiveKind::Circle,
            "ellipse" => PrimitiveKind::Ellipse,
            "line" => PrimitiveKind::Line,
            "polyline" => PrimitiveKind::Polyline,
            "polygon" => PrimitiveKind::Polygon,
            _ => return None,
        })
    }

    pub fn is_drawable(self) -> bool {
        self != PrimitiveKind::Other
    }
}

/// One drawable element, detached from its original tree
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    /// The cloned element, with its id and accumulated transform applied
    pub element: Element,
}

impl Primitive {
    pub fn tag(&self) -> &str {
        &self.element.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.element.id()
    }

    /// Accumulated transform, ancestors first
    pub fn transform(&self) -> Option<&str> {
        self.element.attr("transform")
    }

    pub fn into_element(self) -> Element {
        self.element
    }
}

/// Deterministic source of ids for primitives that lack one.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: String,
    next: usize,
}

impl IdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        IdGenerator {
            prefix: prefix.into(),
            next: 0,
        }
    }

    pub fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// Collect the primitives of `root` in document order.
///
/// Direct drawable children are cloned as-is; groups are flattened with their
/// transforms composed onto each descendant. Other direct children of the root
/// are ignored.
pub fn extract_primitives(root: &Element, ids: &mut IdGenerator) -> Vec<Primitive> {
    let mut out = Vec::new();
    for child in root.elements() {
        if let Some(kind) = PrimitiveKind::from_tag(&child.tag) {
            out.push(make_primitive(kind, child, None, ids));
        } else if child.tag == "g" {
            flatten_group(child, None, ids, &mut out);
        }
    }
    crate::log::debug!(count = out.len(), "extracted primitives");
    out
}

fn flatten_group(
    group: &Element,
    outer: Option<&str>,
    ids: &mut IdGenerator,
    out: &mut Vec<Primitive>,
) {
    let transform = compose_transforms(outer, group.attr("transform"));
    for child in group.elements() {
        if child.tag == "g" {
            flatten_group(child, transform.as_deref(), ids, out);
        } else {
            let kind = PrimitiveKind::from_tag(&child.tag).unwrap_or(PrimitiveKind::Other);
            out.push(make_primitive(kind, child, transform.as_deref(), ids));
        }
    }
}

fn make_primitive(
    kind: PrimitiveKind,
    source: &Element,
    outer: Option<&str>,
    ids: &mut IdGenerator,
) -> Primitive {
    let mut element = source.clone();
    if outer.is_some() {
        if let Some(t) = compose_transforms(outer, source.attr("transform")) {
            element.set_attr("transform", t);
        }
    }
    if element.id().is_none_or(str::is_empty) {
        element.set_attr("id", ids.next_id());
    }
    Primitive { kind, element }
}

/// Join two transform lists, outer first. Empty parts are dropped.
pub fn compose_transforms(outer: Option<&str>, inner: Option<&str>) -> Option<String> {
    let joined = [outer, inner]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!joined.is_empty()).then_some(joined)
}
