//! Markup parsing

use roxmltree::{Document, ParsingOptions};

use super::{Element, Node, SVG_NS};
use crate::errors::{ExtractionError, SourceContext};

const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Parse raw shape markup into an owned element tree.
///
/// The document element must be `<svg>`. Comments, processing instructions and
/// whitespace-only text are dropped. `name` is only used for diagnostics.
///
/// Names outside the SVG namespace keep their prefix (`inkscape:label`), and
/// each element carries `xmlns:prefix` for the namespaces it introduces, so
/// any subtree serializes on its own. `xlink` and `xml` are never declared
/// here; the composite canvas declares `xlink`.
pub fn parse_markup(name: &str, markup: &str) -> Result<Element, ExtractionError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(markup, options).map_err(|e| {
        let ctx = SourceContext::new(name, markup);
        let pos = e.pos();
        let offset = ctx.offset_of(pos.row, pos.col);
        ExtractionError::Malformed {
            shape: name.to_string(),
            message: e.to_string(),
            src: ctx.named_source(),
            span: offset.into(),
        }
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(ExtractionError::NotSvg {
            shape: name.to_string(),
            found: root.tag_name().name().to_string(),
        });
    }

    Ok(build_element(root))
}

/// `prefix:name` for a name in a foreign namespace, plain `name` otherwise
fn qualified_name(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, name: &str) -> String {
    let prefix = match namespace {
        None | Some(SVG_NS) => None,
        Some(XLINK_NS) => Some("xlink"),
        Some(XML_NS) => Some("xml"),
        Some(uri) => node.lookup_prefix(uri).filter(|p| !p.is_empty()),
    };
    match prefix {
        Some(prefix) => format!("{prefix}:{name}"),
        None => name.to_string(),
    }
}

fn build_element(node: roxmltree::Node<'_, '_>) -> Element {
    let tag = node.tag_name();
    let mut element = Element::new(qualified_name(node, tag.namespace(), tag.name()));

    for ns in node.namespaces() {
        let Some(prefix) = ns.name() else { continue };
        if prefix == "xml" || prefix == "xlink" {
            continue;
        }
        let inherited = node
            .parent_element()
            .and_then(|parent| parent.lookup_namespace_uri(Some(prefix)));
        if inherited != Some(ns.uri()) {
            element
                .attrs
                .push((format!("xmlns:{prefix}"), ns.uri().to_string()));
        }
    }

    for a in node.attributes() {
        let key = qualified_name(node, a.namespace(), a.name());
        element.attrs.push((key, a.value().to_string()));
    }
    for child in node.children() {
        if child.is_element() {
            element.children.push(Node::Element(build_element(child)));
        } else if child.is_text() {
            let text = child.text().unwrap_or_default();
            if !text.trim().is_empty() {
                element.children.push(Node::Text(text.to_string()));
            }
        }
    }
    element
}
