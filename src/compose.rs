//! Diagram composition
//!
//! A request names 3D shapes and, per face, the 2D decorations to put on
//! them. Each 3D shape becomes an instance group centered on the canvas; each
//! decoration is fitted into its face's bounding box and appended to the
//! instance as a transformed group of primitives.

use glam::DVec2;
use serde::Deserialize;

use crate::bbox::compute_bounding_box;
use crate::errors::{ComposeError, DecorationError, PositioningError};
use crate::extract::{IdGenerator, extract_primitives};
use crate::fit::try_fit_shape_to_face;
use crate::library::{ShapeDefinition, ShapeLibrary};
use crate::svg::{Element, Node, SVG_NS, fmt_num, parse_markup};
use crate::types::{BoundingBox, FaceSlot, Transform};

const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Root attributes of a 3D shape that are not carried onto its instance group.
/// Namespace declarations (`xmlns:*`) are carried, ahead of the id, the way a
/// parser reports them.
const INSTANCE_SKIPPED_ATTRS: &[&str] = &[
    "width",
    "height",
    "viewBox",
    "x",
    "y",
    "version",
    "preserveAspectRatio",
    "id",
    "transform",
];

/// One 3D shape instance in a request
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ObjectSpec {
    pub shape: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub top: Vec<String>,
    #[serde(default)]
    pub front: Vec<String>,
    #[serde(default)]
    pub side: Vec<String>,
}

impl ObjectSpec {
    pub fn new(shape: impl Into<String>) -> Self {
        ObjectSpec {
            shape: shape.into(),
            ..Default::default()
        }
    }

    /// Decoration names requested for `face`, in order
    pub fn decorations(&self, face: FaceSlot) -> &[String] {
        match face {
            FaceSlot::Top => &self.top,
            FaceSlot::Front => &self.front,
            FaceSlot::Side => &self.side,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CompositionRequest {
    pub objects: Vec<ObjectSpec>,
    #[serde(default)]
    pub debug: bool,
}

impl CompositionRequest {
    pub fn from_json(text: &str) -> Result<Self, ComposeError> {
        serde_json::from_str(text).map_err(|e| ComposeError::InvalidRequest {
            message: e.to_string(),
        })
    }
}

/// Canvas and overlay settings
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComposeOptions {
    /// Side of the square canvas
    pub canvas_size: f64,
    /// Scale applied to every 3D instance
    pub magnification: f64,
    /// Draw face and decoration boxes even when the request doesn't ask
    pub debug_overlay: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        ComposeOptions {
            canvas_size: 1000.0,
            magnification: 3.0,
            debug_overlay: false,
        }
    }
}

/// The composed output
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeDocument {
    root: Element,
}

impl CompositeDocument {
    /// The `<svg>` canvas element
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Instance groups, in request order
    pub fn instances(&self) -> impl Iterator<Item = &Element> {
        self.root.elements()
    }

    pub fn into_element(self) -> Element {
        self.root
    }

    pub fn to_svg_string(&self) -> String {
        self.root.to_svg_string()
    }
}

/// A decoration ready to append to its instance
struct PlacedDecoration {
    group: Element,
    face_box: BoundingBox,
    placed_box: BoundingBox,
}

/// Compose a request against `library`.
///
/// Every referenced 3D shape must exist and parse, otherwise nothing is
/// produced. Decorations that cannot be placed are logged and skipped.
pub fn compose(
    library: &ShapeLibrary,
    request: &CompositionRequest,
    options: &ComposeOptions,
) -> Result<CompositeDocument, ComposeError> {
    let shapes = request
        .objects
        .iter()
        .map(|obj| {
            library
                .resolve(&obj.shape)
                .ok_or_else(|| ComposeError::ShapeNotFound {
                    name: obj.shape.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let debug = options.debug_overlay || request.debug;
    let size = fmt_num(options.canvas_size);
    let mut canvas = Element::new("svg")
        .with_attr("xmlns", SVG_NS)
        .with_attr("xmlns:xlink", XLINK_NS)
        .with_attr("width", size.as_str())
        .with_attr("height", size.as_str())
        .with_attr("viewBox", format!("0 0 {size} {size}"));

    for (index, (obj, def)) in request.objects.iter().zip(shapes).enumerate() {
        let instance = compose_instance(library, index, obj, def, options, debug)?;
        canvas.children.push(Node::Element(instance));
    }

    crate::log::debug!(
        objects = request.objects.len(),
        debug = options.debug_overlay || request.debug,
        "composed diagram"
    );
    Ok(CompositeDocument { root: canvas })
}

fn compose_instance(
    library: &ShapeLibrary,
    index: usize,
    obj: &ObjectSpec,
    def: &ShapeDefinition,
    options: &ComposeOptions,
    debug: bool,
) -> Result<Element, ComposeError> {
    let markup = library.markup(def)?;
    let root = parse_markup(&def.name, &markup)?;

    let id = match obj.name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("shape_{index}"),
    };
    let bbox = compute_bounding_box(&root);
    if bbox.is_none() {
        crate::log::warn!(shape = %def.name, "no bounding box for 3D shape, using default position");
    }
    let placement = instance_placement(bbox.as_ref(), options);

    let mut group = Element::new("g")
        .with_namespaces_of(&root)
        .with_attr("id", id.as_str())
        .with_attr("transform", placement.to_string());
    for (name, value) in &root.attrs {
        if !name.starts_with("xmlns:") && !INSTANCE_SKIPPED_ATTRS.contains(&name.as_str()) {
            group.attrs.push((name.clone(), value.clone()));
        }
    }
    group.children = root.children.clone();

    for slot in FaceSlot::ALL {
        let names = obj.decorations(slot);
        if names.is_empty() {
            continue;
        }
        let Some(face) = root.find_by_id(&slot.element_id()) else {
            crate::log::debug!(instance = %id, face = %slot, "shape has no such face");
            continue;
        };
        let face_box = compute_bounding_box(face);

        for (n, name) in names.iter().enumerate() {
            let mut ids = IdGenerator::new(format!("{id}-{slot}-{n}"));
            match place_decoration(library, name, face_box.as_ref(), &mut ids) {
                Ok(placed) => {
                    crate::log::debug!(
                        instance = %id,
                        face = %slot,
                        decoration = %name,
                        transform = %placed.group.attr("transform").unwrap_or(""),
                        "placed decoration"
                    );
                    if debug {
                        group.children.push(Node::Element(outline(&placed.face_box, "red")));
                        group
                            .children
                            .push(Node::Element(outline(&placed.placed_box, "blue")));
                    }
                    let mut deco = placed.group;
                    deco.attrs.retain(|(k, v)| {
                        !k.starts_with("xmlns:") || group.attr(k) != Some(v.as_str())
                    });
                    group.children.push(Node::Element(deco));
                }
                Err(_e) => {
                    crate::log::warn!(
                        instance = %id,
                        face = %slot,
                        decoration = %name,
                        error = %_e,
                        "skipping decoration"
                    );
                }
            }
        }
    }

    Ok(group)
}

/// Transform that centers a 3D shape's box on the canvas, magnified.
///
/// The magnified box center lands on the canvas center. This is not the
/// same as `translate(canvas/2 - w/2, canvas/2 - h/2)`, which ignores the box
/// origin and the magnification: a 0..100 cube goes to (350, 350) here and
/// would go to (450, 450) that way.
fn instance_placement(bbox: Option<&BoundingBox>, options: &ComposeOptions) -> Transform {
    let half = DVec2::splat(options.canvas_size / 2.0);
    let offset = match bbox {
        Some(b) => half - b.center() * options.magnification,
        None => half,
    };
    Transform::new(offset.x, offset.y, options.magnification)
}

fn place_decoration(
    library: &ShapeLibrary,
    name: &str,
    face_box: Option<&BoundingBox>,
    ids: &mut IdGenerator,
) -> Result<PlacedDecoration, DecorationError> {
    let def = library
        .resolve(name)
        .ok_or_else(|| DecorationError::NotFound {
            name: name.to_string(),
        })?;
    let markup = library.markup(def)?;
    let root = parse_markup(&def.name, &markup)?;

    let shape_box = compute_bounding_box(&root).ok_or(PositioningError::MissingShapeBounds)?;
    let face_box = *face_box.ok_or(PositioningError::MissingFaceBounds)?;
    let fit = try_fit_shape_to_face(Some(&shape_box), Some(&face_box))?;
    let anchored = fit.anchored_at(&shape_box);

    let group = Element::new("g")
        .with_namespaces_of(&root)
        .with_attr("transform", anchored.to_string())
        .with_children(
            extract_primitives(&root, ids)
                .into_iter()
                .map(|p| p.into_element()),
        );

    Ok(PlacedDecoration {
        group,
        face_box,
        placed_box: anchored.apply_box(&shape_box),
    })
}

/// Unfilled outline rect for the debug overlay
fn outline(b: &BoundingBox, color: &str) -> Element {
    Element::new("rect")
        .with_attr("x", fmt_num(b.x))
        .with_attr("y", fmt_num(b.y))
        .with_attr("width", fmt_num(b.width))
        .with_attr("height", fmt_num(b.height))
        .with_attr("fill", "none")
        .with_attr("stroke", color)
        .with_attr("stroke-width", "1")
        .with_attr("vector-effect", "non-scaling-stroke")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{ShapeDefinition, ShapeKind};

    const CUBE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 60 60" class="iso">
        <path id="top-face" d="M 0 0 L 40 0 L 40 20 L 0 20 Z" fill="#ddd"/>
        <rect id="front-face" x="0" y="20" width="40" height="40"/>
        <g id="side"><path id="side-face" d="M 40 20 L 60 20 L 60 60 L 40 60 Z"/></g>
    </svg>"##;

    const BADGE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg">
        <rect x="10" y="10" width="20" height="10" fill="gold"/>
    </svg>"#;

    const DOT: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><circle r="4"/></svg>"#;

    const CAPTION: &str = r#"<svg xmlns="http://www.w3.org/2000/svg">
        <g transform="translate(2,0)">
            <rect x="0" y="0" width="20" height="10"/>
            <text x="1" y="8">Hi</text>
        </g>
    </svg>"#;

    const INK: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape">
        <rect inkscape:label="mark" width="4" height="2"/>
    </svg>"#;

    fn library() -> ShapeLibrary {
        ShapeLibrary::from_definitions([
            ShapeDefinition::inline("cube", ShapeKind::ThreeD, FaceSlot::ALL, CUBE),
            ShapeDefinition::inline("badge", ShapeKind::TwoD, FaceSlot::ALL, BADGE),
            ShapeDefinition::inline("dot", ShapeKind::TwoD, [FaceSlot::Top], DOT),
            ShapeDefinition::inline("broken", ShapeKind::TwoD, [FaceSlot::Top], "<svg><g></svg>"),
            ShapeDefinition::inline("empty", ShapeKind::ThreeD, [], "<svg/>"),
            ShapeDefinition::inline("caption", ShapeKind::TwoD, [FaceSlot::Top], CAPTION),
            ShapeDefinition::inline("ink", ShapeKind::TwoD, [FaceSlot::Top], INK),
        ])
    }

    fn cube_with(top: &[&str]) -> CompositionRequest {
        CompositionRequest {
            objects: vec![ObjectSpec {
                name: Some("box".to_string()),
                top: top.iter().map(|s| s.to_string()).collect(),
                ..ObjectSpec::new("cube")
            }],
            debug: false,
        }
    }

    fn decoration_groups(instance: &Element) -> Vec<&Element> {
        instance
            .elements()
            .filter(|e| e.tag == "g" && e.id().is_none())
            .collect()
    }

    #[test]
    fn missing_shape_aborts_request() {
        let mut request = cube_with(&[]);
        request.objects.push(ObjectSpec::new("pyramid"));
        let err = compose(&library(), &request, &ComposeOptions::default()).unwrap_err();
        assert!(matches!(err, ComposeError::ShapeNotFound { ref name } if name == "pyramid"));
        assert_eq!(err.to_string(), "Shape pyramid not found in library");
    }

    #[test]
    fn instance_is_centered_and_magnified() {
        let doc = compose(&library(), &cube_with(&[]), &ComposeOptions::default()).unwrap();
        let instance = doc.instances().next().unwrap();
        assert_eq!(instance.id(), Some("box"));
        // cube box is 0..60 on both axes, so the center (30,30) * 3 lands on 500
        assert_eq!(instance.attr("transform"), Some("translate(410, 410) scale(3)"));
        assert_eq!(instance.attr("class"), Some("iso"));
        assert_eq!(instance.attr("viewBox"), None);
    }

    #[test]
    fn unnamed_instances_use_their_index() {
        let request = CompositionRequest {
            objects: vec![ObjectSpec::new("cube"), ObjectSpec::new("cube")],
            debug: false,
        };
        let doc = compose(&library(), &request, &ComposeOptions::default()).unwrap();
        let ids: Vec<_> = doc.instances().map(|e| e.id().unwrap()).collect();
        assert_eq!(ids, vec!["shape_0", "shape_1"]);
    }

    #[test]
    fn shape_without_box_gets_default_position() {
        let request = CompositionRequest {
            objects: vec![ObjectSpec::new("empty")],
            debug: false,
        };
        let doc = compose(&library(), &request, &ComposeOptions::default()).unwrap();
        let instance = doc.instances().next().unwrap();
        assert_eq!(instance.attr("transform"), Some("translate(500, 500) scale(3)"));
    }

    #[test]
    fn top_decoration_lands_inside_top_face() {
        let doc = compose(&library(), &cube_with(&["badge"]), &ComposeOptions::default()).unwrap();
        let instance = doc.instances().next().unwrap();
        let groups = decoration_groups(instance);
        assert_eq!(groups.len(), 1);

        // badge box (10,10,20,10) scaled by 2 fills the 40x20 top face exactly
        assert_eq!(groups[0].attr("transform"), Some("translate(-20, -20) scale(2)"));
        let rect = groups[0].elements().next().unwrap();
        assert_eq!(rect.id(), Some("box-top-0-0"));

        let badge = BoundingBox::new(10.0, 10.0, 20.0, 10.0);
        let placed = Transform::new(-20.0, -20.0, 2.0).apply_box(&badge);
        let top_face = BoundingBox::new(0.0, 0.0, 40.0, 20.0);
        assert!(top_face.contains_box(&placed, 1e-9));
    }

    #[test]
    fn bad_decorations_are_skipped() {
        let doc = compose(
            &library(),
            &cube_with(&["nope", "dot", "broken", "badge"]),
            &ComposeOptions::default(),
        )
        .unwrap();
        let instance = doc.instances().next().unwrap();
        let groups = decoration_groups(instance);
        assert_eq!(groups.len(), 1);
        // the surviving decoration is the fourth one listed
        assert_eq!(groups[0].elements().next().unwrap().id(), Some("box-top-3-0"));
    }

    #[test]
    fn faces_missing_from_shape_are_ignored() {
        let mut request = cube_with(&[]);
        request.objects[0].shape = "empty".to_string();
        request.objects[0].front = vec!["badge".to_string()];
        let doc = compose(&library(), &request, &ComposeOptions::default()).unwrap();
        assert_eq!(doc.instances().next().unwrap().children.len(), 0);
    }

    #[test]
    fn debug_adds_outline_rects() {
        let mut request = cube_with(&["badge"]);
        request.debug = true;
        let doc = compose(&library(), &request, &ComposeOptions::default()).unwrap();
        let instance = doc.instances().next().unwrap();
        let outlines: Vec<_> = instance
            .elements()
            .filter(|e| e.attr("vector-effect") == Some("non-scaling-stroke"))
            .collect();
        assert_eq!(outlines.len(), 2);
        assert_eq!(outlines[0].attr("stroke"), Some("red"));
        assert_eq!(outlines[0].attr("width"), Some("40"));
        assert_eq!(outlines[1].attr("stroke"), Some("blue"));
        assert_eq!(outlines[1].attr("height"), Some("20"));

        let plain = compose(&library(), &cube_with(&["badge"]), &ComposeOptions::default()).unwrap();
        assert_eq!(plain.root().count_tag("rect"), doc.root().count_tag("rect") - 2);
    }

    #[test]
    fn composition_is_reproducible() {
        let request = cube_with(&["badge", "badge"]);
        let lib = library();
        let options = ComposeOptions::default();
        let first = compose(&lib, &request, &options).unwrap().to_svg_string();
        let second = compose(&lib, &request, &options).unwrap().to_svg_string();
        assert_eq!(first, second);
    }

    #[test]
    fn text_inside_decoration_groups_is_kept() {
        let doc = compose(&library(), &cube_with(&["caption"]), &ComposeOptions::default()).unwrap();
        let instance = doc.instances().next().unwrap();
        let groups = decoration_groups(instance);
        assert_eq!(groups.len(), 1);

        let children: Vec<_> = groups[0].elements().collect();
        let tags: Vec<_> = children.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["rect", "text"]);
        assert_eq!(children[1].attr("transform"), Some("translate(2,0)"));
        assert_eq!(children[1].id(), Some("box-top-0-1"));
        assert_eq!(children[1].children, vec![Node::Text("Hi".to_string())]);
    }

    #[test]
    fn decoration_namespaces_are_declared() {
        let doc = compose(&library(), &cube_with(&["ink"]), &ComposeOptions::default()).unwrap();
        let instance = doc.instances().next().unwrap();
        let group = decoration_groups(instance)[0];
        assert_eq!(
            group.attr("xmlns:inkscape"),
            Some("http://www.inkscape.org/namespaces/inkscape")
        );
        let rect = group.elements().next().unwrap();
        assert_eq!(rect.attr("inkscape:label"), Some("mark"));

        let svg = doc.to_svg_string();
        let reparsed = parse_markup("composite", &svg).unwrap();
        assert_eq!(reparsed.children, doc.root().children);
    }

    #[test]
    fn request_json_defaults() {
        let request =
            CompositionRequest::from_json(r#"{"objects":[{"shape":"cube","side":["badge"]}]}"#)
                .unwrap();
        assert!(!request.debug);
        assert_eq!(request.objects[0].name, None);
        assert_eq!(
            request.objects[0].decorations(FaceSlot::Side).to_vec(),
            vec!["badge".to_string()]
        );
        assert!(request.objects[0].decorations(FaceSlot::Top).is_empty());
    }

    #[test]
    fn invalid_json_is_invalid_request() {
        let err = CompositionRequest::from_json(r#"{"objects": 3}"#).unwrap_err();
        assert!(matches!(err, ComposeError::InvalidRequest { .. }));
    }
}
