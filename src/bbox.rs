//! Bounding boxes of shape markup
//!
//! Only `path`, `rect` and the containers (`g`, `svg`) contribute vertices.
//! Circles, ellipses, lines, polylines and polygons are walked past without
//! contributing; a face or decoration built only from those has no box.
//!
//! Curves are not solved for their extrema. Cubic segments are sampled at
//! `t = 0, 0.5, 1` per axis, and every other curve kind only contributes its
//! end point, so boxes can under-approximate strongly bulging curves.

use glam::{DVec2, dvec2};
use std::str::FromStr;
use svgtypes::{PathParser, PathSegment};

use crate::svg::Element;
use crate::types::{BoundingBox, Bounds};

/// Parameter values at which cubic segments are sampled.
const BEZIER_SAMPLES: [f64; 3] = [0.0, 0.5, 1.0];

/// Compute the axis-aligned bounding box of `element` and its descendants,
/// in `element`'s own coordinate space (transforms are not applied).
///
/// Returns `None` when no vertex was contributed.
pub fn compute_bounding_box(element: &Element) -> Option<BoundingBox> {
    let mut bounds = Bounds::new();
    crate::log::trace!(id = element.id().unwrap_or(""), "bbox");
    process_element(element, &mut bounds);
    bounds.finish()
}

fn process_element(element: &Element, bounds: &mut Bounds) {
    match element.tag.as_str() {
        "path" => process_path(element, bounds),
        "rect" => process_rect(element, bounds),
        "g" | "svg" => {
            for child in element.elements() {
                process_element(child, bounds);
            }
        }
        _ => {}
    }
}

fn contribute(bounds: &mut Bounds, p: DVec2) {
    crate::log::trace!(x = p.x, y = p.y, "vertex");
    bounds.expand_point(p);
}

/// Numeric value of a length attribute, ignoring any unit suffix.
/// Missing or unparsable values count as zero.
fn number_attr(element: &Element, name: &str) -> f64 {
    element
        .attr(name)
        .and_then(|v| svgtypes::Length::from_str(v.trim()).ok())
        .map(|l| l.number)
        .unwrap_or(0.0)
}

fn process_rect(element: &Element, bounds: &mut Bounds) {
    let x = number_attr(element, "x");
    let y = number_attr(element, "y");
    let w = number_attr(element, "width");
    let h = number_attr(element, "height");

    contribute(bounds, dvec2(x, y));
    contribute(bounds, dvec2(x + w, y));
    contribute(bounds, dvec2(x + w, y + h));
    contribute(bounds, dvec2(x, y + h));
}

/// Value of the cubic Bézier basis for one axis.
pub fn bezier_point(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    mt * mt * mt * p0 + 3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t * p3
}

/// Sampled values of a cubic Bézier along one axis.
pub fn bezier_samples(p0: f64, p1: f64, p2: f64, p3: f64) -> [f64; 3] {
    BEZIER_SAMPLES.map(|t| bezier_point(p0, p1, p2, p3, t))
}

fn process_path(element: &Element, bounds: &mut Bounds) {
    let Some(d) = element.attr("d") else {
        return;
    };
    walk_path(d, |p| contribute(bounds, p));
}

/// Interpret path data, reporting every contributed vertex to `emit`.
fn walk_path(d: &str, mut emit: impl FnMut(DVec2)) {
    let mut current = DVec2::ZERO;
    let mut subpath_start = DVec2::ZERO;

    // Resolve a command's coordinates against the current point
    let resolve = |abs: bool, current: DVec2, x: f64, y: f64| {
        if abs { dvec2(x, y) } else { current + dvec2(x, y) }
    };

    for segment in PathParser::from(d) {
        let segment = match segment {
            Ok(segment) => segment,
            Err(e) => {
                crate::log::warn!(error = %e, "malformed path data, ignoring the rest");
                break;
            }
        };
        crate::log::trace!(?segment, "cmd");

        match segment {
            PathSegment::MoveTo { abs, x, y } => {
                current = resolve(abs, current, x, y);
                subpath_start = current;
                emit(current);
            }
            PathSegment::LineTo { abs, x, y } => {
                current = resolve(abs, current, x, y);
                emit(current);
            }
            PathSegment::HorizontalLineTo { abs, x } => {
                current.x = if abs { x } else { current.x + x };
                emit(current);
            }
            PathSegment::VerticalLineTo { abs, y } => {
                current.y = if abs { y } else { current.y + y };
                emit(current);
            }
            PathSegment::CurveTo {
                abs,
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let p0 = current;
                let p1 = resolve(abs, current, x1, y1);
                let p2 = resolve(abs, current, x2, y2);
                let p3 = resolve(abs, current, x, y);
                for bx in bezier_samples(p0.x, p1.x, p2.x, p3.x) {
                    emit(dvec2(bx, p0.y));
                }
                for by in bezier_samples(p0.y, p1.y, p2.y, p3.y) {
                    emit(dvec2(p0.x, by));
                }
                current = p3;
                emit(current);
            }
            PathSegment::SmoothCurveTo { abs, x, y, .. }
            | PathSegment::Quadratic { abs, x, y, .. }
            | PathSegment::SmoothQuadratic { abs, x, y, .. }
            | PathSegment::EllipticalArc { abs, x, y, .. } => {
                current = resolve(abs, current, x, y);
                emit(current);
            }
            PathSegment::ClosePath { .. } => {
                current = subpath_start;
            }
        }
    }
}
