//! Geometry value types shared by the bounding-box, fitting and composition
//! stages.
//!
//! Points are `glam::DVec2`. Everything here is a plain `Copy` value; nothing
//! holds on to the element tree it was computed from.

use glam::{DVec2, dvec2};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::errors::PositioningError;
use crate::svg::fmt_num;

/// Running min/max accumulator used while walking an element tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

impl Bounds {
    /// Create an empty accumulator (will expand on first point)
    pub fn new() -> Self {
        Bounds {
            min: DVec2::splat(f64::INFINITY),
            max: DVec2::splat(f64::NEG_INFINITY),
        }
    }

    /// Check if nothing has been contributed yet
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Expand to include a point
    pub fn expand_point(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// The finished box, or `None` if no vertex was ever contributed.
    pub fn finish(&self) -> Option<BoundingBox> {
        if self.is_empty() {
            return None;
        }
        Some(BoundingBox {
            x: self.min.x,
            y: self.min.y,
            width: self.max.x - self.min.x,
            height: self.max.y - self.min.y,
        })
    }
}

/// Axis-aligned box in the local coordinate space of the element it was
/// computed over. `width` and `height` are never negative.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        BoundingBox {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> DVec2 {
        dvec2(self.x, self.y)
    }

    pub fn size(&self) -> DVec2 {
        dvec2(self.width, self.height)
    }

    pub fn center(&self) -> DVec2 {
        self.origin() + self.size() * 0.5
    }

    /// True when `other` lies inside this box, allowing `eps` of slack.
    pub fn contains_box(&self, other: &BoundingBox, eps: f64) -> bool {
        other.x >= self.x - eps
            && other.y >= self.y - eps
            && other.x + other.width <= self.x + self.width + eps
            && other.y + other.height <= self.y + self.height + eps
    }
}

/// Uniform-scale, axis-aligned placement: `p' = translate + scale * p`.
///
/// Rotation and skew are never produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
}

impl Transform {
    pub fn new(translate_x: f64, translate_y: f64, scale: f64) -> Self {
        Transform {
            translate_x,
            translate_y,
            scale,
        }
    }

    /// Fit `shape` inside `face`, preserving aspect ratio and centering it.
    ///
    /// The returned translation is where the scaled shape box's top-left
    /// corner lands; see [`Transform::anchored_at`] for the transform to put
    /// on the shape's markup.
    pub fn fit(shape: &BoundingBox, face: &BoundingBox) -> Result<Transform, PositioningError> {
        if shape.width == 0.0 || shape.height == 0.0 {
            return Err(PositioningError::Degenerate {
                width: shape.width,
                height: shape.height,
            });
        }
        let scale = (face.width / shape.width).min(face.height / shape.height);
        let translate_x = face.x + (face.width - shape.width * scale) / 2.0;
        let translate_y = face.y + (face.height - shape.height * scale) / 2.0;
        let fit = Transform::new(translate_x, translate_y, scale);
        if !fit.is_finite() {
            return Err(PositioningError::Degenerate {
                width: shape.width,
                height: shape.height,
            });
        }
        Ok(fit)
    }

    /// Re-anchor so that `shape`'s own top-left corner (rather than the
    /// coordinate origin) lands on this transform's translation.
    pub fn anchored_at(&self, shape: &BoundingBox) -> Transform {
        let offset = self.translation() - shape.origin() * self.scale;
        Transform::new(offset.x, offset.y, self.scale)
    }

    pub fn translation(&self) -> DVec2 {
        dvec2(self.translate_x, self.translate_y)
    }

    pub fn is_finite(&self) -> bool {
        self.translate_x.is_finite() && self.translate_y.is_finite() && self.scale.is_finite()
    }

    /// Map a point through the transform.
    pub fn apply(&self, p: DVec2) -> DVec2 {
        self.translation() + p * self.scale
    }

    /// Map a box through the transform.
    pub fn apply_box(&self, b: &BoundingBox) -> BoundingBox {
        let origin = self.apply(b.origin());
        BoundingBox::new(
            origin.x,
            origin.y,
            b.width * self.scale,
            b.height * self.scale,
        )
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translate({}, {}) scale({})",
            fmt_num(self.translate_x),
            fmt_num(self.translate_y),
            fmt_num(self.scale)
        )
    }
}

/// Named attachment region of a 3D shape
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceSlot {
    Top,
    Front,
    Side,
}

impl FaceSlot {
    /// Every slot, in the order decorations are attached
    pub const ALL: [FaceSlot; 3] = [FaceSlot::Top, FaceSlot::Front, FaceSlot::Side];

    pub fn name(self) -> &'static str {
        match self {
            FaceSlot::Top => "top",
            FaceSlot::Front => "front",
            FaceSlot::Side => "side",
        }
    }

    /// Id of the element marking this face inside a 3D shape's markup
    pub fn element_id(self) -> String {
        format!("{}-face", self.name())
    }
}

impl fmt::Display for FaceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FaceSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(FaceSlot::Top),
            "front" => Ok(FaceSlot::Front),
            "side" => Ok(FaceSlot::Side),
            other => Err(format!("unknown face '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Bounds tests ====================

    #[test]
    fn bounds_new_is_empty() {
        let b = Bounds::new();
        assert!(b.is_empty());
        assert_eq!(b.finish(), None);
    }

    #[test]
    fn bounds_expand_point() {
        let mut b = Bounds::new();
        b.expand_point(dvec2(1.0, 2.0));
        b.expand_point(dvec2(3.0, -4.0));

        assert!(!b.is_empty());
        assert_eq!(b.finish(), Some(BoundingBox::new(1.0, -4.0, 2.0, 6.0)));
    }

    #[test]
    fn bounds_single_point_is_zero_sized() {
        let mut b = Bounds::new();
        b.expand_point(dvec2(7.0, 7.0));
        assert_eq!(b.finish(), Some(BoundingBox::new(7.0, 7.0, 0.0, 0.0)));
    }

    // ==================== BoundingBox tests ====================

    #[test]
    fn bbox_center() {
        let b = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(b.center(), dvec2(25.0, 40.0));
    }

    #[test]
    fn bbox_contains_box() {
        let outer = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(outer.contains_box(&BoundingBox::new(2.0, 2.0, 8.0, 8.0), 0.0));
        assert!(!outer.contains_box(&BoundingBox::new(2.0, 2.0, 9.0, 8.0), 0.0));
        assert!(outer.contains_box(&BoundingBox::new(2.0, 2.0, 8.0 + 1e-12, 8.0), 1e-9));
    }

    // ==================== Transform tests ====================

    #[test]
    fn transform_display() {
        let t = Transform::new(12.5, -3.0, 2.0);
        assert_eq!(t.to_string(), "translate(12.5, -3) scale(2)");
    }

    #[test]
    fn transform_fit_rejects_zero_width() {
        let shape = BoundingBox::new(0.0, 0.0, 0.0, 5.0);
        let face = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(
            Transform::fit(&shape, &face),
            Err(PositioningError::Degenerate {
                width: 0.0,
                height: 5.0
            })
        );
    }

    #[test]
    fn transform_anchored_at_moves_box_origin() {
        let shape = BoundingBox::new(10.0, 10.0, 20.0, 20.0);
        let face = BoundingBox::new(100.0, 100.0, 40.0, 40.0);
        let fit = Transform::fit(&shape, &face).unwrap();
        let anchored = fit.anchored_at(&shape);

        let placed = anchored.apply_box(&shape);
        assert_eq!(placed, BoundingBox::new(100.0, 100.0, 40.0, 40.0));
        assert_eq!(anchored.scale, 2.0);
    }

    #[test]
    fn face_slot_parse_and_ids() {
        assert_eq!(" Front ".parse::<FaceSlot>(), Ok(FaceSlot::Front));
        assert!("back".parse::<FaceSlot>().is_err());
        assert_eq!(FaceSlot::Side.element_id(), "side-face");
    }

    #[test]
    fn transform_apply() {
        let t = Transform::new(5.0, 6.0, 3.0);
        assert_eq!(t.apply(dvec2(1.0, 2.0)), dvec2(8.0, 12.0));
    }
}
