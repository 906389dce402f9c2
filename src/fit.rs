//! Fitting decorations onto faces

use crate::errors::PositioningError;
use crate::types::{BoundingBox, Transform};

/// Fit a decoration's box into a face's box.
///
/// Returns `None` when either box is missing or the decoration box is
/// degenerate; callers skip that decoration.
pub fn fit_shape_to_face(
    shape: Option<&BoundingBox>,
    face: Option<&BoundingBox>,
) -> Option<Transform> {
    try_fit_shape_to_face(shape, face)
        .inspect_err(|_e| {
            crate::log::debug!(error = %_e, "cannot fit shape to face");
        })
        .ok()
}

/// Like [`fit_shape_to_face`], but says why positioning failed.
pub fn try_fit_shape_to_face(
    shape: Option<&BoundingBox>,
    face: Option<&BoundingBox>,
) -> Result<Transform, PositioningError> {
    let face = face.ok_or(PositioningError::MissingFaceBounds)?;
    let shape = shape.ok_or(PositioningError::MissingShapeBounds)?;
    Transform::fit(shape, face)
}
