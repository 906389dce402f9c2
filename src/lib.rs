//! Isometric diagram composition.
//!
//! Decorative 2D shapes are fitted onto the named faces (`top-face`,
//! `front-face`, `side-face`) of 3D shape templates and everything is emitted
//! as one SVG document. Shapes come from a [`ShapeLibrary`] loaded once from
//! CSV metadata and SVG files.

pub mod bbox;
pub mod compose;
pub mod errors;
pub mod extract;
pub mod fit;
pub mod library;
pub mod log;
pub mod svg;
pub mod types;

pub use bbox::compute_bounding_box;
pub use compose::{ComposeOptions, CompositeDocument, CompositionRequest, ObjectSpec, compose};
pub use errors::{ComposeError, DecorationError, ExtractionError, LibraryError, PositioningError};
pub use extract::{IdGenerator, Primitive, PrimitiveKind, extract_primitives};
pub use fit::fit_shape_to_face;
pub use library::{CatalogEntry, MarkupRef, ShapeDefinition, ShapeKind, ShapeLibrary};
pub use types::{BoundingBox, FaceSlot, Transform};

/// Compose a JSON request with default options and return the SVG text.
pub fn compose_svg(library: &ShapeLibrary, request_json: &str) -> Result<String, ComposeError> {
    let request = CompositionRequest::from_json(request_json)?;
    let doc = compose(library, &request, &ComposeOptions::default())?;
    Ok(doc.to_svg_string())
}
