//! Error types with rich diagnostics using miette
//!
//! Markup errors carry source spans so a broken shape file points at the
//! offending line.

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

/// Source context for error reporting
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Name of the source (shape name or file name)
    pub name: String,
    /// The full markup text
    pub source: String,
}

impl SourceContext {
    /// Create a new source context
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Create a NamedSource for miette
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.source.clone())
    }

    /// Byte offset of a 1-based row/column position, clamped to the source.
    pub fn offset_of(&self, row: u32, col: u32) -> usize {
        let mut offset = 0;
        for (i, line) in self.source.split_inclusive('\n').enumerate() {
            if i + 1 == row as usize {
                let col_bytes = line
                    .char_indices()
                    .nth(col.saturating_sub(1) as usize)
                    .map(|(b, _)| b)
                    .unwrap_or(line.len());
                return offset + col_bytes;
            }
            offset += line.len();
        }
        self.source.len()
    }
}

// ============================================================================
// Markup Errors
// ============================================================================

/// Errors raised while turning raw markup into an element tree
#[derive(Error, Diagnostic, Debug)]
pub enum ExtractionError {
    #[error("malformed markup in shape '{shape}': {message}")]
    #[diagnostic(code(isocompose::markup::malformed))]
    Malformed {
        shape: String,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("shape '{shape}' has no <svg> root (found <{found}>)")]
    #[diagnostic(
        code(isocompose::markup::not_svg),
        help("shape files must contain a single <svg> document element")
    )]
    NotSvg { shape: String, found: String },
}

// ============================================================================
// Positioning Errors
// ============================================================================

/// A shape or face could not be positioned
#[derive(Error, Diagnostic, Debug, Clone, Copy, PartialEq)]
pub enum PositioningError {
    #[error("no bounding box for the shape")]
    #[diagnostic(code(isocompose::position::no_shape_bounds))]
    MissingShapeBounds,

    #[error("no bounding box for the face")]
    #[diagnostic(code(isocompose::position::no_face_bounds))]
    MissingFaceBounds,

    #[error("shape bounding box is degenerate ({width} x {height})")]
    #[diagnostic(
        code(isocompose::position::degenerate),
        help("a shape needs a non-zero width and height to be scaled onto a face")
    )]
    Degenerate { width: f64, height: f64 },
}

// ============================================================================
// Library Errors
// ============================================================================

/// Errors from loading the shape library or reading a shape's markup
#[derive(Error, Diagnostic, Debug)]
pub enum LibraryError {
    #[error("failed to read {path}")]
    #[diagnostic(code(isocompose::library::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}")]
    #[diagnostic(code(isocompose::library::csv))]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid row at {path}:{line}: {reason}")]
    #[diagnostic(
        code(isocompose::library::invalid_row),
        help("rows need a name, an svgFile, a type of 2D or 3D and faces from top/front/side")
    )]
    InvalidRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },
}

// ============================================================================
// Composition Errors
// ============================================================================

/// Request-level failures; any of these aborts the whole composition
#[derive(Error, Diagnostic, Debug)]
pub enum ComposeError {
    #[error("Shape {name} not found in library")]
    #[diagnostic(code(isocompose::compose::shape_not_found))]
    ShapeNotFound { name: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Library(#[from] LibraryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("invalid composition request: {message}")]
    #[diagnostic(code(isocompose::compose::invalid_request))]
    InvalidRequest { message: String },
}

/// Why a single decoration was left out; logged and skipped, never fatal
#[derive(Error, Diagnostic, Debug)]
pub enum DecorationError {
    #[error("decoration {name} not found in library")]
    #[diagnostic(code(isocompose::decoration::not_found))]
    NotFound { name: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Library(#[from] LibraryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Positioning(#[from] PositioningError),
}
