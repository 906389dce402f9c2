//! Shape library
//!
//! Shapes are described by CSV metadata files next to their SVG markup. A
//! directory is loaded once into a [`ShapeLibrary`], which is read-only after
//! that and can be shared between requests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::LibraryError;
use crate::types::FaceSlot;

/// Whether a shape is a decoration or a face-carrying template
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ShapeKind {
    #[serde(rename = "2D")]
    TwoD,
    #[serde(rename = "3D")]
    ThreeD,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShapeKind::TwoD => "2D",
            ShapeKind::ThreeD => "3D",
        })
    }
}

impl FromStr for ShapeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("2d") {
            Ok(ShapeKind::TwoD)
        } else if s.eq_ignore_ascii_case("3d") {
            Ok(ShapeKind::ThreeD)
        } else {
            Err(format!("unknown shape type '{s}'"))
        }
    }
}

/// Where a shape's markup lives
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarkupRef {
    /// Read from disk on every use
    File(PathBuf),
    Inline(String),
}

/// One library entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeDefinition {
    pub name: String,
    pub markup: MarkupRef,
    pub kind: ShapeKind,
    /// Faces this shape can be attached to (2D) or offers (3D)
    pub attach: Vec<FaceSlot>,
}

impl ShapeDefinition {
    /// Definition with inline markup, mostly useful in tests and embedders.
    pub fn inline(
        name: impl Into<String>,
        kind: ShapeKind,
        attach: impl IntoIterator<Item = FaceSlot>,
        markup: impl Into<String>,
    ) -> Self {
        ShapeDefinition {
            name: name.into(),
            markup: MarkupRef::Inline(markup.into()),
            kind,
            attach: attach.into_iter().collect(),
        }
    }
}

/// Catalog listing entry, serialized with the field names clients expect
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    pub attach: Vec<FaceSlot>,
    #[serde(rename = "svgContent")]
    pub svg_content: String,
}

/// Raw CSV row, before validation
#[derive(Debug, Deserialize)]
struct ShapeRow {
    #[serde(default)]
    name: String,
    #[serde(rename = "svgFile", default)]
    svg_file: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(alias = "face", default)]
    attach: String,
}

impl ShapeRow {
    fn into_definition(self, dir: &Path) -> Result<ShapeDefinition, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("empty name".to_string());
        }
        let svg_file = self.svg_file.trim();
        if svg_file.is_empty() {
            return Err(format!("shape '{name}' has no svgFile"));
        }
        let kind = self.kind.parse::<ShapeKind>()?;
        let attach = parse_faces(&self.attach)?;

        Ok(ShapeDefinition {
            name: name.to_string(),
            markup: MarkupRef::File(dir.join(svg_file)),
            kind,
            attach,
        })
    }
}

/// Parse a face list such as `top, front` or `top|side`. Duplicates collapse.
fn parse_faces(list: &str) -> Result<Vec<FaceSlot>, String> {
    let mut faces = Vec::new();
    for token in list
        .split(|c: char| c == ',' || c == ';' || c == '|' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let face = token.parse::<FaceSlot>()?;
        if !faces.contains(&face) {
            faces.push(face);
        }
    }
    Ok(faces)
}

/// Immutable registry of shape definitions, keyed by name
#[derive(Clone, Debug, Default)]
pub struct ShapeLibrary {
    shapes: BTreeMap<String, ShapeDefinition>,
}

impl ShapeLibrary {
    /// Load every `*.csv` file in `dir`, in file name order.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let dir = dir.as_ref();
        let io_err = |source| LibraryError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut csv_files = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if is_csv && path.is_file() {
                csv_files.push(path);
            }
        }
        csv_files.sort();

        let mut library = ShapeLibrary::default();
        for path in &csv_files {
            for def in load_csv(path, dir)? {
                library.insert(def);
            }
        }
        crate::log::debug!(
            dir = %dir.display(),
            files = csv_files.len(),
            shapes = library.len(),
            "loaded shape library"
        );
        Ok(library)
    }

    /// Build a library from definitions already in memory.
    pub fn from_definitions(defs: impl IntoIterator<Item = ShapeDefinition>) -> Self {
        let mut library = ShapeLibrary::default();
        for def in defs {
            library.insert(def);
        }
        library
    }

    fn insert(&mut self, def: ShapeDefinition) {
        if let Some(_previous) = self.shapes.insert(def.name.clone(), def) {
            crate::log::warn!(name = %_previous.name, "duplicate shape definition replaced");
        }
    }

    pub fn resolve(&self, name: &str) -> Option<&ShapeDefinition> {
        self.shapes.get(name)
    }

    /// Fetch the markup of a definition, reading it from disk if needed.
    pub fn markup(&self, def: &ShapeDefinition) -> Result<String, LibraryError> {
        match &def.markup {
            MarkupRef::Inline(text) => Ok(text.clone()),
            MarkupRef::File(path) => {
                fs::read_to_string(path).map_err(|source| LibraryError::Io {
                    path: path.clone(),
                    source,
                })
            }
        }
    }

    /// List every entry with its markup, sorted by name rather than in the
    /// order rows were loaded from the CSV files.
    ///
    /// Entries whose markup cannot be read are left out.
    pub fn catalog(&self) -> Vec<CatalogEntry> {
        self.shapes
            .values()
            .filter_map(|def| match self.markup(def) {
                Ok(svg_content) => Some(CatalogEntry {
                    name: def.name.clone(),
                    kind: def.kind,
                    attach: def.attach.clone(),
                    svg_content,
                }),
                Err(_e) => {
                    crate::log::warn!(name = %def.name, error = %_e, "skipping unreadable shape");
                    None
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Definitions in name order
    pub fn iter(&self) -> impl Iterator<Item = &ShapeDefinition> {
        self.shapes.values()
    }
}

fn load_csv(path: &Path, dir: &Path) -> Result<Vec<ShapeDefinition>, LibraryError> {
    let csv_err = |source| LibraryError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();

    let mut defs = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let line = record.position().map_or(0, |p| p.line());
        if record.iter().all(str::is_empty) {
            continue;
        }
        let row: ShapeRow = record.deserialize(Some(&headers)).map_err(csv_err)?;
        let def = row
            .into_definition(dir)
            .map_err(|reason| LibraryError::InvalidRow {
                path: path.to_path_buf(),
                line,
                reason,
            })?;
        crate::log::trace!(name = %def.name, kind = %def.kind, "shape row");
        defs.push(def);
    }
    Ok(defs)
}
