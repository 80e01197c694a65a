//! Parser oracle: the declaration view of a compilation unit.
//!
//! The resolution core never reads source text. It asks a [`SourceOracle`]
//! for the declaration groups of a unit and works on the lowered model
//! below. Type text in this model uses a compact notation that the member
//! classifier understands:
//!
//! - `*T` for optional and pointer-like wrappers (`Option`, `Box`, `&T`, ...)
//! - `[]T` for sequences (`Vec`, `HashSet`, arrays, slices, ...)
//! - `map[K]V` for maps
//! - `alias.Name` for a type reached through another crate
//! - `any` for untyped values (generic parameters, trait objects)

pub mod cargo;
pub mod lower;

use crate::error::Result;
pub use crate::scanner::TargetKind;

/// All top-level declarations of one build target.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclGroup {
    /// Declared unit name (the library crate name)
    pub name: String,
    pub kind: TargetKind,
    pub types: Vec<TypeDecl>,
    pub consts: Vec<ConstDecl>,
    pub imports: Vec<ImportDecl>,
    /// Doc-comment blocks, one per documented item
    pub comments: Vec<String>,
}

impl DeclGroup {
    pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            name: name.into(),
            kind,
            types: Vec::new(),
            consts: Vec::new(),
            imports: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|decl| decl.name == name)
    }
}

/// Underlying type text of composite declarations.
pub const COMPOSITE: &str = "struct";

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub doc: String,
    /// Type text of the underlying type, or [`COMPOSITE`]
    pub underlying: String,
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldDecl {
    /// `None` for an embedded (flattened) field
    pub name: Option<String>,
    pub type_text: String,
    pub exported: bool,
    pub wire: Option<WireTag>,
    /// Raw validation expression, e.g. `required,min=1,max=10`
    pub validate: Option<String>,
    pub doc: String,
    /// Trailing `//` comment on the field's line
    pub comment: String,
    pub deprecated: bool,
}

/// Serialized name and omit-if-empty flag of a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireTag {
    /// Empty when only the flag was given; `-` when the field is skipped
    pub name: String,
    pub omit_empty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstDecl {
    pub names: Vec<String>,
    pub type_text: String,
    /// Literal source text, quotes included
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub path: String,
    pub alias: Option<String>,
}

/// Source of declaration groups for compilation units.
pub trait SourceOracle {
    /// Loads every declaration group of the unit at `import_path`.
    ///
    /// Returns `Ok(None)` when the unit cannot be located. Errors are
    /// reserved for units that exist but cannot be read or parsed.
    fn load_unit(&self, import_path: &str) -> Result<Option<Vec<DeclGroup>>>;
}

/// Picks the group to analyze: never a test group, and a library group over
/// an entry point whenever both exist.
pub fn select_group(groups: &[DeclGroup]) -> Option<&DeclGroup> {
    let mut selected: Option<&DeclGroup> = None;

    for group in groups {
        if group.kind == TargetKind::Test {
            continue;
        }
        match selected {
            None => selected = Some(group),
            Some(current) if current.kind == TargetKind::EntryPoint => selected = Some(group),
            Some(_) => {}
        }
    }

    selected
}
