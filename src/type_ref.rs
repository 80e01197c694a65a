//! Textual type references and the primitive-type table.

/// A type reference split into its optional alias and bare name.
///
/// `*models.User` parses into alias `models` and name `User`; the alias is
/// everything before the first `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub alias: Option<String>,
    pub name: String,
}

impl TypeRef {
    pub fn parse(text: &str) -> Self {
        let text = strip_pointers(text);
        match text.split_once('.') {
            Some((alias, name)) => Self {
                alias: Some(alias.to_string()),
                name: name.to_string(),
            },
            None => Self {
                alias: None,
                name: text.to_string(),
            },
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.alias.is_some()
    }
}

/// Structural shape of a piece of type text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape<'a> {
    Mapping { key: &'a str, value: &'a str },
    Collection { element: &'a str },
    Scalar(&'a str),
}

/// Classifies type text, testing mapping, then collection, then scalar.
///
/// Leading pointer markers are ignored, as is a pointer marker on a map's
/// value type.
pub fn shape(text: &str) -> TypeShape<'_> {
    let text = strip_pointers(text);

    if let Some((key, value)) = split_map(text) {
        return TypeShape::Mapping {
            key,
            value: strip_pointers(value),
        };
    }
    if let Some(element) = text.strip_prefix("[]") {
        return TypeShape::Collection { element };
    }
    TypeShape::Scalar(text)
}

pub fn strip_pointers(text: &str) -> &str {
    text.trim_start_matches('*')
}

/// Splits `map[K]V` with bracket balancing inside `K`.
fn split_map(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("map[")?;
    let mut depth = 0usize;
    for (idx, ch) in rest.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' if depth == 0 => {
                let (key, value) = (&rest[..idx], &rest[idx + 1..]);
                if key.is_empty() || value.is_empty() {
                    return None;
                }
                return Some((key, value));
            }
            ']' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Schema kind and optional format of a primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Primitive {
    pub kind: &'static str,
    pub format: Option<&'static str>,
}

impl Primitive {
    const fn new(kind: &'static str, format: Option<&'static str>) -> Self {
        Self { kind, format }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == "integer" || self.kind == "number"
    }
}

/// Crates whose time and JSON types count as primitives when qualified.
const PRIMITIVE_CRATES: &[&str] = &["chrono", "time", "std", "serde_json"];

/// Looks up the primitive table. Surrounding pointer markers are ignored.
pub fn primitive(text: &str) -> Option<Primitive> {
    let text = text.trim_matches('*');

    if text == "[]u8" {
        return Some(Primitive::new("string", Some("binary")));
    }

    let bare = match text.split_once('.') {
        Some((alias, name)) if PRIMITIVE_CRATES.contains(&alias) => name,
        Some(_) => return None,
        None => text,
    };

    let primitive = match bare {
        "bool" => Primitive::new("boolean", None),
        "f32" => Primitive::new("number", Some("float")),
        "f64" => Primitive::new("number", Some("double")),
        "i32" => Primitive::new("integer", Some("int32")),
        "i64" => Primitive::new("integer", Some("int64")),
        "i8" | "i16" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64" | "u128" | "usize" => {
            Primitive::new("integer", None)
        }
        "char" => Primitive::new("integer", None),
        "String" | "str" => Primitive::new("string", None),
        "any" | "Value" => Primitive::new("object", None),
        "DateTime" | "NaiveDateTime" | "NaiveDate" | "SystemTime" | "OffsetDateTime" => {
            Primitive::new("string", Some("date-time"))
        }
        _ => return None,
    };
    Some(primitive)
}

pub fn is_primitive(text: &str) -> bool {
    primitive(text).is_some()
}
