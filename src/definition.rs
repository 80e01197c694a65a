//! Resolved type definitions and their members.

use crate::type_ref::{self, TypeRef};
use crate::validation::Validation;
use indexmap::IndexMap;

/// How definition names appear in the generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum NamingScheme {
    /// Import path and declared name, e.g. `crates.models.User`
    #[default]
    Full,
    /// Unit name and declared name, e.g. `models.User`
    Partial,
    /// Declared name only
    Simple,
}

/// Canonical name of `name` declared in the unit at `import_path`.
pub fn canonical_name(import_path: &str, name: &str) -> String {
    format!("{}.{}", import_path, name).replace(['/', '\\'], ".")
}

/// Name of a type under `naming`.
pub fn display_name(naming: NamingScheme, unit_name: &str, import_path: &str, name: &str) -> String {
    match naming {
        NamingScheme::Full => canonical_name(import_path, name),
        NamingScheme::Partial => format!("{}.{}", unit_name, name),
        NamingScheme::Simple => name.to_string(),
    }
}

/// The structural description of one named declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: String,
    pub unit_name: String,
    pub import_path: String,
    pub doc: String,
    /// Type text of the underlying type; `struct` for composites
    pub underlying: String,
    /// Members keyed by field name, in discovery order
    pub members: IndexMap<String, Member>,
    /// Embedded type references not yet merged
    pub embedded: Vec<String>,
    /// Literal enumeration values, set for primitive-underlying definitions
    pub enumerations: Option<Vec<String>>,
}

impl Definition {
    pub fn canonical_name(&self) -> String {
        canonical_name(&self.import_path, &self.name)
    }

    pub fn display_name(&self, naming: NamingScheme) -> String {
        display_name(naming, &self.unit_name, &self.import_path, &self.name)
    }

    pub fn is_primitive(&self) -> bool {
        type_ref::is_primitive(&self.underlying)
    }
}

/// Attributes shared by every member variant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberInfo {
    /// Field name in the declaring struct
    pub name: String,
    /// Serialized name; empty means the field name is used
    pub wire_name: String,
    pub omit_empty: bool,
    pub description: String,
    pub deprecated: bool,
    pub validation: Validation,
    /// Import path of the unit whose source declared the member
    pub origin: String,
}

impl MemberInfo {
    pub fn json_name(&self) -> &str {
        if self.wire_name.is_empty() {
            &self.name
        } else {
            &self.wire_name
        }
    }
}

/// Owning unit of a resolved member target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUnit {
    pub unit_name: String,
    pub import_path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub info: MemberInfo,
    pub type_text: String,
    /// Set once a non-primitive target has been resolved
    pub target: Option<TargetUnit>,
}

impl Scalar {
    pub fn is_primitive(&self) -> bool {
        type_ref::is_primitive(&self.type_text)
    }

    /// Name of the target definition under `naming`, once resolved.
    pub fn target_name(&self, naming: NamingScheme) -> Option<String> {
        let target = self.target.as_ref()?;
        let name = TypeRef::parse(&self.type_text).name;
        Some(display_name(
            naming,
            &target.unit_name,
            &target.import_path,
            &name,
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Scalar(Scalar),
    Collection {
        info: MemberInfo,
        element: Box<Member>,
    },
    Mapping {
        info: MemberInfo,
        key: Box<Member>,
        value: Box<Member>,
    },
}

impl Member {
    pub fn info(&self) -> &MemberInfo {
        match self {
            Member::Scalar(scalar) => &scalar.info,
            Member::Collection { info, .. } | Member::Mapping { info, .. } => info,
        }
    }

    pub fn info_mut(&mut self) -> &mut MemberInfo {
        match self {
            Member::Scalar(scalar) => &mut scalar.info,
            Member::Collection { info, .. } | Member::Mapping { info, .. } => info,
        }
    }

    pub fn is_required(&self) -> bool {
        self.info().validation.is_required()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scalar(type_text: &str, target: Option<TargetUnit>) -> Scalar {
        Scalar {
            info: MemberInfo::default(),
            type_text: type_text.to_string(),
            target,
        }
    }

    #[test]
    fn test_canonical_name_normalizes_separators() {
        assert_eq!(canonical_name("crates/models", "User"), "crates.models.User");
        assert_eq!(canonical_name("models", "User"), "models.User");
        assert_eq!(
            canonical_name("crates/models", "User"),
            canonical_name("crates/models", "User")
        );
    }

    #[test]
    fn test_display_names() {
        let naming = |scheme| display_name(scheme, "models", "crates/models", "User");
        assert_eq!(naming(NamingScheme::Full), "crates.models.User");
        assert_eq!(naming(NamingScheme::Partial), "models.User");
        assert_eq!(naming(NamingScheme::Simple), "User");
    }

    #[test]
    fn test_scalar_target_name_uses_bare_name() {
        let target = TargetUnit {
            unit_name: "models".to_string(),
            import_path: "crates/models".to_string(),
        };
        let member = scalar("*m.User", Some(target));
        assert_eq!(
            member.target_name(NamingScheme::Full),
            Some("crates.models.User".to_string())
        );
        assert_eq!(scalar("User", None).target_name(NamingScheme::Full), None);
    }

    #[test]
    fn test_json_name_falls_back_to_field_name() {
        let mut info = MemberInfo {
            name: "user_id".to_string(),
            ..MemberInfo::default()
        };
        assert_eq!(info.json_name(), "user_id");
        info.wire_name = "userId".to_string();
        assert_eq!(info.json_name(), "userId");
    }
}
