//! Turns declarations into definitions and fields into members.

use crate::definition::{Definition, Member, MemberInfo, Scalar};
use crate::oracle::{FieldDecl, TypeDecl};
use crate::type_ref::{shape, TypeShape};
use crate::validation::Validation;
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

static DESCRIPTION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@(?i:desc)\s+"?([^"]+)"?"#).expect("description marker regex must compile")
});
static IGNORE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(?i:ignore)\b").expect("ignore marker regex must compile"));
static DEPRECATED_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(?i:deprecated)\b").expect("deprecated marker regex must compile")
});

/// Builds the unresolved definition of `decl`, declared in the unit
/// `unit_name` at `import_path`.
///
/// Embedded fields are recorded for flattening, everything else goes
/// through [`classify`]. Enumerations are left for the resolver.
pub fn build_definition(decl: &TypeDecl, unit_name: &str, import_path: &str) -> Definition {
    let mut members = IndexMap::new();
    let mut embedded = Vec::new();

    for field in &decl.fields {
        if is_ignored(field) {
            debug!("Ignoring marked field of {}", decl.name);
            continue;
        }
        match &field.name {
            None => embedded.push(field.type_text.clone()),
            Some(name) => {
                if let Some(member) = classify(field, import_path) {
                    members.insert(name.clone(), member);
                }
            }
        }
    }

    Definition {
        name: decl.name.clone(),
        unit_name: unit_name.to_string(),
        import_path: import_path.to_string(),
        doc: decl.doc.clone(),
        underlying: decl.underlying.clone(),
        members,
        embedded,
        enumerations: None,
    }
}

/// Classifies a named field into a member.
///
/// Returns `None` for fields that never appear in the schema: private
/// fields, fields marked `@ignore`, and fields serialized under `-`.
pub fn classify(field: &FieldDecl, origin: &str) -> Option<Member> {
    let name = field.name.as_ref()?;
    if !field.exported || is_ignored(field) {
        return None;
    }

    let wire = field.wire.clone().unwrap_or_default();
    if wire.name == "-" {
        return None;
    }

    let info = MemberInfo {
        name: name.clone(),
        wire_name: wire.name,
        omit_empty: wire.omit_empty,
        description: description(field),
        deprecated: field.deprecated
            || DEPRECATED_MARKER.is_match(&field.doc)
            || DEPRECATED_MARKER.is_match(&field.comment),
        validation: field
            .validate
            .as_deref()
            .map(Validation::parse)
            .unwrap_or_default(),
        origin: origin.to_string(),
    };

    Some(member_for(&field.type_text, info))
}

/// Builds the member for `type_text`; nested key, value and element members
/// carry only the field name and origin.
pub fn member_for(type_text: &str, info: MemberInfo) -> Member {
    match shape(type_text) {
        TypeShape::Mapping { key, value } => Member::Mapping {
            key: Box::new(member_for(key, nested_info(&info))),
            value: Box::new(member_for(value, nested_info(&info))),
            info,
        },
        TypeShape::Collection { element } => Member::Collection {
            element: Box::new(member_for(element, nested_info(&info))),
            info,
        },
        TypeShape::Scalar(text) => Member::Scalar(Scalar {
            info,
            type_text: text.to_string(),
            target: None,
        }),
    }
}

fn nested_info(info: &MemberInfo) -> MemberInfo {
    MemberInfo {
        name: info.name.clone(),
        origin: info.origin.clone(),
        ..MemberInfo::default()
    }
}

fn is_ignored(field: &FieldDecl) -> bool {
    IGNORE_MARKER.is_match(&field.doc) || IGNORE_MARKER.is_match(&field.comment)
}

/// `@desc` text from the doc comment, else from the trailing comment.
fn description(field: &FieldDecl) -> String {
    [&field.doc, &field.comment]
        .into_iter()
        .find_map(|text| {
            DESCRIPTION_MARKER
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{WireTag, COMPOSITE};
    use pretty_assertions::assert_eq;

    fn field(name: &str, type_text: &str) -> FieldDecl {
        FieldDecl {
            name: Some(name.to_string()),
            type_text: type_text.to_string(),
            exported: true,
            ..FieldDecl::default()
        }
    }

    fn scalar_type(member: &Member) -> &str {
        match member {
            Member::Scalar(scalar) => &scalar.type_text,
            other => panic!("expected scalar, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_scalar_with_tags() {
        let decl = FieldDecl {
            wire: Some(WireTag {
                name: "userId".to_string(),
                omit_empty: true,
            }),
            validate: Some("required,min=1".to_string()),
            doc: "Identifier\n@desc \"The id\"".to_string(),
            ..field("id", "*i64")
        };

        let member = classify(&decl, "app").unwrap();
        let info = member.info();

        assert_eq!(scalar_type(&member), "i64");
        assert_eq!(info.json_name(), "userId");
        assert!(info.omit_empty);
        assert_eq!(info.description, "The id");
        assert!(member.is_required());
        assert_eq!(info.validation.min(), Some(1.0));
        assert_eq!(info.origin, "app");
    }

    #[test]
    fn test_classify_collection_and_mapping() {
        let list = classify(&field("pets", "[]*models.Pet"), "app").unwrap();
        match &list {
            Member::Collection { info, element } => {
                assert_eq!(info.name, "pets");
                assert_eq!(scalar_type(element), "models.Pet");
                assert!(element.info().validation.is_empty());
            }
            other => panic!("expected collection, got {:?}", other),
        }

        let map = classify(&field("scores", "map[String][]i32"), "app").unwrap();
        match &map {
            Member::Mapping { key, value, .. } => {
                assert_eq!(scalar_type(key), "String");
                assert!(matches!(value.as_ref(), Member::Collection { .. }));
            }
            other => panic!("expected mapping, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_skips_private_dashed_and_ignored() {
        let private = FieldDecl {
            exported: false,
            ..field("secret", "String")
        };
        let dashed = FieldDecl {
            wire: Some(WireTag {
                name: "-".to_string(),
                omit_empty: false,
            }),
            ..field("cache", "String")
        };
        let ignored = FieldDecl {
            comment: "@Ignore".to_string(),
            ..field("internal", "String")
        };

        assert!(classify(&private, "app").is_none());
        assert!(classify(&dashed, "app").is_none());
        assert!(classify(&ignored, "app").is_none());
    }

    #[test]
    fn test_description_prefers_doc_over_comment() {
        let decl = FieldDecl {
            doc: "@desc from doc".to_string(),
            comment: "@desc \"from comment\"".to_string(),
            ..field("name", "String")
        };
        assert_eq!(classify(&decl, "app").unwrap().info().description, "from doc");

        let decl = FieldDecl {
            comment: "@DESC \"from comment\"".to_string(),
            ..field("name", "String")
        };
        assert_eq!(classify(&decl, "app").unwrap().info().description, "from comment");
    }

    #[test]
    fn test_deprecation_from_marker_or_attribute() {
        let marked = FieldDecl {
            doc: "@deprecated use `name`".to_string(),
            ..field("title", "String")
        };
        let attributed = FieldDecl {
            deprecated: true,
            ..field("label", "String")
        };

        assert!(classify(&marked, "app").unwrap().info().deprecated);
        assert!(classify(&attributed, "app").unwrap().info().deprecated);
        assert!(!classify(&field("name", "String"), "app").unwrap().info().deprecated);
    }

    #[test]
    fn test_build_definition_records_embedded_in_order() {
        let decl = TypeDecl {
            name: "Account".to_string(),
            doc: "An account".to_string(),
            underlying: COMPOSITE.to_string(),
            fields: vec![
                field("id", "i64"),
                FieldDecl {
                    name: None,
                    type_text: "audit.Stamps".to_string(),
                    ..FieldDecl::default()
                },
                field("name", "String"),
                FieldDecl {
                    name: None,
                    type_text: "Hidden".to_string(),
                    doc: "@ignore".to_string(),
                    ..FieldDecl::default()
                },
            ],
        };

        let definition = build_definition(&decl, "billing", "crates/billing");

        assert_eq!(definition.canonical_name(), "crates.billing.Account");
        assert_eq!(
            definition.members.keys().collect::<Vec<_>>(),
            vec!["id", "name"]
        );
        assert_eq!(definition.embedded, vec!["audit.Stamps"]);
        assert_eq!(definition.enumerations, None);
        assert!(!definition.is_primitive());
    }
}
