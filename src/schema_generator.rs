use crate::definition::{Definition, Member, MemberInfo, NamingScheme, Scalar};
use crate::store::DefinitionStore;
use crate::type_ref::{primitive, Primitive};
use crate::validation::Validation;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Schema generator - derives Swagger schemas from fully defined definitions
pub struct SchemaGenerator<'a> {
    /// Read-only view of the definitions collected for this run
    store: &'a DefinitionStore,
    naming: NamingScheme,
}

/// Swagger 2.0 schema object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Object properties keyed by wire name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    /// Required property names, in member discovery order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Box<Schema>>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i64>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(rename = "exclusiveMinimum", skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(rename = "exclusiveMaximum", skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<bool>,
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<i64>,
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<i64>,
    #[serde(rename = "x-deprecated", skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
}

impl Schema {
    pub fn typed(primitive: Primitive) -> Self {
        Self {
            schema_type: Some(primitive.kind.to_string()),
            format: primitive.format.map(str::to_string),
            ..Self::default()
        }
    }

    fn object() -> Self {
        Self {
            schema_type: Some("object".to_string()),
            ..Self::default()
        }
    }

    fn array(items: Schema) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    fn reference(name: &str) -> Self {
        Self {
            reference: Some(format!("#/definitions/{}", name)),
            ..Self::default()
        }
    }

    fn set_minimum(&mut self, value: f64, exclusive: bool) {
        self.minimum = number(value);
        self.exclusive_minimum = exclusive.then_some(true);
    }

    fn set_maximum(&mut self, value: f64, exclusive: bool) {
        self.maximum = number(value);
        self.exclusive_maximum = exclusive.then_some(true);
    }
}

impl<'a> SchemaGenerator<'a> {
    pub fn new(store: &'a DefinitionStore, naming: NamingScheme) -> Self {
        debug!("Initializing SchemaGenerator with {} definitions", store.len());
        Self { store, naming }
    }

    /// Schemas of every stored definition, keyed by display name.
    pub fn definitions(&self) -> BTreeMap<String, Schema> {
        self.store
            .definitions()
            .map(|definition| {
                (
                    definition.display_name(self.naming),
                    self.definition_schema(definition),
                )
            })
            .collect()
    }

    /// Schema of one definition: a typed enumeration for primitive
    /// underlying types, an object otherwise.
    pub fn definition_schema(&self, definition: &Definition) -> Schema {
        let mut schema = match primitive(&definition.underlying) {
            Some(kind) => {
                let mut schema = Schema::typed(kind);
                let values: Vec<Value> = definition
                    .enumerations
                    .iter()
                    .flatten()
                    .map(|literal| enum_value(literal))
                    .collect();
                if !values.is_empty() {
                    schema.enum_values = Some(values);
                }
                schema
            }
            None => {
                let mut schema = Schema::object();
                let mut properties = BTreeMap::new();
                let mut required = Vec::new();
                for member in definition.members.values() {
                    let name = member.info().json_name().to_string();
                    if member.is_required() {
                        required.push(name.clone());
                    }
                    properties.insert(name, self.member_schema(member));
                }
                schema.properties = Some(properties);
                if !required.is_empty() {
                    schema.required = Some(required);
                }
                schema
            }
        };

        schema.title = Some(definition.display_name(self.naming));
        schema.description = non_empty(&definition.doc);
        schema
    }

    /// Schema of a member; non-primitive scalars become references.
    pub fn member_schema(&self, member: &Member) -> Schema {
        let mut schema = match member {
            Member::Scalar(scalar) => self.scalar_schema(scalar),
            Member::Collection { info, element } => {
                let mut schema = Schema::array(self.member_schema(element));
                apply_item_bounds(&mut schema, &info.validation);
                schema
            }
            Member::Mapping { info, value, .. } => {
                let mut schema = Schema::object();
                schema.additional_properties =
                    Some(Box::new(Schema::array(self.member_schema(value))));
                apply_item_bounds(&mut schema, &info.validation);
                schema
            }
        };

        annotate(&mut schema, member.info());
        schema
    }

    fn scalar_schema(&self, scalar: &Scalar) -> Schema {
        if let Some(kind) = primitive(&scalar.type_text) {
            let mut schema = Schema::typed(kind);
            let validation = &scalar.info.validation;
            if kind.kind == "string" {
                apply_length_bounds(&mut schema, validation);
            } else if kind.is_numeric() {
                apply_magnitude_bounds(&mut schema, validation);
            }
            return schema;
        }

        match scalar.target_name(self.naming) {
            Some(name) => Schema::reference(&name),
            None => {
                warn!(
                    "Member {} of type {} was never resolved; emitting a plain object",
                    scalar.info.name, scalar.type_text
                );
                Schema::object()
            }
        }
    }
}

fn annotate(schema: &mut Schema, info: &MemberInfo) {
    schema.description = non_empty(&info.description);
    if info.deprecated {
        schema.deprecated = Some(true);
    }
}

fn apply_item_bounds(schema: &mut Schema, validation: &Validation) {
    if let Some(min) = validation.min() {
        schema.min_items = Some(count(min));
    }
    if let Some(max) = validation.max() {
        schema.max_items = Some(count(max));
    }
    if let Some(len) = validation.length() {
        schema.min_items = Some(count(len));
        schema.max_items = Some(count(len));
    }
    if let Some(eq) = validation.equals().and_then(|s| s.parse::<i64>().ok()) {
        schema.min_items = Some(eq.max(0));
        schema.max_items = Some(eq.max(0));
    }
    if let Some(gt) = validation.greater_than() {
        schema.min_items = Some(count(gt + 1.0));
    }
    if let Some(lt) = validation.less_than() {
        schema.max_items = Some(count(lt - 1.0));
    }
}

fn apply_length_bounds(schema: &mut Schema, validation: &Validation) {
    if let Some(min) = validation.min() {
        schema.min_length = Some(count(min));
    }
    if let Some(max) = validation.max() {
        schema.max_length = Some(count(max));
    }
    if let Some(len) = validation.length() {
        schema.min_length = Some(count(len));
        schema.max_length = Some(count(len));
    }
    if let Some(eq) = validation.equals() {
        schema.pattern = Some(eq.to_string());
    }
    if let Some(gt) = validation.greater_than() {
        schema.min_length = Some(count(gt + 1.0));
    }
    if let Some(lt) = validation.less_than() {
        schema.max_length = Some(count(lt - 1.0));
    }
}

/// Item and length counts are non-negative; the cast saturates at
/// `i64::MAX` and maps NaN to 0.
fn count(value: f64) -> i64 {
    value.max(0.0) as i64
}

fn apply_magnitude_bounds(schema: &mut Schema, validation: &Validation) {
    if let Some(min) = validation.min() {
        schema.set_minimum(min, false);
    }
    if let Some(max) = validation.max() {
        schema.set_maximum(max, false);
    }
    if let Some(len) = validation.length() {
        schema.set_minimum(len, false);
        schema.set_maximum(len, false);
    }
    if let Some(eq) = validation.equals().and_then(|s| s.parse::<f64>().ok()) {
        schema.set_minimum(eq, false);
        schema.set_maximum(eq, false);
    }
    if let Some(gt) = validation.greater_than() {
        schema.set_minimum(gt, true);
    }
    if let Some(lt) = validation.less_than() {
        schema.set_maximum(lt, true);
    }
}

/// Typed enumeration value of a literal: quoted literals are strings,
/// anything else is a number when it parses as one.
fn enum_value(literal: &str) -> Value {
    let literal = literal.trim();
    if literal.starts_with('"') {
        return Value::String(literal.trim_matches('"').to_string());
    }
    if let Ok(integer) = literal.parse::<i64>() {
        return Value::from(integer);
    }
    match literal.parse::<f64>().ok().and_then(number) {
        Some(n) => Value::Number(n),
        None => Value::String(literal.trim_matches('"').to_string()),
    }
}

/// Integral values are kept integral so `min=1` renders as `1`.
fn number(value: f64) -> Option<Number> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(Number::from(value as i64))
    } else {
        Number::from_f64(value)
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::member_for;
    use crate::definition::TargetUnit;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn info(name: &str, validate: &str) -> MemberInfo {
        MemberInfo {
            name: name.to_string(),
            validation: Validation::parse(validate),
            origin: "crates/models".to_string(),
            ..MemberInfo::default()
        }
    }

    fn targeted(mut member: Member) -> Member {
        match &mut member {
            Member::Scalar(scalar) => {
                scalar.target = Some(TargetUnit {
                    unit_name: "models".to_string(),
                    import_path: "crates/models".to_string(),
                })
            }
            Member::Collection { element, .. } => {
                **element = targeted((**element).clone());
            }
            Member::Mapping { value, .. } => {
                **value = targeted((**value).clone());
            }
        }
        member
    }

    fn definition(name: &str, underlying: &str, members: Vec<Member>) -> Definition {
        Definition {
            name: name.to_string(),
            unit_name: "models".to_string(),
            import_path: "crates/models".to_string(),
            doc: String::new(),
            underlying: underlying.to_string(),
            members: members
                .into_iter()
                .map(|member| (member.info().name.clone(), member))
                .collect::<IndexMap<_, _>>(),
            embedded: Vec::new(),
            enumerations: None,
        }
    }

    fn to_json(schema: &Schema) -> serde_json::Value {
        serde_json::to_value(schema).unwrap()
    }

    #[test]
    fn test_integer_bounds_and_required() {
        let store = DefinitionStore::new();
        let generator = SchemaGenerator::new(&store, NamingScheme::Full);
        let user = definition(
            "User",
            "struct",
            vec![
                member_for("String", info("name", "")),
                member_for("i32", info("age", "required,min=1,max=10")),
            ],
        );

        let schema = to_json(&generator.definition_schema(&user));

        assert_eq!(
            schema,
            json!({
                "type": "object",
                "title": "crates.models.User",
                "properties": {
                    "age": {"type": "integer", "format": "int32", "minimum": 1, "maximum": 10},
                    "name": {"type": "string"}
                },
                "required": ["age"]
            })
        );
    }

    #[test]
    fn test_huge_exclusive_item_bounds_saturate() {
        let store = DefinitionStore::new();
        let generator = SchemaGenerator::new(&store, NamingScheme::Full);

        let member = member_for("[]i64", info("ids", "gt=1e30,lt=-1e30"));
        let schema = generator.member_schema(&member);

        assert_eq!(schema.min_items, Some(i64::MAX));
        assert_eq!(schema.max_items, Some(0));
    }

    #[test]
    fn test_huge_exclusive_length_bounds_saturate() {
        let store = DefinitionStore::new();
        let generator = SchemaGenerator::new(&store, NamingScheme::Full);

        let member = member_for("String", info("code", "lt=-1e30,gt=inf"));
        let schema = generator.member_schema(&member);
        assert_eq!(schema.max_length, Some(0));
        assert_eq!(schema.min_length, Some(i64::MAX));

        let member = member_for("String", info("code", "min=-3,gt=2.5"));
        let schema = generator.member_schema(&member);
        assert_eq!(schema.min_length, Some(3));
    }

    #[test]
    fn test_exclusive_bounds_overwrite_inclusive() {
        let store = DefinitionStore::new();
        let generator = SchemaGenerator::new(&store, NamingScheme::Full);

        let member = member_for("f64", info("score", "min=0,gt=-2.5,max=10"));
        let schema = generator.member_schema(&member);

        assert_eq!(schema.minimum, Number::from_f64(-2.5));
        assert_eq!(schema.exclusive_minimum, Some(true));
        assert_eq!(schema.maximum, Some(Number::from(10_i64)));
        assert_eq!(schema.exclusive_maximum, None);
    }

    #[test]
    fn test_string_bounds() {
        let store = DefinitionStore::new();
        let generator = SchemaGenerator::new(&store, NamingScheme::Full);

        let bounded =
            generator.member_schema(&member_for("String", info("code", "min=2,max=8,lt=5")));
        assert_eq!(bounded.min_length, Some(2));
        assert_eq!(bounded.max_length, Some(4));

        let exact =
            generator.member_schema(&member_for("String", info("pin", "len=4,eq=[0-9]+")));
        assert_eq!(exact.min_length, Some(4));
        assert_eq!(exact.max_length, Some(4));
        assert_eq!(exact.pattern.as_deref(), Some("[0-9]+"));
    }

    #[test]
    fn test_collection_of_boxed_structs_is_array_of_refs() {
        let store = DefinitionStore::new();
        let generator = SchemaGenerator::new(&store, NamingScheme::Partial);
        let member = targeted(member_for("[]*Pet", info("pets", "gt=0,max=20")));

        assert_eq!(
            to_json(&generator.member_schema(&member)),
            json!({
                "type": "array",
                "items": {"$ref": "#/definitions/models.Pet"},
                "minItems": 1,
                "maxItems": 20
            })
        );
    }

    #[test]
    fn test_mapping_is_object_of_arrays() {
        let store = DefinitionStore::new();
        let generator = SchemaGenerator::new(&store, NamingScheme::Full);
        let member = member_for("map[String]i64", info("counts", "eq=3"));

        assert_eq!(
            to_json(&generator.member_schema(&member)),
            json!({
                "type": "object",
                "additionalProperties": {"type": "array", "items": {"type": "integer", "format": "int64"}},
                "minItems": 3,
                "maxItems": 3
            })
        );
    }

    #[test]
    fn test_enum_values_are_typed() {
        let store = DefinitionStore::new();
        let generator = SchemaGenerator::new(&store, NamingScheme::Simple);
        let mut color = definition("Color", "String", Vec::new());
        color.enumerations = Some(vec!["\"RED\"".to_string(), "\"3\"".to_string()]);
        let mut level = definition("Level", "i32", Vec::new());
        level.enumerations = Some(vec!["3".to_string(), "2.5".to_string(), "oops".to_string()]);
        let empty = definition("Empty", "String", Vec::new());

        assert_eq!(
            generator.definition_schema(&color).enum_values,
            Some(vec![json!("RED"), json!("3")])
        );
        assert_eq!(
            generator.definition_schema(&level).enum_values,
            Some(vec![json!(3), json!(2.5), json!("oops")])
        );
        assert_eq!(generator.definition_schema(&empty).enum_values, None);
    }

    #[test]
    fn test_member_annotations() {
        let store = DefinitionStore::new();
        let generator = SchemaGenerator::new(&store, NamingScheme::Full);
        let member = member_for(
            "String",
            MemberInfo {
                description: "Old name".to_string(),
                deprecated: true,
                ..info("title", "")
            },
        );

        assert_eq!(
            to_json(&generator.member_schema(&member)),
            json!({"type": "string", "description": "Old name", "x-deprecated": true})
        );
    }

    #[test]
    fn test_unresolved_scalar_falls_back_to_object() {
        let store = DefinitionStore::new();
        let generator = SchemaGenerator::new(&store, NamingScheme::Full);

        let schema = generator.member_schema(&member_for("Mystery", info("thing", "")));
        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        assert_eq!(schema.reference, None);
    }

    #[test]
    fn test_definitions_are_deterministic() {
        let mut store = DefinitionStore::new();
        store.add(definition(
            "Order",
            "struct",
            vec![
                member_for("i64", info("z_id", "required")),
                member_for("i64", info("a_total", "required")),
                targeted(member_for("User", info("buyer", "required"))),
            ],
        ));
        store.add(definition("User", "struct", vec![member_for("String", info("name", ""))]));
        let generator = SchemaGenerator::new(&store, NamingScheme::Full);

        let first = serde_json::to_string(&generator.definitions()).unwrap();
        let second = serde_json::to_string(&generator.definitions()).unwrap();

        assert_eq!(first, second);
        let order = &generator.definitions()["crates.models.Order"];
        assert_eq!(
            order.required,
            Some(vec!["z_id".to_string(), "a_total".to_string(), "buyer".to_string()])
        );
        assert_eq!(
            order.properties.as_ref().unwrap()["buyer"].reference.as_deref(),
            Some("#/definitions/crates.models.User")
        );
    }
}
