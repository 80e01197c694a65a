//! One generation run: graph loading, annotation extraction, type
//! definition and document assembly.

use crate::definition::NamingScheme;
use crate::error::Result;
use crate::extractor::api::parse_api;
use crate::extractor::operation::{parse_operation, tag_operations};
use crate::extractor::{api_blocks, operation_blocks, CommentBlock, OperationInfo};
use crate::flattener::Definer;
use crate::oracle::{SourceOracle, TargetKind};
use crate::openapi_builder::{OpenApiBuilder, SwaggerDocument};
use crate::schema_generator::SchemaGenerator;
use crate::type_resolver::TypeResolver;
use crate::unit_graph::UnitGraph;
use log::{debug, info};

/// What to generate and how to name it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Import path of the root unit
    pub root: String,
    pub naming: NamingScheme,
    /// Substrings of import paths that are never loaded
    pub ignore: Vec<String>,
}

/// Generates the Swagger document for everything reachable from
/// `config.root`.
///
/// # Errors
///
/// Fails on any unresolvable type reference, on a unit without a usable
/// declaration group, and on source or manifest that cannot be parsed.
pub fn generate(config: &GeneratorConfig, oracle: &dyn SourceOracle) -> Result<SwaggerDocument> {
    info!("Loading units reachable from '{}'", config.root);
    let graph = UnitGraph::load(&config.root, oracle, &config.ignore)?;
    info!("Loaded {} units", graph.len());

    let blocks = collect_comments(&graph, oracle)?;
    let api = parse_api(&api_blocks(&blocks));
    let mut operations: Vec<OperationInfo> = operation_blocks(&blocks)
        .into_iter()
        .filter_map(parse_operation)
        .collect();
    tag_operations(&api, &mut operations);
    info!("Found {} operations", operations.len());

    let mut definer = Definer::new(TypeResolver::new(&graph, oracle));
    for operation in &mut operations {
        for response in &mut operation.responses {
            definer.define_member(&mut response.member, &operation.unit)?;
        }
        for parameter in &mut operation.parameters {
            definer.define_member(&mut parameter.member, &operation.unit)?;
        }
    }
    let store = definer.into_store();
    info!("Defined {} types", store.len());

    let schema_gen = SchemaGenerator::new(&store, config.naming);
    let mut builder = OpenApiBuilder::new().with_api(&api);
    for operation in &operations {
        builder.add_operation(operation, &schema_gen);
    }
    Ok(builder.build(schema_gen.definitions()))
}

/// Doc-comment blocks of every non-test group of every unit, in import-path
/// order.
pub fn collect_comments(graph: &UnitGraph, oracle: &dyn SourceOracle) -> Result<Vec<CommentBlock>> {
    let mut blocks = Vec::new();

    for unit in graph.units() {
        let Some(groups) = oracle.load_unit(&unit.import_path)? else {
            continue;
        };
        for group in groups.iter().filter(|g| g.kind != TargetKind::Test) {
            blocks.extend(group.comments.iter().map(|text| CommentBlock {
                unit: unit.import_path.clone(),
                text: text.clone(),
            }));
        }
    }

    debug!("Collected {} comment blocks", blocks.len());
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::oracle::testing::MemoryOracle;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn pet_store() -> MemoryOracle {
        MemoryOracle::new()
            .unit(
                "services/api",
                "api",
                &[("models", "crates/models")],
                r#"
                //! @APITitle Pet Store
                //! @APIVersion 1.0.0
                //! @BasePath /v1
                //! @SubApi Pets [/pets]

                /// @Title Get a pet
                /// @Param id path i64 true "Pet id"
                /// @Success 200 {object} models::Pet "The pet"
                /// @Router /pets/{id} [get]
                pub fn get_pet() {}
                "#,
            )
            .unit(
                "crates/models",
                "models",
                &[],
                r#"
                /// A pet
                pub struct Pet {
                    #[validate(length(min = 1))]
                    pub name: String,
                    pub kind: Kind,
                }

                pub enum Kind { Cat, Dog }
                "#,
            )
            .group(
                "crates/models",
                "models",
                TargetKind::Test,
                &[],
                "/// @Router /never [get]\nfn hidden() {}",
            )
    }

    fn config(naming: NamingScheme) -> GeneratorConfig {
        GeneratorConfig {
            root: "services/api".to_string(),
            naming,
            ignore: Vec::new(),
        }
    }

    #[test]
    fn test_generate_document() {
        let document = generate(&config(NamingScheme::Partial), &pet_store()).unwrap();
        let value = serde_json::to_value(&document).unwrap();

        assert_eq!(value["info"]["title"], "Pet Store");
        assert_eq!(value["basePath"], "/v1");
        assert_eq!(value["paths"]["/pets/{id}"]["get"]["tags"], json!(["Pets"]));
        assert!(value["paths"].get("/never").is_none());
        assert_eq!(
            value["paths"]["/pets/{id}"]["get"]["responses"]["200"]["schema"],
            json!({"$ref": "#/definitions/models.Pet"})
        );
        assert_eq!(
            value["definitions"]["models.Kind"]["enum"],
            json!(["Cat", "Dog"])
        );
        assert_eq!(
            value["definitions"]["models.Pet"]["properties"]["kind"],
            json!({"$ref": "#/definitions/models.Kind"})
        );
    }

    #[test]
    fn test_references_resolve_under_every_naming_scheme() {
        for naming in [NamingScheme::Full, NamingScheme::Partial, NamingScheme::Simple] {
            let document = generate(&config(naming), &pet_store()).unwrap();
            let value = serde_json::to_value(&document).unwrap();
            let reference = value["paths"]["/pets/{id}"]["get"]["responses"]["200"]["schema"]
                ["$ref"]
                .as_str()
                .unwrap()
                .trim_start_matches("#/definitions/")
                .to_string();
            assert!(
                document.definitions.contains_key(&reference),
                "{:?}: {} missing",
                naming,
                reference
            );
        }
    }

    #[test]
    fn test_unresolved_response_type_is_fatal() {
        let oracle = MemoryOracle::new().unit(
            "services/api",
            "api",
            &[],
            "/// @Success 200 {object} Missing \"Nope\"\n/// @Router /x [get]\npub fn x() {}",
        );

        let result = generate(&config(NamingScheme::Full), &oracle);

        assert!(matches!(
            result,
            Err(Error::UnresolvedType { type_name, .. }) if type_name == "Missing"
        ));
    }
}
