use crate::classifier::build_definition;
use crate::definition::Definition;
use crate::enum_extractor::extract_enum_values;
use crate::error::{Error, Result};
use crate::oracle::{select_group, SourceOracle};
use crate::type_ref::TypeRef;
use crate::unit_graph::UnitGraph;
use log::{debug, warn};

/// Resolves type references to freshly built definitions.
///
/// The resolver never consults the definition store; callers check the
/// store first and only come here on a miss.
pub struct TypeResolver<'a> {
    graph: &'a UnitGraph,
    oracle: &'a dyn SourceOracle,
}

impl<'a> TypeResolver<'a> {
    pub fn new(graph: &'a UnitGraph, oracle: &'a dyn SourceOracle) -> Self {
        Self { graph, oracle }
    }

    pub fn graph(&self) -> &'a UnitGraph {
        self.graph
    }

    /// Resolves `text` as written in the unit at `referring`.
    ///
    /// Candidate units are tried in order and the first one declaring the
    /// type wins. Returns `Ok(None)` when no candidate declares it.
    ///
    /// # Errors
    ///
    /// Fails when a candidate unit has no usable declaration group or cannot
    /// be parsed.
    pub fn resolve(&self, referring: &str, text: &str) -> Result<Option<Definition>> {
        let type_ref = TypeRef::parse(text);
        let candidates = self.graph.candidate_import_paths(referring, &type_ref);

        match candidates.len() {
            0 => warn!(
                "No unit imported by '{}' matches the type reference {}",
                referring, text
            ),
            1 => {}
            n => warn!(
                "Type reference {} in '{}' matches {} units; using the first that declares it",
                text, referring, n
            ),
        }

        for import_path in &candidates {
            // Ignored and unlocated units never made it into the graph
            if self.graph.get(import_path).is_none() {
                warn!("Unit '{}' is not loaded; skipping it for {}", import_path, text);
                continue;
            }
            let Some(groups) = self.oracle.load_unit(import_path)? else {
                warn!("Could not locate unit '{}' while resolving {}", import_path, text);
                continue;
            };
            let group = select_group(&groups).ok_or_else(|| Error::NoUsableGroup {
                unit: import_path.clone(),
            })?;

            let Some(decl) = group.find_type(&type_ref.name) else {
                debug!("Type {} not declared in '{}'", type_ref.name, import_path);
                continue;
            };

            let mut definition = build_definition(decl, &group.name, import_path);
            if definition.is_primitive() {
                definition.enumerations =
                    Some(extract_enum_values(self.oracle, import_path, &definition.name)?);
            }
            debug!("Resolved {} to {}", text, definition.canonical_name());
            return Ok(Some(definition));
        }

        Ok(None)
    }
}
