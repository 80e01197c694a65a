use crate::definition::{canonical_name, Definition};
use crate::type_ref::TypeRef;
use crate::unit_graph::UnitGraph;
use log::debug;
use std::collections::BTreeMap;

/// Definitions keyed by canonical name.
///
/// The store is the gate in front of the resolver: a reference whose
/// canonical name is already stored is never parsed again.
#[derive(Debug, Default)]
pub struct DefinitionStore {
    definitions: BTreeMap<String, Definition>,
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `definition`, replacing any definition with the same
    /// canonical name.
    pub fn add(&mut self, definition: Definition) {
        let name = definition.canonical_name();
        if self.definitions.insert(name.clone(), definition).is_some() {
            debug!("Replaced stored definition {}", name);
        }
    }

    pub fn get(&self, canonical_name: &str) -> Option<&Definition> {
        self.definitions.get(canonical_name)
    }

    /// Finds a stored definition for `text` as seen from `referring`,
    /// checking candidate units in the same order the resolver would.
    pub fn lookup(&self, graph: &UnitGraph, referring: &str, text: &str) -> Option<&Definition> {
        let type_ref = TypeRef::parse(text);
        graph
            .candidate_import_paths(referring, &type_ref)
            .iter()
            .find_map(|path| self.definitions.get(&canonical_name(path, &type_ref.name)))
    }

    /// Stored definitions in canonical-name order.
    pub fn definitions(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
