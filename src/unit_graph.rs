//! The compilation-unit graph: every unit reachable from the root.

use crate::error::{Error, Result};
use crate::oracle::{select_group, SourceOracle};
use crate::type_ref::TypeRef;
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    pub import_path: String,
    /// Declared unit name
    pub name: String,
    /// Imported unit import path to the local aliases naming it, in
    /// registration order
    pub imports: IndexMap<String, Vec<String>>,
}

/// Units keyed by import path. Built once by [`UnitGraph::load`].
#[derive(Debug, Clone, Default)]
pub struct UnitGraph {
    units: BTreeMap<String, CompilationUnit>,
}

impl UnitGraph {
    /// Loads the closure of units reachable from `root`.
    ///
    /// Units matching `ignore` (substring match on the import path) are not
    /// loaded. Units the oracle cannot locate are logged and left out; they
    /// act as leaves.
    ///
    /// # Errors
    ///
    /// Fails when a located unit has no usable declaration group, or when
    /// the oracle cannot parse a unit.
    pub fn load(root: &str, oracle: &dyn SourceOracle, ignore: &[String]) -> Result<Self> {
        let mut units = BTreeMap::new();
        let mut seen: HashSet<String> = HashSet::from([root.to_string()]);
        let mut queue: VecDeque<String> = VecDeque::from([root.to_string()]);

        while let Some(import_path) = queue.pop_front() {
            if let Some(pattern) = ignore.iter().find(|p| import_path.contains(p.as_str())) {
                info!("Ignoring unit '{}' (matches '{}')", import_path, pattern);
                continue;
            }

            let Some(groups) = oracle.load_unit(&import_path)? else {
                warn!("Could not locate unit '{}'", import_path);
                continue;
            };
            let group = select_group(&groups).ok_or_else(|| Error::NoUsableGroup {
                unit: import_path.clone(),
            })?;

            let mut imports: IndexMap<String, Vec<String>> = IndexMap::new();
            for import in &group.imports {
                if import.alias.as_deref() == Some("_") {
                    continue;
                }
                let aliases = imports.entry(import.path.clone()).or_default();
                if let Some(alias) = &import.alias {
                    if !aliases.contains(alias) {
                        aliases.push(alias.clone());
                    }
                }
                if seen.insert(import.path.clone()) {
                    queue.push_back(import.path.clone());
                }
            }

            debug!(
                "Unit '{}' ({}) imports {} units",
                import_path,
                group.name,
                imports.len()
            );
            units.insert(
                import_path.clone(),
                CompilationUnit {
                    import_path,
                    name: group.name.clone(),
                    imports,
                },
            );
        }

        let mut graph = Self { units };
        graph.add_implicit_aliases();
        Ok(graph)
    }

    /// Adds each imported unit's declared name to the alias set naming it.
    fn add_implicit_aliases(&mut self) {
        let names: BTreeMap<String, String> = self
            .units
            .iter()
            .map(|(path, unit)| (path.clone(), unit.name.clone()))
            .collect();

        for unit in self.units.values_mut() {
            for (path, aliases) in unit.imports.iter_mut() {
                if let Some(name) = names.get(path) {
                    if !aliases.contains(name) {
                        aliases.push(name.clone());
                    }
                }
            }
        }
    }

    pub fn get(&self, import_path: &str) -> Option<&CompilationUnit> {
        self.units.get(import_path)
    }

    pub fn units(&self) -> impl Iterator<Item = &CompilationUnit> {
        self.units.values()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Import paths that may declare `type_ref` as seen from `referring`.
    ///
    /// An unqualified reference can only mean the referring unit itself. A
    /// qualified one may mean any import whose alias set holds the alias;
    /// candidates come back in registration order.
    pub fn candidate_import_paths(&self, referring: &str, type_ref: &TypeRef) -> Vec<String> {
        let Some(alias) = &type_ref.alias else {
            return vec![referring.to_string()];
        };
        let Some(unit) = self.units.get(referring) else {
            return Vec::new();
        };

        unit.imports
            .iter()
            .filter(|(_, aliases)| aliases.contains(alias))
            .map(|(path, _)| path.clone())
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn from_units(units: Vec<CompilationUnit>) -> Self {
        Self {
            units: units
                .into_iter()
                .map(|unit| (unit.import_path.clone(), unit))
                .collect(),
        }
    }
}
