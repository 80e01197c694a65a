//! Full definition of types: embedded merging and member target resolution.

use crate::definition::{Definition, Member, TargetUnit};
use crate::error::{Error, Result};
use crate::store::DefinitionStore;
use crate::type_ref::{is_primitive, shape, TypeShape};
use crate::type_resolver::TypeResolver;
use log::{debug, warn};
use std::collections::HashSet;

/// Drives definitions from "stored" to "fully defined".
///
/// Every canonical name is defined at most once per run, which also stops
/// recursion through self-referential and mutually-referential types.
pub struct Definer<'a> {
    resolver: TypeResolver<'a>,
    store: DefinitionStore,
    defined: HashSet<String>,
}

impl<'a> Definer<'a> {
    pub fn new(resolver: TypeResolver<'a>) -> Self {
        Self {
            resolver,
            store: DefinitionStore::new(),
            defined: HashSet::new(),
        }
    }

    pub fn store(&self) -> &DefinitionStore {
        &self.store
    }

    pub fn into_store(self) -> DefinitionStore {
        self.store
    }

    /// Resolves every non-primitive scalar reachable from `member`, setting
    /// its target and fully defining the target type.
    ///
    /// # Errors
    ///
    /// [`Error::UnresolvedType`] when a reference names no known type.
    pub fn define_member(&mut self, member: &mut Member, referring: &str) -> Result<()> {
        match member {
            Member::Collection { element, .. } => self.define_member(element, referring),
            Member::Mapping { key, value, .. } => {
                self.define_member(key, referring)?;
                self.define_member(value, referring)
            }
            Member::Scalar(scalar) => {
                if scalar.is_primitive() || scalar.target.is_some() {
                    return Ok(());
                }
                let Some((canonical, target)) = self.find_or_resolve(referring, &scalar.type_text)?
                else {
                    return Err(Error::UnresolvedType {
                        type_name: scalar.type_text.clone(),
                        field: scalar.info.name.clone(),
                        unit: referring.to_string(),
                    });
                };
                scalar.target = Some(target);
                self.define_all(&canonical)
            }
        }
    }

    /// Flattens the stored definition `canonical` and defines all of its
    /// members, then writes it back to the store.
    pub fn define_all(&mut self, canonical: &str) -> Result<()> {
        if !self.defined.insert(canonical.to_string()) {
            return Ok(());
        }
        let Some(mut definition) = self.store.get(canonical).cloned() else {
            warn!("Definition {} is not stored; nothing to define", canonical);
            return Ok(());
        };
        debug!("Defining {}", canonical);

        self.flatten(&mut definition)?;

        let fallback = definition.import_path.clone();
        for member in definition.members.values_mut() {
            let referring = match member.info().origin.as_str() {
                "" => fallback.clone(),
                origin => origin.to_string(),
            };
            self.define_member(member, &referring)?;
        }

        self.store.add(definition);
        Ok(())
    }

    /// Merges the members of every embedded type into `definition`.
    ///
    /// Embedded types are fully defined first. A member the host already
    /// declares is never replaced.
    ///
    /// # Errors
    ///
    /// [`Error::UnresolvedEmbedded`] when an embedded type cannot be found.
    pub fn flatten(&mut self, definition: &mut Definition) -> Result<()> {
        let embedded = std::mem::take(&mut definition.embedded);

        for text in &embedded {
            match shape(text) {
                TypeShape::Scalar(scalar) if !is_primitive(scalar) => {}
                _ => {
                    warn!(
                        "Embedded field of type {} in {} has no members to merge",
                        text,
                        definition.canonical_name()
                    );
                    continue;
                }
            }

            let Some((canonical, _)) = self.find_or_resolve(&definition.import_path, text)? else {
                return Err(Error::UnresolvedEmbedded {
                    host: definition.canonical_name(),
                    embedded: text.clone(),
                });
            };
            self.define_all(&canonical)?;

            let Some(source) = self.store.get(&canonical) else {
                continue;
            };
            for (name, member) in &source.members {
                if !definition.members.contains_key(name) {
                    definition.members.insert(name.clone(), member.clone());
                }
            }
        }
        Ok(())
    }

    /// Stored definition for `text`, resolving and storing it on a miss.
    fn find_or_resolve(
        &mut self,
        referring: &str,
        text: &str,
    ) -> Result<Option<(String, TargetUnit)>> {
        let graph = self.resolver.graph();
        if let Some(found) = self.store.lookup(graph, referring, text) {
            return Ok(Some(identify(found)));
        }

        let Some(definition) = self.resolver.resolve(referring, text)? else {
            return Ok(None);
        };
        let found = identify(&definition);
        self.store.add(definition);
        Ok(Some(found))
    }
}

fn identify(definition: &Definition) -> (String, TargetUnit) {
    (
        definition.canonical_name(),
        TargetUnit {
            unit_name: definition.unit_name.clone(),
            import_path: definition.import_path.clone(),
        },
    )
}
