//! Cargo manifest reading.
//!
//! Only the parts of `Cargo.toml` that shape the unit graph are modelled: the
//! package name, the library target, `[dependencies]` and
//! `[workspace.dependencies]`. Everything else is ignored by serde.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const MANIFEST_FILE: &str = "Cargo.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    pub package: Option<PackageSection>,

    pub lib: Option<LibSection>,

    #[serde(default)]
    pub dependencies: IndexMap<String, Dependency>,

    pub workspace: Option<WorkspaceSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageSection {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibSection {
    pub name: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkspaceSection {
    #[serde(default)]
    pub dependencies: IndexMap<String, Dependency>,
}

/// A dependency entry, either `name = "1.0"` or `name = { ... }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
    Simple(String),
    Detailed(DependencyDetails),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DependencyDetails {
    pub path: Option<String>,

    /// Set when the dependency is renamed: the key is the local name and
    /// this is the real package.
    pub package: Option<String>,

    #[serde(default)]
    pub workspace: bool,
}

/// A dependency after `workspace = true` indirection has been followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    /// Name the dependent crate uses in its source
    pub crate_name: String,
    /// Directory of a path dependency, lexically normalized
    pub dir: Option<PathBuf>,
    /// Whether the key renames another package
    pub renamed: bool,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Reading manifest: {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Manifest {
            file: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// The library crate name as it is written in dependent source code.
    pub fn lib_name(&self) -> Option<String> {
        if let Some(name) = self.lib.as_ref().and_then(|lib| lib.name.clone()) {
            return Some(name);
        }
        self.package.as_ref().map(|p| crate_name(&p.name))
    }

    pub fn lib_path(&self) -> Option<&str> {
        self.lib.as_ref().and_then(|lib| lib.path.as_deref())
    }

    /// Resolves `[dependencies]` against the crate directory and, for
    /// `workspace = true` entries, against the enclosing workspace manifest.
    pub fn resolve_dependencies(
        &self,
        crate_dir: &Path,
        workspace: Option<&(PathBuf, Manifest)>,
    ) -> Vec<ResolvedDependency> {
        let mut resolved = Vec::with_capacity(self.dependencies.len());

        for (key, dependency) in &self.dependencies {
            let (details, base) = match dependency {
                Dependency::Simple(_) => (None, crate_dir),
                Dependency::Detailed(details) if details.workspace => {
                    match workspace.and_then(|(dir, ws)| ws.workspace_dependency(key).map(|d| (d, dir))) {
                        Some((Dependency::Detailed(ws_details), ws_dir)) => {
                            (Some(ws_details), ws_dir.as_path())
                        }
                        _ => (None, crate_dir),
                    }
                }
                Dependency::Detailed(details) => (Some(details), crate_dir),
            };

            let renamed = match dependency {
                Dependency::Detailed(details) => details.package.is_some(),
                Dependency::Simple(_) => false,
            } || details.is_some_and(|d| d.package.is_some());

            resolved.push(ResolvedDependency {
                crate_name: crate_name(key),
                dir: details
                    .and_then(|d| d.path.as_ref())
                    .map(|p| normalize_path(&base.join(p))),
                renamed,
            });
        }

        resolved
    }

    fn workspace_dependency(&self, key: &str) -> Option<&Dependency> {
        self.workspace.as_ref().and_then(|ws| ws.dependencies.get(key))
    }
}

/// Finds the nearest manifest with a `[workspace]` table above `crate_dir`,
/// without leaving `src_root`.
pub fn find_workspace(crate_dir: &Path, src_root: &Path) -> Result<Option<(PathBuf, Manifest)>> {
    for dir in crate_dir.ancestors() {
        if !dir.starts_with(src_root) {
            break;
        }
        let candidate = dir.join(MANIFEST_FILE);
        if !candidate.is_file() {
            continue;
        }
        let manifest = Manifest::load(&candidate)?;
        if manifest.workspace.is_some() {
            return Ok(Some((dir.to_path_buf(), manifest)));
        }
    }
    Ok(None)
}

/// Package names may use `-`; source code refers to the crate with `_`.
pub fn crate_name(package: &str) -> String {
    package.replace('-', "_")
}

/// Resolves `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
