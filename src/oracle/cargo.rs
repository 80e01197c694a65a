//! Parser oracle backed by Cargo packages on disk.

use super::lower::{lower_group, LowerContext};
use super::{DeclGroup, ImportDecl, SourceOracle};
use crate::error::{Error, Result};
use crate::manifest::{find_workspace, normalize_path, Manifest, MANIFEST_FILE};
use crate::parser::AstParser;
use crate::scanner::CrateScanner;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Loads units from Cargo packages below a source root.
///
/// An import path is a package directory relative to the source root, with
/// `/` separators. Path dependencies inside the root become imports of
/// their directory; all other dependencies keep their crate name as import
/// path and can never be located.
pub struct CargoOracle {
    src_root: PathBuf,
}

impl CargoOracle {
    pub fn new(src_root: &Path) -> Result<Self> {
        let src_root = src_root
            .canonicalize()
            .map_err(|e| Error::io(src_root, e))?;
        Ok(Self { src_root })
    }

    pub fn src_root(&self) -> &Path {
        &self.src_root
    }

    /// Import path of a directory below the source root.
    pub fn import_path_of(&self, dir: &Path) -> Option<String> {
        let relative = dir.strip_prefix(&self.src_root).ok()?;
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        (!segments.is_empty()).then(|| segments.join("/"))
    }

    fn manifest_imports(
        &self,
        manifest: &Manifest,
        crate_dir: &Path,
    ) -> Result<(Vec<ImportDecl>, BTreeMap<String, String>)> {
        let workspace = find_workspace(crate_dir, &self.src_root)?;
        let mut imports = Vec::new();
        let mut crates = BTreeMap::new();

        for dependency in manifest.resolve_dependencies(crate_dir, workspace.as_ref()) {
            let import_path = match dependency.dir.as_deref() {
                Some(dir) => self.import_path_of(dir).unwrap_or_else(|| {
                    debug!(
                        "Dependency '{}' lives outside the source root: {}",
                        dependency.crate_name,
                        dir.display()
                    );
                    dependency.crate_name.clone()
                }),
                None => dependency.crate_name.clone(),
            };

            imports.push(ImportDecl {
                path: import_path.clone(),
                alias: dependency.renamed.then(|| dependency.crate_name.clone()),
            });
            crates.insert(dependency.crate_name, import_path);
        }

        Ok((imports, crates))
    }
}

impl SourceOracle for CargoOracle {
    fn load_unit(&self, import_path: &str) -> Result<Option<Vec<DeclGroup>>> {
        let crate_dir = normalize_path(&self.src_root.join(import_path));
        if !crate_dir.starts_with(&self.src_root) {
            return Ok(None);
        }
        let manifest_path = crate_dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Ok(None);
        }

        let manifest = Manifest::load(&manifest_path)?;
        let Some(unit_name) = manifest.lib_name() else {
            debug!("{} has no [package] section", manifest_path.display());
            return Ok(Some(Vec::new()));
        };

        let (imports, crates) = self.manifest_imports(&manifest, &crate_dir)?;
        let ctx = LowerContext { unit_name, crates };

        let scan = CrateScanner::new(crate_dir, manifest.lib_path()).scan()?;
        for warning in &scan.warnings {
            warn!("{}: {}", import_path, warning);
        }

        let mut groups = Vec::with_capacity(scan.targets.len());
        for target in scan.targets {
            let files = AstParser::parse_module_tree(&target.root_file)?;
            let mut group = lower_group(target.kind, &files, &ctx);
            group.imports.splice(0..0, imports.iter().cloned());
            groups.push(group);
        }

        debug!("Loaded unit '{}' with {} groups", import_path, groups.len());
        Ok(Some(groups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::TargetKind;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, path: &str, content: &str) {
        let file = root.join(path);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(file, content).unwrap();
    }

    #[test]
    fn test_missing_unit_is_not_located() {
        let temp_dir = TempDir::new().unwrap();
        let oracle = CargoOracle::new(temp_dir.path()).unwrap();

        assert!(oracle.load_unit("nothing/here").unwrap().is_none());
        assert!(oracle.load_unit("../escape").unwrap().is_none());
    }

    #[test]
    fn test_loads_groups_and_manifest_imports() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(
            root,
            "app/Cargo.toml",
            r#"
            [package]
            name = "my-app"

            [dependencies]
            serde = "1.0"
            shared = { path = "../shared", package = "shared-models" }
            "#,
        );
        write(root, "app/src/lib.rs", "pub mod model;\n");
        write(root, "app/src/model.rs", "pub struct Pet { pub name: String }\n");
        write(root, "app/src/main.rs", "fn main() {}\n");
        write(root, "app/tests/api.rs", "pub struct Fixture;\n");

        let oracle = CargoOracle::new(root).unwrap();
        let groups = oracle.load_unit("app").unwrap().unwrap();

        let kinds: Vec<TargetKind> = groups.iter().map(|g| g.kind).collect();
        assert_eq!(
            kinds,
            vec![TargetKind::Library, TargetKind::EntryPoint, TargetKind::Test]
        );
        assert_eq!(groups[0].name, "my_app");
        assert!(groups[0].find_type("Pet").is_some());
        assert_eq!(
            groups[0].imports,
            vec![
                ImportDecl {
                    path: "serde".to_string(),
                    alias: None,
                },
                ImportDecl {
                    path: "shared".to_string(),
                    alias: Some("shared".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_malformed_source_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "bad/Cargo.toml", "[package]\nname = \"bad\"\n");
        write(root, "bad/src/lib.rs", "pub struct {");

        let oracle = CargoOracle::new(root).unwrap();
        assert!(matches!(oracle.load_unit("bad"), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_import_path_of() {
        let temp_dir = TempDir::new().unwrap();
        let oracle = CargoOracle::new(temp_dir.path()).unwrap();
        let root = oracle.src_root().to_path_buf();

        assert_eq!(
            oracle.import_path_of(&root.join("crates").join("models")),
            Some("crates/models".to_string())
        );
        assert_eq!(oracle.import_path_of(&root), None);
        assert_eq!(oracle.import_path_of(Path::new("/elsewhere")), None);
    }
}
