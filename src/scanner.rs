use crate::error::{Error, Result};
use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Kind of build target found inside a crate directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Library,
    EntryPoint,
    Test,
}

/// One build target: its kind and the root file of its module tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub kind: TargetKind,
    pub root_file: PathBuf,
}

/// Target scanner for a single crate directory.
///
/// Mirrors Cargo's target auto-discovery: the library root, the main binary,
/// `src/bin` binaries and `tests` integration tests. Hidden directories and
/// `target` are never entered.
///
/// # Example
///
/// ```no_run
/// use swagger_from_source::scanner::CrateScanner;
/// use std::path::PathBuf;
///
/// let scanner = CrateScanner::new(PathBuf::from("./models"), None);
/// let result = scanner.scan().unwrap();
/// println!("Found {} targets", result.targets.len());
/// ```
pub struct CrateScanner {
    crate_dir: PathBuf,
    lib_path: Option<PathBuf>,
}

/// Result of a target scan.
///
/// Targets are ordered library first, then entry points, then tests, each
/// group sorted by path.
pub struct ScanResult {
    pub targets: Vec<Target>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl CrateScanner {
    /// Creates a scanner for `crate_dir`.
    ///
    /// # Arguments
    ///
    /// * `crate_dir` - Directory holding the crate's `Cargo.toml`
    /// * `lib_path` - The `[lib] path` override, relative to `crate_dir`
    pub fn new(crate_dir: PathBuf, lib_path: Option<&str>) -> Self {
        let lib_path = lib_path.map(|p| crate_dir.join(p));
        Self { crate_dir, lib_path }
    }

    /// Discovers the crate's targets.
    ///
    /// # Errors
    ///
    /// Returns an error if the crate directory cannot be accessed.
    pub fn scan(&self) -> Result<ScanResult> {
        if !self.crate_dir.is_dir() {
            return Err(Error::io(
                &self.crate_dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "crate directory not found"),
            ));
        }

        let mut targets = Vec::new();
        let mut warnings = Vec::new();

        let lib_root = self
            .lib_path
            .clone()
            .unwrap_or_else(|| self.crate_dir.join("src").join("lib.rs"));
        if lib_root.is_file() {
            targets.push(Target {
                kind: TargetKind::Library,
                root_file: lib_root,
            });
        }

        let main_root = self.crate_dir.join("src").join("main.rs");
        if main_root.is_file() {
            targets.push(Target {
                kind: TargetKind::EntryPoint,
                root_file: main_root,
            });
        }

        let bin_dir = self.crate_dir.join("src").join("bin");
        for root_file in collect_target_roots(&bin_dir, &mut warnings) {
            targets.push(Target {
                kind: TargetKind::EntryPoint,
                root_file,
            });
        }

        let tests_dir = self.crate_dir.join("tests");
        for root_file in collect_target_roots(&tests_dir, &mut warnings) {
            targets.push(Target {
                kind: TargetKind::Test,
                root_file,
            });
        }

        Ok(ScanResult { targets, warnings })
    }
}

/// Collects `dir/*.rs` and `dir/*/main.rs`, sorted.
fn collect_target_roots(dir: &Path, warnings: &mut Vec<String>) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut roots = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let file_name = e.file_name().to_string_lossy();
            !file_name.starts_with('.') && file_name != "target"
        })
    {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("rs") {
                    continue;
                }
                let is_flat = entry.depth() == 1;
                let is_nested_main = entry.depth() == 2 && entry.file_name() == "main.rs";
                if is_flat || is_nested_main {
                    roots.push(path.to_path_buf());
                }
            }
            Err(e) => {
                let warning = format!("Failed to access path: {}", e);
                warn!("{}", warning);
                warnings.push(warning);
            }
        }
    }

    roots
}
