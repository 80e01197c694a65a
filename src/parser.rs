use crate::error::{Error, Result};
use log::{debug, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// AST (Abstract Syntax Tree) parser for Rust source files.
///
/// The `AstParser` uses the `syn` crate to parse Rust source code. Besides
/// single files it can follow `mod` declarations from a crate root and
/// return every file of the module tree.
///
/// # Example
///
/// ```no_run
/// use swagger_from_source::parser::AstParser;
/// use std::path::Path;
///
/// let files = AstParser::parse_module_tree(Path::new("src/lib.rs")).unwrap();
/// println!("Parsed {} files", files.len());
/// ```
pub struct AstParser;

/// A successfully parsed Rust file with its abstract syntax tree.
///
/// The source text is kept alongside the tree: trailing `//` comments never
/// make it into the tree and have to be read back from the text.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// Raw file content
    pub source: String,
    /// The parsed abstract syntax tree
    pub syntax_tree: syn::File,
}

impl ParsedFile {
    /// Returns the 1-based `line` of the source, if it exists.
    pub fn line(&self, line: usize) -> Option<&str> {
        line.checked_sub(1).and_then(|idx| self.source.lines().nth(idx))
    }
}

impl AstParser {
    /// Parses a single Rust source file into an AST.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains invalid Rust syntax
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse_source(path, content)
    }

    /// Parses already loaded source text, attributing errors to `path`.
    pub fn parse_source(path: &Path, source: String) -> Result<ParsedFile> {
        let syntax_tree = syn::parse_file(&source).map_err(|e| Error::Parse {
            file: path.to_path_buf(),
            message: format!("{} (line {})", e, e.span().start().line),
        })?;

        Ok(ParsedFile {
            path: path.to_path_buf(),
            source,
            syntax_tree,
        })
    }

    /// Parses a crate root and every file reachable through `mod name;`.
    ///
    /// Module files are looked up the way rustc does it: `#[path = "..."]`
    /// relative to the declaring file, otherwise `name.rs` or `name/mod.rs`
    /// in the declaring module's directory. Modules gated by `#[cfg(test)]`
    /// are not followed. A declared module whose file cannot be found is
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if any reached file cannot be read or parsed.
    pub fn parse_module_tree(root_file: &Path) -> Result<Vec<ParsedFile>> {
        let mut files = Vec::new();
        let mut visited = HashSet::new();
        let module_dir = root_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self::parse_module_file(root_file, &module_dir, &mut files, &mut visited)?;

        debug!(
            "Module tree of {} spans {} files",
            root_file.display(),
            files.len()
        );
        Ok(files)
    }

    fn parse_module_file(
        path: &Path,
        module_dir: &Path,
        files: &mut Vec<ParsedFile>,
        visited: &mut HashSet<PathBuf>,
    ) -> Result<()> {
        if !visited.insert(path.to_path_buf()) {
            return Ok(());
        }

        let parsed = Self::parse_file(path)?;
        let mut children = Vec::new();
        collect_module_files(&parsed.syntax_tree.items, path, module_dir, &mut children);
        files.push(parsed);

        for (child, child_dir) in children {
            Self::parse_module_file(&child, &child_dir, files, visited)?;
        }
        Ok(())
    }
}

/// Whether the attributes contain `#[cfg(test)]`.
pub fn is_cfg_test(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && attr
                .parse_args::<syn::Ident>()
                .map(|ident| ident == "test")
                .unwrap_or(false)
    })
}

fn path_attribute(attrs: &[syn::Attribute]) -> Option<String> {
    attrs.iter().find_map(|attr| {
        if !attr.path().is_ident("path") {
            return None;
        }
        match &attr.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        }
    })
}

/// Finds out-of-line module files declared in `items`, pairing each with the
/// directory its own children live in.
fn collect_module_files(
    items: &[syn::Item],
    declaring_file: &Path,
    module_dir: &Path,
    out: &mut Vec<(PathBuf, PathBuf)>,
) {
    for item in items {
        let syn::Item::Mod(item_mod) = item else {
            continue;
        };
        if is_cfg_test(&item_mod.attrs) {
            continue;
        }

        let name = item_mod.ident.to_string();

        if let Some((_, nested)) = &item_mod.content {
            collect_module_files(nested, declaring_file, &module_dir.join(&name), out);
            continue;
        }

        if let Some(explicit) = path_attribute(&item_mod.attrs) {
            let base = declaring_file.parent().unwrap_or(module_dir);
            let file = base.join(explicit);
            let child_dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
            if file.is_file() {
                out.push((file, child_dir));
            } else {
                warn!("Module file not found: {}", file.display());
            }
            continue;
        }

        let flat = module_dir.join(format!("{}.rs", name));
        let nested = module_dir.join(&name).join("mod.rs");
        if flat.is_file() {
            out.push((flat, module_dir.join(&name)));
        } else if nested.is_file() {
            out.push((nested, module_dir.join(&name)));
        } else {
            warn!(
                "Module '{}' declared in {} has no file",
                name,
                declaring_file.display()
            );
        }
    }
}
