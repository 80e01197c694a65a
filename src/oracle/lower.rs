//! Lowering of `syn` trees into the oracle's declaration model.

use super::{ConstDecl, DeclGroup, FieldDecl, ImportDecl, TargetKind, TypeDecl, WireTag, COMPOSITE};
use crate::parser::{is_cfg_test, ParsedFile};
use log::{debug, warn};
use quote::ToTokens;
use std::collections::{BTreeMap, HashMap, HashSet};
use syn::ext::IdentExt;
use syn::visit::{self, Visit};
use syn::{Attribute, Expr, Fields, Item, Lit, Type};

/// Crate-level facts the lowering needs from the manifest.
#[derive(Debug, Clone, Default)]
pub struct LowerContext {
    /// Declared unit name
    pub unit_name: String,
    /// Dependency crate names as written in source, mapped to import paths
    pub crates: BTreeMap<String, String>,
}

const POINTER_WRAPPERS: &[&str] = &["Option", "Box", "Rc", "Arc", "Cell", "RefCell", "Cow"];
const SEQUENCES: &[&str] = &[
    "Vec",
    "VecDeque",
    "LinkedList",
    "HashSet",
    "BTreeSet",
    "IndexSet",
    "BinaryHeap",
];
const MAPS: &[&str] = &["HashMap", "BTreeMap", "IndexMap"];

/// Lowers the files of one build target into a declaration group.
pub fn lower_group(kind: TargetKind, files: &[ParsedFile], ctx: &LowerContext) -> DeclGroup {
    let mut group = DeclGroup::new(&ctx.unit_name, kind);

    for file in files {
        let mut uses = UseMap::from_crates(ctx);
        uses.collect_items(&file.syntax_tree.items, ctx, &mut group.imports);

        let lowerer = FileLowerer { file, uses: &uses };
        lowerer.lower_items(&file.syntax_tree.items, &mut group);

        let mut collector = CommentCollector {
            blocks: &mut group.comments,
        };
        collector.visit_file(&file.syntax_tree);
    }

    debug!(
        "Lowered {:?} group of '{}': {} types, {} consts, {} comment blocks",
        kind,
        ctx.unit_name,
        group.types.len(),
        group.consts.len(),
        group.comments.len()
    );
    group
}

/// Local names that refer to another crate, mapped to the qualifier used in
/// type text.
struct UseMap {
    qualifiers: HashMap<String, String>,
    /// Local names bound to an item, mapped to the item's declared name
    items: HashMap<String, String>,
}

impl UseMap {
    fn from_crates(ctx: &LowerContext) -> Self {
        let qualifiers = ctx
            .crates
            .keys()
            .map(|name| (name.clone(), name.clone()))
            .collect();
        Self {
            qualifiers,
            items: HashMap::new(),
        }
    }

    fn collect_items(&mut self, items: &[Item], ctx: &LowerContext, imports: &mut Vec<ImportDecl>) {
        for item in items {
            match item {
                Item::Use(item_use) => {
                    self.collect_tree(&item_use.tree, Vec::new(), ctx, imports);
                }
                Item::ExternCrate(extern_crate) => {
                    let name = extern_crate.ident.unraw().to_string();
                    if let Some((_, rename)) = &extern_crate.rename {
                        self.record(rename.unraw().to_string(), vec![name], ctx, imports);
                    }
                }
                Item::Mod(item_mod) if !is_cfg_test(&item_mod.attrs) => {
                    if let Some((_, nested)) = &item_mod.content {
                        self.collect_items(nested, ctx, imports);
                    }
                }
                _ => {}
            }
        }
    }

    fn collect_tree(
        &mut self,
        tree: &syn::UseTree,
        mut prefix: Vec<String>,
        ctx: &LowerContext,
        imports: &mut Vec<ImportDecl>,
    ) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.unraw().to_string());
                self.collect_tree(&path.tree, prefix, ctx, imports);
            }
            syn::UseTree::Name(name) => {
                let ident = name.ident.unraw().to_string();
                if ident == "self" {
                    if let Some(local) = prefix.last().cloned() {
                        self.record(local, prefix, ctx, imports);
                    }
                } else {
                    prefix.push(ident.clone());
                    self.record(ident, prefix, ctx, imports);
                }
            }
            syn::UseTree::Rename(rename) => {
                let ident = rename.ident.unraw().to_string();
                if ident != "self" {
                    prefix.push(ident);
                }
                self.record(rename.rename.unraw().to_string(), prefix, ctx, imports);
            }
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.collect_tree(item, prefix.clone(), ctx, imports);
                }
            }
            syn::UseTree::Glob(_) => {}
        }
    }

    /// Records that `local` names `full`. Only paths into another crate are
    /// kept; a bare crate under a new name is also an import alias.
    fn record(&mut self, local: String, full: Vec<String>, ctx: &LowerContext, imports: &mut Vec<ImportDecl>) {
        let Some(first) = full.first() else {
            return;
        };
        let Some(import_path) = ctx.crates.get(first) else {
            return;
        };
        if local == "_" {
            return;
        }

        if full.len() == 1 {
            if &local != first {
                let import = ImportDecl {
                    path: import_path.clone(),
                    alias: Some(local.clone()),
                };
                if !imports.contains(&import) {
                    imports.push(import);
                }
            }
            self.items.remove(&local);
            self.qualifiers.insert(local.clone(), local);
        } else {
            let qualifier = self
                .qualifiers
                .get(first)
                .cloned()
                .unwrap_or_else(|| first.clone());
            if let Some(item) = full.last() {
                self.items.insert(local.clone(), item.clone());
            }
            self.qualifiers.insert(local, qualifier);
        }
    }
}

/// Renders `syn` types into type text.
struct TypeRenderer<'a> {
    uses: &'a UseMap,
    generics: HashSet<String>,
}

impl TypeRenderer<'_> {
    fn render(&self, ty: &Type) -> String {
        match ty {
            Type::Reference(reference) => format!("*{}", self.render(&reference.elem)),
            Type::Ptr(ptr) => format!("*{}", self.render(&ptr.elem)),
            Type::Slice(slice) => format!("[]{}", self.render(&slice.elem)),
            Type::Array(array) => format!("[]{}", self.render(&array.elem)),
            Type::Paren(paren) => self.render(&paren.elem),
            Type::Group(group) => self.render(&group.elem),
            Type::Tuple(tuple) if tuple.elems.is_empty() => "any".to_string(),
            Type::Tuple(_) => "[]any".to_string(),
            Type::Path(type_path) if type_path.qself.is_none() => self.render_path(&type_path.path),
            _ => "any".to_string(),
        }
    }

    fn render_path(&self, path: &syn::Path) -> String {
        let Some(last) = path.segments.last() else {
            return "any".to_string();
        };
        let ident = last.ident.unraw().to_string();
        let args = type_arguments(&last.arguments);

        if POINTER_WRAPPERS.contains(&ident.as_str()) {
            if let Some(inner) = args.last() {
                return format!("*{}", self.render(inner));
            }
        }
        if SEQUENCES.contains(&ident.as_str()) {
            if let Some(inner) = args.first() {
                return format!("[]{}", self.render(inner));
            }
        }
        if MAPS.contains(&ident.as_str()) && args.len() >= 2 {
            return format!("map[{}]{}", self.render(args[0]), self.render(args[1]));
        }

        if path.segments.len() == 1 && self.generics.contains(&ident) {
            return "any".to_string();
        }

        let first = path.segments[0].ident.unraw().to_string();
        let qualifier = if path.segments.len() == 1 {
            self.uses.qualifiers.get(&first).filter(|q| **q != first)
        } else {
            self.uses.qualifiers.get(&first)
        };

        // `use dep::Item as Local` still names `Item` in the other crate
        let name = match self.uses.items.get(&ident) {
            Some(item) if path.segments.len() == 1 => item.clone(),
            _ => ident,
        };

        match qualifier {
            Some(qualifier) => format!("{}.{}", qualifier, name),
            None => name,
        }
    }
}

fn type_arguments(arguments: &syn::PathArguments) -> Vec<&Type> {
    match arguments {
        syn::PathArguments::AngleBracketed(angle) => angle
            .args
            .iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

struct FileLowerer<'a> {
    file: &'a ParsedFile,
    uses: &'a UseMap,
}

impl FileLowerer<'_> {
    fn renderer(&self, generics: &syn::Generics) -> TypeRenderer<'_> {
        TypeRenderer {
            uses: self.uses,
            generics: generics
                .type_params()
                .map(|param| param.ident.to_string())
                .collect(),
        }
    }

    fn lower_items(&self, items: &[Item], group: &mut DeclGroup) {
        for item in items {
            match item {
                Item::Struct(item_struct) => group.types.push(self.lower_struct(item_struct)),
                Item::Enum(item_enum) => self.lower_enum(item_enum, group),
                Item::Type(item_type) => {
                    let renderer = self.renderer(&item_type.generics);
                    group.types.push(TypeDecl {
                        name: item_type.ident.unraw().to_string(),
                        doc: doc_text(&item_type.attrs),
                        underlying: renderer.render(&item_type.ty),
                        fields: Vec::new(),
                    });
                }
                Item::Const(item_const) => {
                    let renderer = self.renderer(&item_const.generics);
                    group.consts.push(ConstDecl {
                        names: vec![item_const.ident.unraw().to_string()],
                        type_text: renderer.render(&item_const.ty),
                        values: const_values(&item_const.expr),
                    });
                }
                Item::Mod(item_mod) if !is_cfg_test(&item_mod.attrs) => {
                    if let Some((_, nested)) = &item_mod.content {
                        self.lower_items(nested, group);
                    }
                }
                _ => {}
            }
        }
    }

    fn lower_struct(&self, item: &syn::ItemStruct) -> TypeDecl {
        let renderer = self.renderer(&item.generics);
        let name = item.ident.unraw().to_string();
        let doc = doc_text(&item.attrs);

        match &item.fields {
            Fields::Named(named) => TypeDecl {
                name,
                doc,
                underlying: COMPOSITE.to_string(),
                fields: named
                    .named
                    .iter()
                    .map(|field| self.lower_field(field, &renderer))
                    .collect(),
            },
            Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => TypeDecl {
                name,
                doc,
                underlying: renderer.render(&unnamed.unnamed[0].ty),
                fields: Vec::new(),
            },
            _ => TypeDecl {
                name,
                doc,
                underlying: COMPOSITE.to_string(),
                fields: Vec::new(),
            },
        }
    }

    /// Fieldless enums serialize as their variant names, so they become a
    /// string type plus one constant per variant.
    fn lower_enum(&self, item: &syn::ItemEnum, group: &mut DeclGroup) {
        let name = item.ident.unraw().to_string();
        let doc = doc_text(&item.attrs);
        let fieldless = !item.variants.is_empty()
            && item
                .variants
                .iter()
                .all(|variant| matches!(variant.fields, Fields::Unit));

        if !fieldless {
            group.types.push(TypeDecl {
                name,
                doc,
                underlying: COMPOSITE.to_string(),
                fields: Vec::new(),
            });
            return;
        }

        for variant in &item.variants {
            let serde = attribute_entries(&variant.attrs, "serde");
            if serde.iter().any(|(key, _)| key == "skip" || key == "skip_serializing") {
                continue;
            }
            let variant_name = variant.ident.unraw().to_string();
            let wire_name = renamed(&serde).unwrap_or_else(|| variant_name.clone());
            group.consts.push(ConstDecl {
                names: vec![variant_name],
                type_text: name.clone(),
                values: vec![format!("\"{}\"", wire_name)],
            });
        }

        group.types.push(TypeDecl {
            name,
            doc,
            underlying: "String".to_string(),
            fields: Vec::new(),
        });
    }

    fn lower_field(&self, field: &syn::Field, renderer: &TypeRenderer<'_>) -> FieldDecl {
        let serde = attribute_entries(&field.attrs, "serde");
        let flatten = serde.iter().any(|(key, _)| key == "flatten");

        let skipped = serde
            .iter()
            .any(|(key, _)| key == "skip" || key == "skip_serializing");
        let omit_empty = serde.iter().any(|(key, _)| key == "skip_serializing_if");
        let wire_name = if skipped {
            Some("-".to_string())
        } else {
            renamed(&serde)
        };
        let wire = (wire_name.is_some() || omit_empty).then(|| WireTag {
            name: wire_name.unwrap_or_default(),
            omit_empty,
        });

        FieldDecl {
            name: if flatten {
                None
            } else {
                field.ident.as_ref().map(|ident| ident.unraw().to_string())
            },
            type_text: renderer.render(&field.ty),
            exported: matches!(field.vis, syn::Visibility::Public(_)),
            wire,
            validate: validation_expression(&field.attrs),
            doc: doc_text(&field.attrs),
            comment: self.trailing_comment(field),
            deprecated: field.attrs.iter().any(|attr| attr.path().is_ident("deprecated")),
        }
    }

    /// Reads a `// ...` comment following the field on its last line.
    fn trailing_comment(&self, field: &syn::Field) -> String {
        let Some(last) = field.to_token_stream().into_iter().last() else {
            return String::new();
        };
        let end = last.span().end();
        let Some(line) = self.file.line(end.line) else {
            return String::new();
        };

        let rest: String = line.chars().skip(end.column).collect();
        let rest = rest.trim_start().trim_start_matches(',').trim_start();
        match rest.strip_prefix("//") {
            Some(comment) => comment.trim_start_matches('/').trim().to_string(),
            None => String::new(),
        }
    }
}

fn renamed(serde: &[(String, Option<String>)]) -> Option<String> {
    serde
        .iter()
        .find(|(key, _)| key == "rename" || key == "rename.serialize")
        .and_then(|(_, value)| value.clone())
}

/// Joins `///` lines into one block.
pub fn doc_text(attrs: &[Attribute]) -> String {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(syn::ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
        .map(|line| line.strip_prefix(' ').unwrap_or(&line).trim_end().to_string())
        .collect();

    lines.join("\n").trim().to_string()
}

/// Flattens `#[name(...)]` attributes into `(key, value)` pairs. Nested
/// lists produce dotted keys, e.g. `rename(serialize = "x")` gives
/// `("rename.serialize", Some("x"))`.
pub fn attribute_entries(attrs: &[Attribute], name: &str) -> Vec<(String, Option<String>)> {
    let mut entries = Vec::new();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident(name)) {
        if !matches!(attr.meta, syn::Meta::List(_)) {
            continue;
        }
        let result = attr.parse_nested_meta(|meta| collect_entry(meta, None, &mut entries));
        if let Err(e) = result {
            warn!("Ignoring malformed #[{}] attribute: {}", name, e);
        }
    }

    entries
}

fn collect_entry(
    meta: syn::meta::ParseNestedMeta,
    prefix: Option<&str>,
    out: &mut Vec<(String, Option<String>)>,
) -> syn::Result<()> {
    let key = match meta.path.get_ident() {
        Some(ident) => ident.unraw().to_string(),
        None => meta.path.to_token_stream().to_string().replace(' ', ""),
    };
    let key = match prefix {
        Some(prefix) => format!("{}.{}", prefix, key),
        None => key,
    };

    if meta.input.peek(syn::Token![=]) {
        let value: Expr = meta.value()?.parse()?;
        out.push((key, Some(expr_text(&value))));
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|nested| collect_entry(nested, Some(&key), out))?;
    } else {
        out.push((key, None));
    }
    Ok(())
}

fn expr_text(expr: &Expr) -> String {
    match expr {
        Expr::Lit(syn::ExprLit {
            lit: Lit::Str(s), ..
        }) => s.value(),
        _ => expr.to_token_stream().to_string().replace(' ', ""),
    }
}

/// Builds the validation expression from `#[validate(...)]` attributes.
///
/// The `length(...)` and `range(...)` forms of the validator crate map onto
/// the flat keywords (`min`, `max`, `len`, `gt`, `lt`). A string literal
/// argument is taken as a ready-made expression.
pub fn validation_expression(attrs: &[Attribute]) -> Option<String> {
    let mut parts = Vec::new();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("validate")) {
        if let Ok(raw) = attr.parse_args::<syn::LitStr>() {
            parts.push(raw.value());
            continue;
        }
        for (key, value) in attribute_entries(std::slice::from_ref(attr), "validate") {
            let keyword = match key.as_str() {
                "length.min" | "range.min" => "min",
                "length.max" | "range.max" => "max",
                "length.equal" => "len",
                "range.exclusive_min" => "gt",
                "range.exclusive_max" => "lt",
                other => other,
            };
            match value {
                Some(value) => parts.push(format!("{}={}", keyword, value)),
                None => parts.push(keyword.to_string()),
            }
        }
    }

    (!parts.is_empty()).then(|| parts.join(","))
}

/// Literal values of a constant initializer, as source text.
fn const_values(expr: &Expr) -> Vec<String> {
    match expr {
        Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(text),
            ..
        }) => vec![format!("\"{}\"", text.value())],
        Expr::Lit(lit) => vec![lit.lit.to_token_stream().to_string()],
        Expr::Call(call) if call.args.len() == 1 => const_values(&call.args[0]),
        Expr::Paren(paren) => const_values(&paren.expr),
        Expr::Group(group) => const_values(&group.expr),
        Expr::Reference(reference) => const_values(&reference.expr),
        Expr::Unary(syn::ExprUnary {
            op: syn::UnOp::Neg(_),
            expr,
            ..
        }) => const_values(expr)
            .into_iter()
            .map(|value| format!("-{}", value))
            .collect(),
        Expr::Tuple(tuple) => tuple.elems.iter().flat_map(const_values).collect(),
        Expr::Array(array) => array.elems.iter().flat_map(const_values).collect(),
        other => vec![other.to_token_stream().to_string()],
    }
}

/// Collects doc-comment blocks of items, impl and trait methods, and inner
/// `//!` docs.
struct CommentCollector<'a> {
    blocks: &'a mut Vec<String>,
}

impl CommentCollector<'_> {
    fn push(&mut self, attrs: &[Attribute]) {
        let block = doc_text(attrs);
        if !block.is_empty() {
            self.blocks.push(block);
        }
    }
}

impl<'ast> Visit<'ast> for CommentCollector<'_> {
    fn visit_file(&mut self, file: &'ast syn::File) {
        self.push(&file.attrs);
        visit::visit_file(self, file);
    }

    fn visit_item(&mut self, item: &'ast Item) {
        if let Item::Mod(item_mod) = item {
            if is_cfg_test(&item_mod.attrs) {
                return;
            }
        }
        if let Some(attrs) = item_attrs(item) {
            self.push(attrs);
        }
        visit::visit_item(self, item);
    }

    fn visit_impl_item_fn(&mut self, method: &'ast syn::ImplItemFn) {
        self.push(&method.attrs);
        visit::visit_impl_item_fn(self, method);
    }

    fn visit_trait_item_fn(&mut self, method: &'ast syn::TraitItemFn) {
        self.push(&method.attrs);
        visit::visit_trait_item_fn(self, method);
    }
}

fn item_attrs(item: &Item) -> Option<&[Attribute]> {
    let attrs = match item {
        Item::Const(i) => &i.attrs,
        Item::Enum(i) => &i.attrs,
        Item::Fn(i) => &i.attrs,
        Item::Impl(i) => &i.attrs,
        Item::Macro(i) => &i.attrs,
        Item::Mod(i) => &i.attrs,
        Item::Static(i) => &i.attrs,
        Item::Struct(i) => &i.attrs,
        Item::Trait(i) => &i.attrs,
        Item::Type(i) => &i.attrs,
        Item::Union(i) => &i.attrs,
        _ => return None,
    };
    Some(attrs.as_slice())
}
