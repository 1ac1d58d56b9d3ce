use crate::error::{AnalysisError, Result};
use crate::origin::{self, ImportMap};
use crate::syntax::{named_children, parse_go, text};
use crate::type_expr::{decompose, TypeExpr};
use crate::types::{InterfaceDescriptor, MethodDescriptor, ParamDescriptor};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tree_sitter::Node;

/// Analyze the interface `interface_name` declared in the Go file at `file_path`
pub fn analyze(file_path: impl AsRef<Path>, interface_name: &str) -> Result<InterfaceDescriptor> {
    InterfaceAnalyzer::new(interface_name).analyze_file(file_path)
}

/// Extracts a descriptor for one named interface
#[derive(Debug, Clone)]
pub struct InterfaceAnalyzer {
    interface_name: String,
}

/// Everything gathered from the syntax tree, before the declaring module is known
struct ParsedInterface {
    package: String,
    methods: Vec<MethodDescriptor>,
    embeds: Vec<String>,
    imports: BTreeMap<String, String>,
}

impl InterfaceAnalyzer {
    pub fn new(interface_name: impl Into<String>) -> Self {
        Self {
            interface_name: interface_name.into(),
        }
    }

    pub fn interface_name(&self) -> &str {
        &self.interface_name
    }

    /// Analyze a file on disk, resolving its declaring module from the module graph
    pub fn analyze_file(&self, file_path: impl AsRef<Path>) -> Result<InterfaceDescriptor> {
        let path = file_path.as_ref();
        let bytes = fs::read(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = String::from_utf8(bytes).map_err(|err| {
            let valid = &err.as_bytes()[..err.utf8_error().valid_up_to()];
            let line = 1 + valid.iter().filter(|&&b| b == b'\n').count();
            AnalysisError::parse(line, "source is not valid UTF-8")
        })?;

        let parsed = self.parse(&source)?;
        let module_path = origin::declaring_module(path)?;
        Ok(self.finish(parsed, module_path))
    }

    /// Analyze in-memory source whose declaring module is already known
    pub fn analyze_source(
        &self,
        source: &str,
        module_path: impl Into<String>,
    ) -> Result<InterfaceDescriptor> {
        let parsed = self.parse(source)?;
        Ok(self.finish(parsed, module_path.into()))
    }

    fn finish(&self, parsed: ParsedInterface, module_path: String) -> InterfaceDescriptor {
        log::info!(
            "Analyzed {module_path}.{}: {} methods, {} embedded",
            self.interface_name,
            parsed.methods.len(),
            parsed.embeds.len()
        );

        InterfaceDescriptor {
            name: self.interface_name.clone(),
            package: parsed.package,
            module_path,
            methods: parsed.methods,
            embeds: parsed.embeds,
            imports: parsed.imports,
        }
    }

    fn parse(&self, source: &str) -> Result<ParsedInterface> {
        let tree = parse_go(source)?;
        let root = tree.root_node();

        let interface = self
            .find_interface(root, source)
            .ok_or_else(|| AnalysisError::InterfaceNotFound(self.interface_name.clone()))?;

        let imports = ImportMap::from_tree(root, source);
        let mut used_imports = BTreeMap::new();
        let mut methods = Vec::new();
        let mut embeds = Vec::new();
        let mut seen = HashSet::new();

        for element in named_children(interface) {
            match element.kind() {
                "method_elem" | "method_spec" => {
                    let method = parse_method(element, source, &imports, &mut used_imports)?;
                    if !seen.insert(method.name.clone()) {
                        return Err(AnalysisError::DuplicateMethod(method.name));
                    }
                    log::debug!("Method {}", method.signature());
                    methods.push(method);
                }
                _ => {
                    // Embedded contract: recorded as written, not expanded.
                    let embedded = text(element, source).trim().to_string();
                    record_embed_imports(element, source, &imports, &mut used_imports)?;
                    log::debug!("Embedded {embedded}");
                    embeds.push(embedded);
                }
            }
        }

        Ok(ParsedInterface {
            package: package_name(root, source).unwrap_or_default(),
            methods,
            embeds,
            imports: used_imports,
        })
    }

    /// First top-level type spec with the requested name whose type is an interface
    fn find_interface<'t>(&self, root: Node<'t>, source: &str) -> Option<Node<'t>> {
        named_children(root)
            .into_iter()
            .filter(|decl| decl.kind() == "type_declaration")
            .flat_map(named_children)
            .filter(|spec| matches!(spec.kind(), "type_spec" | "type_alias"))
            .filter(|spec| {
                spec.child_by_field_name("name")
                    .is_some_and(|name| text(name, source) == self.interface_name)
            })
            .find_map(|spec| {
                spec.child_by_field_name("type")
                    .filter(|ty| ty.kind() == "interface_type")
            })
    }
}

fn package_name(root: Node<'_>, source: &str) -> Option<String> {
    named_children(root)
        .into_iter()
        .find(|node| node.kind() == "package_clause")
        .and_then(|clause| named_children(clause).into_iter().next())
        .map(|ident| text(ident, source).to_string())
}

fn parse_method(
    node: Node<'_>,
    source: &str,
    imports: &ImportMap,
    used: &mut BTreeMap<String, String>,
) -> Result<MethodDescriptor> {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(n, source).to_string())
        .ok_or_else(|| AnalysisError::parse(node.start_position().row + 1, "method without name"))?;

    let mut resolve = |ty: TypeExpr| annotate(ty, &name, imports, used);

    let mut params = Vec::new();
    if let Some(list) = node.child_by_field_name("parameters") {
        for (param_name, ty) in parse_parameter_list(list, source)? {
            let (ty, origin) = resolve(ty)?;
            params.push(ParamDescriptor::new(param_name, ty, origin));
        }
    }

    let mut returns = Vec::new();
    if let Some(result) = node.child_by_field_name("result") {
        let results = if result.kind() == "parameter_list" {
            parse_parameter_list(result, source)?
        } else {
            vec![(None, decompose(result, source)?)]
        };
        for (result_name, ty) in results {
            let (ty, origin) = resolve(ty)?;
            returns.push(ParamDescriptor::new(result_name, ty, origin));
        }
    }

    Ok(MethodDescriptor {
        name,
        params,
        returns,
    })
}

/// Decompose a parameter list; `a, b string` yields one entry per name
fn parse_parameter_list(list: Node<'_>, source: &str) -> Result<Vec<(Option<String>, TypeExpr)>> {
    let mut entries = Vec::new();

    for decl in named_children(list) {
        match decl.kind() {
            "parameter_declaration" => {
                let type_node = decl.child_by_field_name("type").ok_or_else(|| {
                    AnalysisError::parse(decl.start_position().row + 1, "parameter without type")
                })?;
                let ty = decompose(type_node, source)?;

                let mut cursor = decl.walk();
                let names: Vec<String> = decl
                    .children_by_field_name("name", &mut cursor)
                    .map(|n| text(n, source).to_string())
                    .collect();

                if names.is_empty() {
                    entries.push((None, ty));
                } else {
                    for name in names {
                        entries.push((Some(name), ty.clone()));
                    }
                }
            }
            "variadic_parameter_declaration" => {
                return Err(AnalysisError::unsupported(
                    "variadic parameter",
                    text(decl, source),
                ));
            }
            other => {
                return Err(AnalysisError::unsupported(other, text(decl, source)));
            }
        }
    }

    Ok(entries)
}

/// Record the packages named by an embedded type.
///
/// Unions and `~T` approximations are kept as text only and name no imports.
fn record_embed_imports(
    element: Node<'_>,
    source: &str,
    imports: &ImportMap,
    used: &mut BTreeMap<String, String>,
) -> Result<()> {
    let node = match element.kind() {
        "type_elem" => match named_children(element).as_slice() {
            [single] => *single,
            _ => return Ok(()),
        },
        _ => element,
    };
    let Ok(ty) = decompose(node, source) else {
        return Ok(());
    };

    for package in ty.packages() {
        let path = imports.resolve(package).ok_or_else(|| {
            AnalysisError::import(format!(
                "package `{package}` in embedded `{ty}` is not imported"
            ))
        })?;
        used.insert(package.to_string(), path.to_string());
    }
    Ok(())
}

/// Check every qualifying package resolves and attach the head origin
fn annotate(
    ty: TypeExpr,
    method: &str,
    imports: &ImportMap,
    used: &mut BTreeMap<String, String>,
) -> Result<(TypeExpr, Option<String>)> {
    for package in ty.packages() {
        let path = imports.resolve(package).ok_or_else(|| {
            AnalysisError::import(format!(
                "package `{package}` used by {method} in `{ty}` is not imported"
            ))
        })?;
        used.insert(package.to_string(), path.to_string());
    }

    let origin = ty
        .head_package()
        .and_then(|package| imports.resolve(package))
        .map(str::to_string);
    Ok((ty, origin))
}
