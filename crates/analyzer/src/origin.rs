//! Module origin resolution: import short names and the declaring module of a file.

use crate::error::{AnalysisError, Result};
use crate::syntax::{named_children, text};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::Node;
use walkdir::WalkDir;

static MODULE_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*module\s+(?:"([^"]+)"|([^\s/"]\S*))"#).expect("valid module regex")
});

/// Short identifier used at an import site -> fully-qualified module path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMap {
    entries: BTreeMap<String, String>,
}

impl ImportMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every import of a parsed file
    pub fn from_tree(root: Node<'_>, source: &str) -> Self {
        let mut imports = Self::new();

        for decl in named_children(root) {
            if decl.kind() != "import_declaration" {
                continue;
            }

            for child in named_children(decl) {
                let specs = match child.kind() {
                    "import_spec" => vec![child],
                    "import_spec_list" => named_children(child)
                        .into_iter()
                        .filter(|spec| spec.kind() == "import_spec")
                        .collect(),
                    _ => Vec::new(),
                };

                for spec in specs {
                    let Some(path) = spec.child_by_field_name("path") else {
                        continue;
                    };
                    let path = text(path, source).trim_matches(|c| c == '"' || c == '`');
                    let alias = spec.child_by_field_name("name").map(|n| text(n, source));
                    imports.insert(path, alias);
                }
            }
        }

        imports
    }

    /// Register an import; an explicit alias overrides the path's last segment.
    /// Blank and dot imports bind no short name.
    pub fn insert(&mut self, path: &str, alias: Option<&str>) {
        let short = match alias {
            Some("_") | Some(".") => {
                log::debug!("Import {path} binds no short name");
                return;
            }
            Some(alias) => alias,
            None => default_short_name(path),
        };
        self.entries.insert(short.to_string(), path.to_string());
    }

    /// Module path bound to a short identifier
    pub fn resolve(&self, short: &str) -> Option<&str> {
        self.entries.get(short).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Final segment of an import path
pub fn default_short_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// A Go module rooted at the directory holding its `go.mod`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoModule {
    pub root: PathBuf,
    pub path: String,
}

impl GoModule {
    /// Find the nearest enclosing module of a directory
    pub fn discover(dir: &Path) -> Result<Self> {
        for ancestor in dir.ancestors() {
            let manifest = ancestor.join("go.mod");
            if !manifest.is_file() {
                continue;
            }

            let content = fs::read_to_string(&manifest).map_err(|e| {
                AnalysisError::import(format!("cannot read {}: {e}", manifest.display()))
            })?;
            let path = parse_module_path(&content).ok_or_else(|| {
                AnalysisError::import(format!("{} has no module directive", manifest.display()))
            })?;

            log::debug!("Module {path} rooted at {}", ancestor.display());
            return Ok(Self {
                root: ancestor.to_path_buf(),
                path,
            });
        }

        Err(AnalysisError::import(format!(
            "no go.mod found above {}",
            dir.display()
        )))
    }

    /// Import path of the package living in `dir`
    pub fn package_path(&self, dir: &Path) -> Result<String> {
        let relative = dir.strip_prefix(&self.root).map_err(|_| {
            AnalysisError::import(format!(
                "{} is outside module {}",
                dir.display(),
                self.path
            ))
        })?;

        let mut segments = Vec::new();
        for component in relative.components() {
            let segment = component.as_os_str().to_string_lossy();
            if segment == "testdata" || segment.starts_with('_') || segment.starts_with('.') {
                return Err(AnalysisError::import(format!(
                    "{} is excluded from module {}",
                    dir.display(),
                    self.path
                )));
            }
            segments.push(segment.into_owned());
        }

        if segments.is_empty() {
            Ok(self.path.clone())
        } else {
            Ok(format!("{}/{}", self.path, segments.join("/")))
        }
    }
}

fn parse_module_path(go_mod: &str) -> Option<String> {
    let captures = MODULE_DIRECTIVE.captures(go_mod)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str().to_string())
}

/// Go source files making up the package in `dir`
fn package_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("go"))
        .collect()
}

/// Fully-qualified path of the package that declares `file`
pub fn declaring_module(file: &Path) -> Result<String> {
    let absolute = fs::canonicalize(file)
        .map_err(|e| AnalysisError::import(format!("cannot locate {}: {e}", file.display())))?;
    let dir = absolute
        .parent()
        .ok_or_else(|| AnalysisError::import(format!("{} has no parent", absolute.display())))?;

    let module = GoModule::discover(dir)?;
    let package = module.package_path(dir)?;

    if package_files(dir).iter().any(|candidate| candidate == &absolute) {
        Ok(package)
    } else {
        Err(AnalysisError::import(format!(
            "no package of module {} claims {}",
            module.path,
            absolute.display()
        )))
    }
}
