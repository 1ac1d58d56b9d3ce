use repogen_analyzer::{AnalysisError, GoModule, ParamDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Where and under which names the implementation is generated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    /// Package clause of the generated file
    pub package: String,
    /// Name of the generated implementation type
    pub implementation: String,
    pub destination: PathBuf,
    /// Import path of the destination's package, once located
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_path: Option<String>,
}

impl OutputSpec {
    pub fn new(
        package: impl Into<String>,
        implementation: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            package: package.into(),
            implementation: implementation.into(),
            destination: destination.into(),
            package_path: None,
        }
    }

    pub fn with_package_path(mut self, package_path: impl Into<String>) -> Self {
        self.package_path = Some(package_path.into());
        self
    }

    /// Resolve the import path of the destination's directory from the enclosing `go.mod`.
    ///
    /// The destination file need not exist yet; relative destinations are taken
    /// from the working directory.
    pub fn locate_package(self) -> repogen_analyzer::Result<Self> {
        let absolute = if self.destination.is_absolute() {
            self.destination.clone()
        } else {
            let cwd = env::current_dir().map_err(|source| AnalysisError::Io {
                path: self.destination.clone(),
                source,
            })?;
            cwd.join(&self.destination)
        };
        let dir = absolute.parent().ok_or_else(|| {
            AnalysisError::import(format!("{} has no parent", absolute.display()))
        })?;
        let dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());

        let module = GoModule::discover(&dir)?;
        let package_path = module.package_path(&dir)?;
        log::debug!("{} belongs to {package_path}", self.destination.display());
        Ok(self.with_package_path(package_path))
    }
}

/// Emitter-ready description of one repository implementation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationModel<P> {
    pub interface: String,
    pub interface_package: String,
    pub interface_module: String,
    pub package: String,
    pub implementation: String,
    pub destination: PathBuf,
    /// Module paths the generated file imports
    pub imports: BTreeSet<String>,
    /// Embedded contracts, copied from the descriptor
    pub embeds: Vec<String>,
    /// Interface methods covered by the baseline contract
    pub subtracted: Vec<String>,
    /// Custom methods in declaration order
    pub methods: Vec<MethodModel<P>>,
}

impl<P> GenerationModel<P> {
    pub fn method(&self, name: &str) -> Option<&MethodModel<P>> {
        self.methods.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodModel<P> {
    pub name: String,
    pub params: Vec<ParamModel>,
    pub returns: Vec<ParamModel>,
    pub plan: P,
}

/// A parameter or result with its final name and rendered type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamModel {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl ParamModel {
    /// Unnamed values are named by position with `prefix` (`p0`, `r1`)
    pub(crate) fn render(params: &[ParamDescriptor], prefix: char) -> Vec<ParamModel> {
        params
            .iter()
            .enumerate()
            .map(|(i, p)| ParamModel {
                name: p.name.clone().unwrap_or_else(|| format!("{prefix}{i}")),
                ty: p.ty.to_string(),
                origin: p.origin.clone(),
            })
            .collect()
    }
}
