use crate::type_expr::TypeExpr;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured result of analyzing one interface declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDescriptor {
    /// Interface name as declared
    pub name: String,

    /// Name from the file's `package` clause
    pub package: String,

    /// Fully-qualified path of the package declaring the interface
    pub module_path: String,

    /// Explicit methods in declaration order
    pub methods: Vec<MethodDescriptor>,

    /// Embedded contracts as written (never expanded)
    #[serde(default)]
    pub embeds: Vec<String>,

    /// Imports referenced by method signatures (short name -> module path)
    #[serde(default)]
    pub imports: BTreeMap<String, String>,
}

impl InterfaceDescriptor {
    /// Find a method by name
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(|m| m.name.as_str())
    }

    /// `module/path.Name`
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module_path, self.name)
    }
}

/// One explicit interface method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<ParamDescriptor>,
    pub returns: Vec<ParamDescriptor>,
}

impl MethodDescriptor {
    /// Render as a Go method signature, e.g. `FindByEmail(email string) (*models.User, error)`
    #[must_use]
    pub fn signature(&self) -> String {
        let params = render_list(&self.params);
        match self.returns.as_slice() {
            [] => format!("{}({params})", self.name),
            [single] if single.name.is_none() => format!("{}({params}) {}", self.name, single.ty),
            returns => format!("{}({params}) ({})", self.name, render_list(returns)),
        }
    }
}

fn render_list(params: &[ParamDescriptor]) -> String {
    params
        .iter()
        .map(|p| match &p.name {
            Some(name) => format!("{name} {}", p.ty),
            None => p.ty.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// A parameter or result of a method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    /// Declared name, absent for unnamed parameters/results
    pub name: Option<String>,

    /// Canonical structured type
    #[serde(rename = "type")]
    pub ty: TypeExpr,

    /// Module path of the head type when it is package-qualified
    pub origin: Option<String>,
}

impl ParamDescriptor {
    pub fn new(name: Option<String>, ty: TypeExpr, origin: Option<String>) -> Self {
        Self { name, ty, origin }
    }

    /// Unnamed value of a builtin or local type
    pub fn unnamed(ty: TypeExpr) -> Self {
        Self::new(None, ty, None)
    }
}
