//! Canonical structured form of Go type references.

use crate::error::{AnalysisError, Result};
use crate::syntax::{self, named_children, text};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tree_sitter::Node;

/// A type reference decomposed into its structure.
///
/// Rendering with `Display` is the inverse of [`TypeExpr::parse`] for every
/// canonical expression: `*T`, `[]T`, `pkg.T`, `T[A]`, `T[A, B]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeExpr {
    /// Bare identifier, builtin or declared in the same package (`string`, `User`)
    Named(String),
    /// Package-qualified identifier (`models.User`)
    Qualified { package: String, name: String },
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `[]T`
    Slice(Box<TypeExpr>),
    /// `Base[T1, ..., Tn]`, base is always `Named` or `Qualified`
    Generic {
        base: Box<TypeExpr>,
        args: Vec<TypeExpr>,
    },
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Qualified {
            package: package.into(),
            name: name.into(),
        }
    }

    pub fn pointer(inner: TypeExpr) -> Self {
        Self::Pointer(Box::new(inner))
    }

    pub fn slice(inner: TypeExpr) -> Self {
        Self::Slice(Box::new(inner))
    }

    pub fn generic(base: TypeExpr, args: Vec<TypeExpr>) -> Self {
        Self::Generic {
            base: Box::new(base),
            args,
        }
    }

    /// Parse a type expression from text.
    ///
    /// The text is embedded in a synthetic alias declaration and decomposed
    /// through the same path the analyzer uses for signatures.
    pub fn parse(expression: &str) -> Result<Self> {
        let expression = expression.trim();
        let source = format!("package expr\n\ntype Expr = {expression}\n");
        let tree = syntax::parse_go(&source)?;
        let root = tree.root_node();

        let alias_type = named_children(root)
            .into_iter()
            .filter(|node| node.kind() == "type_declaration")
            .flat_map(named_children)
            .find(|node| node.kind() == "type_alias")
            .and_then(|alias| alias.child_by_field_name("type"))
            .ok_or_else(|| AnalysisError::parse(3, format!("not a type: `{expression}`")))?;

        if text(alias_type, &source) != expression {
            return Err(AnalysisError::parse(
                3,
                format!("trailing input after type in `{expression}`"),
            ));
        }

        decompose(alias_type, &source)
    }

    /// The type that names this expression once pointers, slices and
    /// instantiation arguments are peeled off (`models.User` for `[]*models.User`)
    pub fn head(&self) -> &TypeExpr {
        match self {
            Self::Pointer(inner) | Self::Slice(inner) => inner.head(),
            Self::Generic { base, .. } => base.head(),
            other => other,
        }
    }

    /// Package qualifying the head type, if any
    pub fn head_package(&self) -> Option<&str> {
        match self.head() {
            Self::Qualified { package, .. } => Some(package),
            _ => None,
        }
    }

    /// Every qualifying package inside the expression, depth first
    pub fn packages(&self) -> Vec<&str> {
        let mut packages = Vec::new();
        self.collect_packages(&mut packages);
        packages
    }

    fn collect_packages<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Named(_) => {}
            Self::Qualified { package, .. } => out.push(package),
            Self::Pointer(inner) | Self::Slice(inner) => inner.collect_packages(out),
            Self::Generic { base, args } => {
                base.collect_packages(out);
                for arg in args {
                    arg.collect_packages(out);
                }
            }
        }
    }

    /// Visit this expression and every nested one, outermost first
    pub fn walk(&self) -> Vec<&TypeExpr> {
        let mut nodes = vec![self];
        match self {
            Self::Pointer(inner) | Self::Slice(inner) => nodes.extend(inner.walk()),
            Self::Generic { base, args } => {
                nodes.extend(base.walk());
                for arg in args {
                    nodes.extend(arg.walk());
                }
            }
            Self::Named(_) | Self::Qualified { .. } => {}
        }
        nodes
    }

    /// True for a bare identifier with the given name
    pub fn is_named(&self, name: &str) -> bool {
        matches!(self, Self::Named(n) if n == name)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Qualified { package, name } => write!(f, "{package}.{name}"),
            Self::Pointer(inner) => write!(f, "*{inner}"),
            Self::Slice(inner) => write!(f, "[]{inner}"),
            Self::Generic { base, args } => {
                write!(f, "{base}[")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl FromStr for TypeExpr {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Decompose a tree-sitter type node
pub(crate) fn decompose(node: Node<'_>, source: &str) -> Result<TypeExpr> {
    let unsupported = |construct: &str| AnalysisError::unsupported(construct, text(node, source));

    match node.kind() {
        "type_identifier" | "identifier" => Ok(TypeExpr::Named(text(node, source).to_string())),

        "qualified_type" => {
            let package = node
                .child_by_field_name("package")
                .ok_or_else(|| unsupported("qualified type without package"))?;
            let name = node
                .child_by_field_name("name")
                .ok_or_else(|| unsupported("qualified type without name"))?;
            Ok(TypeExpr::qualified(text(package, source), text(name, source)))
        }

        "pointer_type" => {
            let inner = named_children(node)
                .into_iter()
                .next()
                .ok_or_else(|| unsupported("pointer without element"))?;
            Ok(TypeExpr::pointer(decompose(inner, source)?))
        }

        "slice_type" => {
            let element = node
                .child_by_field_name("element")
                .ok_or_else(|| unsupported("slice without element"))?;
            Ok(TypeExpr::slice(decompose(element, source)?))
        }

        "generic_type" => {
            let base_node = node
                .child_by_field_name("type")
                .ok_or_else(|| unsupported("generic instantiation without base"))?;
            let base = decompose(base_node, source)?;
            if !matches!(base, TypeExpr::Named(_) | TypeExpr::Qualified { .. }) {
                return Err(unsupported("generic instantiation of a composite base"));
            }

            let arguments = node
                .child_by_field_name("type_arguments")
                .ok_or_else(|| unsupported("generic instantiation without arguments"))?;
            let mut args = Vec::new();
            for arg in named_children(arguments) {
                args.push(decompose_type_argument(arg, source)?);
            }
            if args.is_empty() {
                return Err(unsupported("generic instantiation without arguments"));
            }

            Ok(TypeExpr::generic(base, args))
        }

        "array_type" | "implicit_length_array_type" => Err(unsupported("fixed-length array type")),
        "function_type" => Err(unsupported("function type")),
        "channel_type" => Err(unsupported("channel type")),
        "map_type" => Err(unsupported("map type")),
        "struct_type" => Err(unsupported("inline struct type")),
        "interface_type" => Err(unsupported("inline interface type")),
        "parenthesized_type" => Err(unsupported("parenthesized type")),
        "negated_type" => Err(unsupported("approximation constraint")),
        other => Err(unsupported(other)),
    }
}

/// Newer grammars wrap each type argument in a `type_elem`, which may be a union
fn decompose_type_argument(node: Node<'_>, source: &str) -> Result<TypeExpr> {
    if node.kind() != "type_elem" {
        return decompose(node, source);
    }

    let mut members = named_children(node);
    if members.len() != 1 {
        return Err(AnalysisError::unsupported("type union", text(node, source)));
    }
    decompose(members.remove(0), source)
}
