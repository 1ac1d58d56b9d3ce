//! # Repogen Analyzer
//!
//! Static analysis of Go repository interfaces.
//!
//! ## Architecture
//!
//! ```text
//! file.go + interface name
//!     │
//!     ├──> Tree-sitter Parsing (tree-sitter-go) → AST
//!     │
//!     ├──> Find the named interface declaration
//!     │
//!     ├──> Module Origin Resolver
//!     │    ├─> import short name → module path
//!     │    └─> go.mod graph → declaring package path
//!     │
//!     ├──> For each explicit method
//!     │    ├─> Type-Expression Decomposer (params, results)
//!     │    └─> Annotate origins from the import map
//!     │
//!     └──> InterfaceDescriptor
//! ```
//!
//! Embedded contracts are recorded as written and never expanded.
//!
//! ## Example
//!
//! ```no_run
//! use repogen_analyzer::analyze;
//!
//! let descriptor = analyze("repository/user_repository.go", "UserRepository").unwrap();
//! for method in &descriptor.methods {
//!     println!("{}", method.signature());
//! }
//! ```

mod analyzer;
mod error;
mod origin;
mod syntax;
mod type_expr;
mod types;

pub use analyzer::{analyze, InterfaceAnalyzer};
pub use error::{AnalysisError, Result};
pub use origin::{declaring_module, default_short_name, GoModule, ImportMap};
pub use type_expr::TypeExpr;
pub use types::{InterfaceDescriptor, MethodDescriptor, ParamDescriptor};
