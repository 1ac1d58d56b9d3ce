use std::path::PathBuf;
use thiserror::Error;

/// Result type for analyzer operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur while analyzing a repository interface
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The source file could not be read
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source could not be parsed as valid Go
    #[error("Parse error at line {line}: {message}")]
    ParseFailure { line: usize, message: String },

    /// No interface with the requested name exists in the file
    #[error("Interface not found: {0}")]
    InterfaceNotFound(String),

    /// A parameter or result uses a type construct the decomposer rejects
    #[error("Unsupported type expression: {construct} in `{expression}`")]
    UnsupportedTypeExpression {
        construct: String,
        expression: String,
    },

    /// An import, or the file's own declaring module, could not be resolved
    #[error("Import resolution failed: {0}")]
    ImportResolutionFailure(String),

    /// Two methods with the same name in one interface
    #[error("Duplicate method: {0}")]
    DuplicateMethod(String),

    /// Tree-sitter error
    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),
}

impl AnalysisError {
    /// Create a parse error at a 1-indexed line
    pub fn parse(line: usize, msg: impl Into<String>) -> Self {
        Self::ParseFailure {
            line,
            message: msg.into(),
        }
    }

    /// Create an unsupported type expression error
    pub fn unsupported(construct: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::UnsupportedTypeExpression {
            construct: construct.into(),
            expression: expression.into(),
        }
    }

    /// Create an import resolution error
    pub fn import(msg: impl Into<String>) -> Self {
        Self::ImportResolutionFailure(msg.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitter(msg.into())
    }
}
