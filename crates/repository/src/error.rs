use thiserror::Error;

/// Result type for repository and mapper operations
pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Errors raised by the persistence mapper, passed through repositories unchanged
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// A single-record lookup matched nothing
    #[error("record not found")]
    RecordNotFound,

    /// A mutation without a filter was refused
    #[error("missing where clause: whole-collection mutation requires allow_global_update")]
    MissingWhereClause,

    /// The mapper does not know the column
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// A lock guarding the store was poisoned by a panicking writer
    #[error("store lock poisoned")]
    Poisoned,

    /// Backend-specific failure
    #[error("{0}")]
    Backend(String),
}

impl PersistenceError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// True for the not-found outcome of a single-record lookup
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound)
    }
}
