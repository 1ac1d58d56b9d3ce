use thiserror::Error;

/// Result type for resolver operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while turning a descriptor into a generation model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A qualified type in a custom method names a package the file does not import
    #[error("Unresolved origin: package `{package}` used by {method} has no import")]
    UnresolvedOrigin { method: String, package: String },

    /// The policy cannot express a type used by a custom method
    #[error("Unrepresentable type `{ty}` in {method}")]
    Unrepresentable { method: String, ty: String },

    /// A custom method whose final result is not `error`
    #[error("Method {0} must return error as its final result")]
    MissingErrorResult(String),

    /// The resolution policy rejected a custom method
    #[error("Policy failed for {method}: {source}")]
    Policy {
        method: String,
        #[source]
        source: PolicyError,
    },
}

impl ModelError {
    pub fn policy(method: impl Into<String>, source: PolicyError) -> Self {
        Self::Policy {
            method: method.into(),
            source,
        }
    }
}

/// Failure reported by a `ResolutionPolicy` for a single method
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct PolicyError(String);

impl PolicyError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}
