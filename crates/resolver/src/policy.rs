use crate::error::PolicyError;
use repogen_analyzer::{MethodDescriptor, TypeExpr};
use serde::Serialize;

/// Decides how each custom method of a repository is implemented.
///
/// The resolver checks representability of every type through
/// [`represents`](ResolutionPolicy::represents) before asking for plans, so
/// `plan` only ever sees methods whose types passed that check.
pub trait ResolutionPolicy {
    /// Emitter-facing description of one method's implementation
    type Plan: Serialize;

    /// Short identifier recorded in logs
    fn name(&self) -> &str;

    /// Whether generated code can carry a value of this type
    fn represents(&self, _ty: &TypeExpr) -> bool {
        true
    }

    fn plan(&self, method: &MethodDescriptor) -> Result<Self::Plan, PolicyError>;
}

