//! # Repogen Resolver
//!
//! Bridges analyzer output to the external emitter: subtracts the baseline
//! repository contract from an [`InterfaceDescriptor`](repogen_analyzer::InterfaceDescriptor),
//! checks that every remaining custom method can be generated, and asks a
//! pluggable [`ResolutionPolicy`] how to implement each one.
//!
//! ```text
//! InterfaceDescriptor
//!     │ Resolution::new
//!     ▼
//! Resolution<Unresolved> ──validate──> Resolution<Validated> ──model──> GenerationModel<Plan>
//!                          baseline,                          policy.plan,
//!                          origins,                           OutputSpec
//!                          policy.represents,
//!                          error result
//! ```
//!
//! [`DerivedQueryPolicy`] is the default policy: it derives equality queries
//! from finder names such as `FindByEmail` or `CountByStatusAndOwnerID`.

mod baseline;
mod derived;
mod error;
mod model;
mod policy;
mod resolver;

pub use baseline::BaselineContract;
pub use derived::{Connective, DerivedQueryPolicy, Predicate, QueryKind, QueryPlan};
pub use error::{ModelError, PolicyError, Result};
pub use model::{GenerationModel, MethodModel, OutputSpec, ParamModel};
pub use policy::ResolutionPolicy;
pub use resolver::{GenerationResolver, Resolution, Unresolved, Validated};
