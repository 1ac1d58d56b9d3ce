use crate::baseline::BaselineContract;
use crate::derived::DerivedQueryPolicy;
use crate::error::{ModelError, Result};
use crate::model::{GenerationModel, MethodModel, OutputSpec, ParamModel};
use crate::policy::ResolutionPolicy;
use repogen_analyzer::{InterfaceDescriptor, MethodDescriptor, TypeExpr};
use std::collections::BTreeSet;

/// Descriptor received, nothing checked yet
#[derive(Debug)]
pub struct Unresolved;

/// Custom methods identified and their types checked
#[derive(Debug)]
pub struct Validated {
    custom: Vec<MethodDescriptor>,
    subtracted: Vec<String>,
}

/// A descriptor moving through resolution.
///
/// `Resolution<Unresolved>` → [`validate`](Resolution::validate) →
/// `Resolution<Validated>` → [`model`](Resolution::model) → `GenerationModel`.
/// Each step consumes the previous state.
#[derive(Debug)]
pub struct Resolution<S> {
    descriptor: InterfaceDescriptor,
    state: S,
}

impl<S> Resolution<S> {
    pub fn descriptor(&self) -> &InterfaceDescriptor {
        &self.descriptor
    }
}

impl Resolution<Unresolved> {
    pub fn new(descriptor: InterfaceDescriptor) -> Self {
        Self {
            descriptor,
            state: Unresolved,
        }
    }

    /// Subtract the baseline and check every custom method can be generated
    pub fn validate<P: ResolutionPolicy>(
        self,
        baseline: &BaselineContract,
        policy: &P,
    ) -> Result<Resolution<Validated>> {
        let (subtracted, custom): (Vec<_>, Vec<_>) = self
            .descriptor
            .methods
            .iter()
            .cloned()
            .partition(|m| baseline.contains(&m.name));

        for method in &custom {
            check_method(&self.descriptor, method, policy)?;
        }

        log::debug!(
            "{}: {} custom methods, {} covered by baseline",
            self.descriptor.name,
            custom.len(),
            subtracted.len()
        );

        Ok(Resolution {
            descriptor: self.descriptor,
            state: Validated {
                custom,
                subtracted: subtracted.into_iter().map(|m| m.name).collect(),
            },
        })
    }
}

impl Resolution<Validated> {
    pub fn custom_methods(&self) -> &[MethodDescriptor] {
        &self.state.custom
    }

    pub fn subtracted(&self) -> &[String] {
        &self.state.subtracted
    }

    /// Plan every custom method and assemble the model
    pub fn model<P: ResolutionPolicy>(
        self,
        policy: &P,
        output: &OutputSpec,
    ) -> Result<GenerationModel<P::Plan>> {
        let Resolution { descriptor, state } = self;

        let mut imports = BTreeSet::new();
        let same_package = match &output.package_path {
            Some(path) => *path == descriptor.module_path,
            None => output.package == descriptor.package,
        };
        if !same_package {
            imports.insert(descriptor.module_path.clone());
        }
        for embed in &descriptor.embeds {
            let Ok(ty) = TypeExpr::parse(embed) else {
                continue;
            };
            for package in ty.packages() {
                match descriptor.imports.get(package) {
                    Some(path) => {
                        imports.insert(path.clone());
                    }
                    None => log::debug!("embedded {embed} names unknown package {package}"),
                }
            }
        }

        let mut methods = Vec::with_capacity(state.custom.len());
        for method in &state.custom {
            let plan = policy
                .plan(method)
                .map_err(|source| ModelError::policy(&method.name, source))?;

            for value in method.params.iter().chain(&method.returns) {
                for package in value.ty.packages() {
                    if let Some(path) = descriptor.imports.get(package) {
                        imports.insert(path.clone());
                    }
                }
            }

            log::debug!("planned {} with {}", method.name, policy.name());
            methods.push(MethodModel {
                name: method.name.clone(),
                params: ParamModel::render(&method.params, 'p'),
                returns: ParamModel::render(&method.returns, 'r'),
                plan,
            });
        }

        if let Some(own) = &output.package_path {
            imports.remove(own);
        }

        Ok(GenerationModel {
            interface: descriptor.name,
            interface_package: descriptor.package,
            interface_module: descriptor.module_path,
            package: output.package.clone(),
            implementation: output.implementation.clone(),
            destination: output.destination.clone(),
            imports,
            embeds: descriptor.embeds,
            subtracted: state.subtracted,
            methods,
        })
    }
}

fn check_method<P: ResolutionPolicy>(
    descriptor: &InterfaceDescriptor,
    method: &MethodDescriptor,
    policy: &P,
) -> Result<()> {
    for value in method.params.iter().chain(&method.returns) {
        if let Some(package) = value
            .ty
            .packages()
            .into_iter()
            .find(|package| !descriptor.imports.contains_key(*package))
        {
            return Err(ModelError::UnresolvedOrigin {
                method: method.name.clone(),
                package: package.to_string(),
            });
        }

        if !policy.represents(&value.ty) {
            return Err(ModelError::Unrepresentable {
                method: method.name.clone(),
                ty: value.ty.to_string(),
            });
        }
    }

    if !propagates_errors(method) {
        return Err(ModelError::MissingErrorResult(method.name.clone()));
    }

    Ok(())
}

/// Final result is `error`, or the sole result is an `iter.Seq2[T, error]`
/// stream carrying failures per element
fn propagates_errors(method: &MethodDescriptor) -> bool {
    match method.returns.as_slice() {
        [.., last] if last.ty.is_named("error") => true,
        [only] => matches!(
            &only.ty,
            TypeExpr::Generic { base, args }
                if **base == TypeExpr::qualified("iter", "Seq2")
                    && args.last().is_some_and(|arg| arg.is_named("error"))
        ),
        _ => false,
    }
}

/// Turns analyzer descriptors into generation models.
///
/// ```rust
/// use repogen_analyzer::{InterfaceDescriptor, MethodDescriptor, ParamDescriptor, TypeExpr};
/// use repogen_resolver::{GenerationResolver, OutputSpec, QueryKind};
///
/// let descriptor = InterfaceDescriptor {
///     name: "UserRepository".into(),
///     package: "repository".into(),
///     module_path: "github.com/acme/shop/repository".into(),
///     methods: vec![MethodDescriptor {
///         name: "ExistsByEmail".into(),
///         params: vec![ParamDescriptor::new(Some("email".into()), TypeExpr::named("string"), None)],
///         returns: vec![
///             ParamDescriptor::unnamed(TypeExpr::named("bool")),
///             ParamDescriptor::unnamed(TypeExpr::named("error")),
///         ],
///     }],
///     embeds: vec![],
///     imports: Default::default(),
/// };
///
/// let output = OutputSpec::new("repository", "userRepository", "user_repository_gen.go");
/// let model = GenerationResolver::new().resolve(descriptor, &output).unwrap();
/// assert_eq!(model.methods[0].plan.kind, QueryKind::Exists);
/// assert_eq!(model.methods[0].returns[0].name, "r0");
/// ```
#[derive(Debug, Clone)]
pub struct GenerationResolver<P = DerivedQueryPolicy> {
    baseline: BaselineContract,
    policy: P,
}

impl GenerationResolver<DerivedQueryPolicy> {
    pub fn new() -> Self {
        Self::with_policy(DerivedQueryPolicy)
    }
}

impl Default for GenerationResolver<DerivedQueryPolicy> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ResolutionPolicy> GenerationResolver<P> {
    pub fn with_policy(policy: P) -> Self {
        Self {
            baseline: BaselineContract::repository(),
            policy,
        }
    }

    /// Builder: replace the baseline contract
    #[must_use]
    pub fn baseline(mut self, baseline: BaselineContract) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Validate and model `descriptor` in one step
    pub fn resolve(
        &self,
        descriptor: InterfaceDescriptor,
        output: &OutputSpec,
    ) -> Result<GenerationModel<P::Plan>> {
        let name = descriptor.name.clone();
        let model = Resolution::new(descriptor)
            .validate(&self.baseline, &self.policy)?
            .model(&self.policy, output)?;

        log::info!(
            "Resolved {name}: {} custom methods, {} imports",
            model.methods.len(),
            model.imports.len()
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repogen_analyzer::ParamDescriptor;

    fn returns(types: &[&str]) -> Vec<ParamDescriptor> {
        types
            .iter()
            .map(|ty| ParamDescriptor::unnamed(TypeExpr::parse(ty).unwrap()))
            .collect()
    }

    fn method(name: &str, result: &[&str]) -> MethodDescriptor {
        MethodDescriptor {
            name: name.to_string(),
            params: vec![],
            returns: returns(result),
        }
    }

    #[test]
    fn test_propagates_errors() {
        assert!(propagates_errors(&method("A", &["error"])));
        assert!(propagates_errors(&method("B", &["*models.User", "error"])));
        assert!(propagates_errors(&method("C", &["iter.Seq2[*models.User, error]"])));
        assert!(!propagates_errors(&method("D", &[])));
        assert!(!propagates_errors(&method("E", &["error", "bool"])));
        assert!(!propagates_errors(&method("F", &["iter.Seq[*models.User]"])));
    }

    #[test]
    fn test_validate_partitions_baseline() {
        let descriptor = InterfaceDescriptor {
            name: "UserRepository".into(),
            package: "repository".into(),
            module_path: "example.com/app/repository".into(),
            methods: vec![method("Count", &["int64", "error"]), method("Touch", &["error"])],
            embeds: vec![],
            imports: Default::default(),
        };

        let validated = Resolution::new(descriptor)
            .validate(&BaselineContract::repository(), &DerivedQueryPolicy)
            .unwrap();
        assert_eq!(validated.subtracted(), ["Count".to_string()]);
        assert_eq!(validated.custom_methods().len(), 1);
        assert_eq!(validated.custom_methods()[0].name, "Touch");
    }
}
