use pretty_assertions::assert_eq;
use repogen_analyzer::{analyze, InterfaceDescriptor, MethodDescriptor, ParamDescriptor, TypeExpr};
use repogen_resolver::{
    BaselineContract, Connective, GenerationResolver, ModelError, OutputSpec, ParamModel,
    PolicyError, QueryKind, ResolutionPolicy,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

const MODELS: &str = "github.com/acme/shop/models";
const REPOGEN: &str = "github.com/acme/shop/repogen";
const INTERFACE_MODULE: &str = "github.com/acme/shop/repository";

fn param(name: Option<&str>, ty: &str) -> ParamDescriptor {
    let ty = TypeExpr::parse(ty).unwrap();
    let origin = ty.head_package().map(|_| MODELS.to_string());
    ParamDescriptor::new(name.map(str::to_string), ty, origin)
}

fn method(name: &str, params: &[(Option<&str>, &str)], returns: &[&str]) -> MethodDescriptor {
    MethodDescriptor {
        name: name.to_string(),
        params: params.iter().map(|(n, ty)| param(*n, ty)).collect(),
        returns: returns.iter().map(|ty| param(None, ty)).collect(),
    }
}

fn descriptor(methods: Vec<MethodDescriptor>) -> InterfaceDescriptor {
    InterfaceDescriptor {
        name: "UserRepository".to_string(),
        package: "repository".to_string(),
        module_path: INTERFACE_MODULE.to_string(),
        methods,
        embeds: vec!["repogen.Repository[models.User, uint]".to_string()],
        imports: BTreeMap::from([
            ("models".to_string(), MODELS.to_string()),
            ("repogen".to_string(), REPOGEN.to_string()),
        ]),
    }
}

fn output() -> OutputSpec {
    OutputSpec::new("repository", "userRepository", "repository/user_repository_impl.go")
}

#[test]
fn models_custom_methods_and_subtracts_baseline() {
    let descriptor = descriptor(vec![
        method("FindByID", &[(Some("id"), "uint")], &["*models.User", "error"]),
        method("FindByEmail", &[(Some("email"), "string")], &["*models.User", "error"]),
        method(
            "FindByNameAndEmail",
            &[(Some("name"), "string"), (Some("email"), "string")],
            &["[]*models.User", "error"],
        ),
    ]);

    let model = GenerationResolver::new().resolve(descriptor, &output()).unwrap();

    assert_eq!(model.interface, "UserRepository");
    assert_eq!(model.implementation, "userRepository");
    assert_eq!(model.subtracted, vec!["FindByID"]);
    assert_eq!(
        model.imports.iter().map(String::as_str).collect::<Vec<_>>(),
        vec![MODELS, REPOGEN]
    );
    assert_eq!(model.methods.len(), 2);

    let by_email = model.method("FindByEmail").unwrap();
    assert_eq!(by_email.plan.kind, QueryKind::FindOne);
    assert_eq!(
        by_email.returns[0],
        ParamModel {
            name: "r0".to_string(),
            ty: "*models.User".to_string(),
            origin: Some(MODELS.to_string()),
        }
    );

    let by_both = model.method("FindByNameAndEmail").unwrap();
    assert_eq!(by_both.plan.kind, QueryKind::FindMany);
    assert_eq!(by_both.plan.predicates.len(), 2);
    assert_eq!(by_both.plan.predicates[1].connective, Some(Connective::And));
}

#[test]
fn interface_module_imported_only_from_another_package() {
    let count = || {
        descriptor(vec![method(
            "CountByStatus",
            &[(Some("status"), "string")],
            &["int64", "error"],
        )])
    };
    let imports = |output: OutputSpec| {
        GenerationResolver::new()
            .resolve(count(), &output)
            .unwrap()
            .imports
            .into_iter()
            .collect::<Vec<_>>()
    };

    assert_eq!(
        imports(output().with_package_path(INTERFACE_MODULE)),
        vec![MODELS, REPOGEN]
    );
    assert_eq!(
        imports(
            OutputSpec::new("postgres", "userRepository", "postgres/user_repository_impl.go")
                .with_package_path("github.com/acme/shop/postgres")
        ),
        vec![MODELS, REPOGEN, INTERFACE_MODULE]
    );
    // Same package name, different directory
    assert_eq!(
        imports(output().with_package_path("github.com/acme/shop/internal/repository")),
        vec![MODELS, REPOGEN, INTERFACE_MODULE]
    );
    // Without a located path the package names decide
    assert_eq!(
        imports(OutputSpec::new("store", "userRepository", "store/user_repository_impl.go")),
        vec![MODELS, REPOGEN, INTERFACE_MODULE]
    );
}

#[test]
fn embedded_contract_packages_are_imported() {
    let mut descriptor = descriptor(vec![method(
        "CountByStatus",
        &[(Some("status"), "string")],
        &["int64", "error"],
    )]);
    descriptor.embeds.push("io.Closer".to_string());
    descriptor.imports.insert("io".to_string(), "io".to_string());

    let model = GenerationResolver::new().resolve(descriptor, &output()).unwrap();
    assert_eq!(
        model.imports.iter().map(String::as_str).collect::<Vec<_>>(),
        vec![MODELS, REPOGEN, "io"]
    );
}

#[test]
fn unnamed_params_get_positional_names() {
    let descriptor = descriptor(vec![method(
        "CountByStatusOrOwnerID",
        &[(None, "string"), (None, "int64")],
        &["int64", "error"],
    )]);

    let model = GenerationResolver::new().resolve(descriptor, &output()).unwrap();
    let names: Vec<_> = model.methods[0].params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["p0", "p1"]);
    assert_eq!(model.methods[0].plan.predicates[1].column, "owner_id");
}

#[test]
fn rejects_method_without_error_result() {
    let descriptor = descriptor(vec![method(
        "FindByEmail",
        &[(Some("email"), "string")],
        &["*models.User"],
    )]);

    assert_eq!(
        GenerationResolver::new().resolve(descriptor, &output()),
        Err(ModelError::MissingErrorResult("FindByEmail".to_string()))
    );
}

#[test]
fn rejects_unimported_package() {
    let descriptor = descriptor(vec![method(
        "FindByEmail",
        &[(Some("email"), "mail.Address")],
        &["*models.User", "error"],
    )]);

    assert_eq!(
        GenerationResolver::new().resolve(descriptor, &output()),
        Err(ModelError::UnresolvedOrigin {
            method: "FindByEmail".to_string(),
            package: "mail".to_string(),
        })
    );
}

#[test]
fn rejects_unrepresentable_type() {
    let descriptor = descriptor(vec![method(
        "FindByTag",
        &[(Some("tag"), "any")],
        &["*models.User", "error"],
    )]);

    let err = GenerationResolver::new().resolve(descriptor, &output()).unwrap_err();
    assert!(matches!(err, ModelError::Unrepresentable { ref ty, .. } if ty == "any"));
}

#[test]
fn surfaces_policy_failure() {
    let descriptor = descriptor(vec![method(
        "Upsert",
        &[(Some("user"), "*models.User")],
        &["error"],
    )]);

    let err = GenerationResolver::new().resolve(descriptor, &output()).unwrap_err();
    assert!(matches!(err, ModelError::Policy { ref method, .. } if method == "Upsert"));
}

/// Hand-written bodies keyed by method name
struct TemplatePolicy;

#[derive(Debug, Serialize, PartialEq)]
struct Template {
    template: String,
}

impl ResolutionPolicy for TemplatePolicy {
    type Plan = Template;

    fn name(&self) -> &str {
        "template"
    }

    fn plan(&self, method: &MethodDescriptor) -> Result<Template, PolicyError> {
        match method.name.as_str() {
            "Upsert" => Ok(Template {
                template: "upsert.tmpl".to_string(),
            }),
            other => Err(PolicyError::new(format!("no template for {other}"))),
        }
    }
}

#[test]
fn custom_policy_plugs_in() {
    let resolver = GenerationResolver::with_policy(TemplatePolicy)
        .baseline(BaselineContract::from_names(["Save"]));

    let model = resolver
        .resolve(
            descriptor(vec![
                method("Save", &[(None, "*models.User")], &["error"]),
                method("Upsert", &[(None, "*models.User")], &["error"]),
            ]),
            &output(),
        )
        .unwrap();

    assert_eq!(model.subtracted, vec!["Save"]);
    assert_eq!(model.methods[0].plan.template, "upsert.tmpl");
    assert_eq!(resolver.policy().name(), "template");

    let err = resolver
        .resolve(descriptor(vec![method("Purge", &[], &["error"])]), &output())
        .unwrap_err();
    assert_eq!(
        err,
        ModelError::policy("Purge", PolicyError::new("no template for Purge"))
    );
}

#[test]
fn resolves_analyzed_interface() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("go.mod"), "module github.com/acme/shop\n\ngo 1.23\n").unwrap();
    fs::create_dir_all(root.join("repository")).unwrap();
    let file = root.join("repository/user_repository.go");
    fs::write(
        &file,
        r#"package repository

import (
	"iter"

	"github.com/acme/shop/models"
)

type UserRepository interface {
	Repository[models.User, int64]

	FindByEmail(email string) (*models.User, error)
	FindAllByStatus(status string) iter.Seq2[*models.User, error]
	ExistsByEmail(email string) (bool, error)
}
"#,
    )
    .unwrap();

    let descriptor = analyze(&file, "UserRepository").unwrap();
    let model = GenerationResolver::new().resolve(descriptor, &output()).unwrap();

    let kinds: Vec<_> = model.methods.iter().map(|m| m.plan.kind).collect();
    assert_eq!(kinds, vec![QueryKind::FindOne, QueryKind::FindMany, QueryKind::Exists]);
    assert!(model.imports.contains("iter"));
    assert!(model.imports.contains(MODELS));

    let json = serde_json::to_value(&model).unwrap();
    assert_eq!(json["methods"][1]["plan"]["kind"], "find_many");
    assert_eq!(json["methods"][0]["params"][0]["type"], "string");
}

#[test]
fn located_destination_in_interface_package_skips_self_import() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("go.mod"), "module github.com/acme/shop\n\ngo 1.23\n").unwrap();
    fs::create_dir_all(root.join("repository")).unwrap();
    fs::create_dir_all(root.join("postgres")).unwrap();
    let file = root.join("repository/user_repository.go");
    fs::write(
        &file,
        r#"package repository

import (
	"github.com/acme/shop/models"
	"github.com/acme/shop/repogen"
)

type UserRepository interface {
	repogen.Repository[models.User, uint]

	CountByStatus(status string) (int64, error)
}
"#,
    )
    .unwrap();

    let descriptor = analyze(&file, "UserRepository").unwrap();
    let resolver = GenerationResolver::new();

    let beside = OutputSpec::new(
        "repository",
        "userRepository",
        root.join("repository/user_repository_impl.go"),
    )
    .locate_package()
    .unwrap();
    assert_eq!(beside.package_path.as_deref(), Some(INTERFACE_MODULE));
    let model = resolver.resolve(descriptor.clone(), &beside).unwrap();
    assert_eq!(
        model.imports.iter().map(String::as_str).collect::<Vec<_>>(),
        vec![MODELS, REPOGEN]
    );

    let elsewhere = OutputSpec::new(
        "postgres",
        "userRepository",
        root.join("postgres/user_repository_impl.go"),
    )
    .locate_package()
    .unwrap();
    let model = resolver.resolve(descriptor, &elsewhere).unwrap();
    assert_eq!(
        model.imports.iter().map(String::as_str).collect::<Vec<_>>(),
        vec![MODELS, REPOGEN, INTERFACE_MODULE]
    );
}
