//! Naming-convention policy: queries derived from finder method names.
//!
//! `FindByNameAndEmail(name, email string) (*User, error)` becomes a
//! single-row lookup with two equality predicates, `name` bound to the first
//! parameter and `email` to the second.

use crate::error::PolicyError;
use crate::policy::ResolutionPolicy;
use once_cell::sync::Lazy;
use regex::Regex;
use repogen_analyzer::{MethodDescriptor, TypeExpr};
use serde::{Deserialize, Serialize};

static DERIVED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Find|Count|Exists|Delete)(All)?By([A-Z][A-Za-z0-9]*)$")
        .expect("valid finder regex")
});

const INTEGER_TYPES: &[&str] = &[
    "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32", "uint64",
];

const UNREPRESENTABLE: &[&str] = &["any", "uintptr", "complex64", "complex128"];

/// What a derived query does with the matched rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    FindOne,
    FindMany,
    Count,
    Exists,
    Delete,
}

/// How a predicate joins the one before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connective {
    And,
    Or,
}

/// Equality test of one column against one parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    /// Field as spelled in the method name
    pub field: String,
    pub column: String,
    /// Index of the bound parameter
    pub param: usize,
    /// `None` for the first predicate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connective: Option<Connective>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub kind: QueryKind,
    pub predicates: Vec<Predicate>,
    /// Row type produced by finders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<TypeExpr>,
    /// Delete reports the number of removed rows
    #[serde(default)]
    pub returns_count: bool,
}

/// Default policy deriving queries from `Find|Count|Exists|Delete[All]By...` names
#[derive(Debug, Clone, Copy, Default)]
pub struct DerivedQueryPolicy;

impl DerivedQueryPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl ResolutionPolicy for DerivedQueryPolicy {
    type Plan = QueryPlan;

    fn name(&self) -> &str {
        "derived-query"
    }

    fn represents(&self, ty: &TypeExpr) -> bool {
        ty.walk().into_iter().all(|node| match node {
            TypeExpr::Named(name) => !UNREPRESENTABLE.contains(&name.as_str()),
            TypeExpr::Qualified { package, name } => !(package == "unsafe" && name == "Pointer"),
            _ => true,
        })
    }

    fn plan(&self, method: &MethodDescriptor) -> Result<QueryPlan, PolicyError> {
        let caps = DERIVED_NAME.captures(&method.name).ok_or_else(|| {
            PolicyError::new(
                "name does not follow the Find|Count|Exists|Delete[All]By<Field>... convention",
            )
        })?;
        let verb = &caps[1];
        let all = caps.get(2).is_some();
        let predicates = parse_predicates(&caps[3])?;

        if predicates.len() != method.params.len() {
            return Err(PolicyError::new(format!(
                "{} predicates but {} parameters",
                predicates.len(),
                method.params.len()
            )));
        }

        let values: Vec<&TypeExpr> = value_results(method).collect();
        let mut entity = None;
        let mut returns_count = false;

        let kind = match verb {
            "Find" => {
                let [first] = values.as_slice() else {
                    return Err(PolicyError::new("finders return exactly one value"));
                };
                match many_element(first) {
                    Some(element) => {
                        entity = Some(element.clone());
                        QueryKind::FindMany
                    }
                    None if all => {
                        return Err(PolicyError::new(format!(
                            "FindAll finders return a slice or iterator, got `{first}`"
                        )));
                    }
                    None if matches!(first, TypeExpr::Pointer(_)) || is_named_type(first) => {
                        entity = Some((*first).clone());
                        QueryKind::FindOne
                    }
                    None => {
                        return Err(PolicyError::new(format!(
                            "cannot return a single row as `{first}`"
                        )));
                    }
                }
            }
            "Count" => match values.as_slice() {
                [first] if is_integer(first) => QueryKind::Count,
                _ => return Err(PolicyError::new("Count returns an integer and an error")),
            },
            "Exists" => match values.as_slice() {
                [first] if first.is_named("bool") => QueryKind::Exists,
                _ => return Err(PolicyError::new("Exists returns a bool and an error")),
            },
            _ => match values.as_slice() {
                [] => QueryKind::Delete,
                [first] if is_integer(first) => {
                    returns_count = true;
                    QueryKind::Delete
                }
                _ => {
                    return Err(PolicyError::new(
                        "Delete returns an error, optionally preceded by a row count",
                    ))
                }
            },
        };

        Ok(QueryPlan {
            kind,
            predicates,
            entity,
            returns_count,
        })
    }
}

/// Results other than the trailing error
fn value_results(method: &MethodDescriptor) -> impl Iterator<Item = &TypeExpr> {
    let n = match method.returns.last() {
        Some(last) if last.ty.is_named("error") => method.returns.len() - 1,
        _ => method.returns.len(),
    };
    method.returns[..n].iter().map(|r| &r.ty)
}

/// Element type of a many-row result: `[]T`, `iter.Seq[T]`, `iter.Seq2[T, error]`
fn many_element(ty: &TypeExpr) -> Option<&TypeExpr> {
    match ty {
        TypeExpr::Slice(inner) => Some(&**inner),
        TypeExpr::Generic { base, args } => match (&**base, args.first()) {
            (TypeExpr::Qualified { package, name }, Some(first))
                if package == "iter" && (name == "Seq" || name == "Seq2") =>
            {
                Some(first)
            }
            _ => None,
        },
        _ => None,
    }
}

fn is_named_type(ty: &TypeExpr) -> bool {
    matches!(ty, TypeExpr::Named(_) | TypeExpr::Qualified { .. } | TypeExpr::Generic { .. })
}

fn is_integer(ty: &TypeExpr) -> bool {
    matches!(ty, TypeExpr::Named(name) if INTEGER_TYPES.contains(&name.as_str()))
}

fn parse_predicates(fields: &str) -> Result<Vec<Predicate>, PolicyError> {
    let mut predicates = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut pending: Option<Connective> = None;

    let mut flush = |words: &mut Vec<&str>, connective: Option<Connective>| {
        if words.is_empty() {
            return Err(PolicyError::new(format!("empty field in `{fields}`")));
        }
        let field = words.concat();
        let column = words
            .iter()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join("_");
        predicates.push(Predicate {
            field,
            column,
            param: predicates.len(),
            connective,
        });
        words.clear();
        Ok(())
    };

    for word in camel_words(fields) {
        let connective = match word {
            "And" => Connective::And,
            "Or" => Connective::Or,
            _ => {
                current.push(word);
                continue;
            }
        };
        flush(&mut current, pending)?;
        pending = Some(connective);
    }
    flush(&mut current, pending)?;

    Ok(predicates)
}

/// Split at camel-case boundaries, keeping acronyms whole (`UserIDAndName` ->
/// `User`, `ID`, `And`, `Name`)
fn camel_words(s: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = s.char_indices().collect();
    let mut words = Vec::new();
    let mut start = 0;

    for i in 1..chars.len() {
        let (idx, c) = chars[i];
        let prev = chars[i - 1].1;
        let next_lower = chars.get(i + 1).is_some_and(|(_, n)| n.is_lowercase());
        let boundary = c.is_uppercase()
            && (prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower));
        if boundary {
            words.push(&s[start..idx]);
            start = idx;
        }
    }
    if start < s.len() {
        words.push(&s[start..]);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use repogen_analyzer::ParamDescriptor;

    fn method(name: &str, params: &[&str], returns: &[&str]) -> MethodDescriptor {
        let param = |ty: &&str| ParamDescriptor::unnamed(TypeExpr::parse(ty).unwrap());
        MethodDescriptor {
            name: name.to_string(),
            params: params.iter().map(param).collect(),
            returns: returns.iter().map(param).collect(),
        }
    }

    #[test]
    fn test_camel_words() {
        assert_eq!(camel_words("UserIDAndName"), vec!["User", "ID", "And", "Name"]);
        assert_eq!(camel_words("HTTPStatus"), vec!["HTTP", "Status"]);
        assert_eq!(camel_words("Order"), vec!["Order"]);
        assert_eq!(camel_words("Line2Text"), vec!["Line2", "Text"]);
    }

    #[test]
    fn test_split_on_connectives() {
        let plan = DerivedQueryPolicy
            .plan(&method(
                "FindByNameAndEmail",
                &["string", "string"],
                &["*models.User", "error"],
            ))
            .unwrap();

        assert_eq!(plan.kind, QueryKind::FindOne);
        assert_eq!(
            plan.predicates,
            vec![
                Predicate {
                    field: "Name".into(),
                    column: "name".into(),
                    param: 0,
                    connective: None,
                },
                Predicate {
                    field: "Email".into(),
                    column: "email".into(),
                    param: 1,
                    connective: Some(Connective::And),
                },
            ]
        );
    }

    #[test]
    fn test_fields_containing_connective_text() {
        let plan = DerivedQueryPolicy
            .plan(&method("CountByOrderIDOrAndroidVersion", &["int64", "string"], &["int64", "error"]))
            .unwrap();
        let columns: Vec<_> = plan.predicates.iter().map(|p| p.column.as_str()).collect();
        assert_eq!(columns, vec!["order_id", "android_version"]);
        assert_eq!(plan.predicates[1].connective, Some(Connective::Or));
    }

    #[test]
    fn test_find_shapes() {
        let many = DerivedQueryPolicy
            .plan(&method("FindByStatus", &["string"], &["[]*models.Order", "error"]))
            .unwrap();
        assert_eq!(many.kind, QueryKind::FindMany);
        assert_eq!(many.entity, Some(TypeExpr::parse("*models.Order").unwrap()));

        let seq = DerivedQueryPolicy
            .plan(&method("FindAllByStatus", &["string"], &["iter.Seq2[*models.Order, error]"]))
            .unwrap();
        assert_eq!(seq.kind, QueryKind::FindMany);

        let err = DerivedQueryPolicy
            .plan(&method("FindAllByStatus", &["string"], &["*models.Order", "error"]))
            .unwrap_err();
        assert!(err.message().contains("slice or iterator"));
    }

    #[test]
    fn test_count_exists_delete() {
        let policy = DerivedQueryPolicy;
        assert_eq!(
            policy.plan(&method("ExistsByEmail", &["string"], &["bool", "error"])).unwrap().kind,
            QueryKind::Exists
        );
        assert!(policy.plan(&method("CountByEmail", &["string"], &["bool", "error"])).is_err());

        let delete = policy.plan(&method("DeleteAllByStatus", &["string"], &["int64", "error"])).unwrap();
        assert_eq!(delete.kind, QueryKind::Delete);
        assert!(delete.returns_count);
        assert!(!policy.plan(&method("DeleteByEmail", &["string"], &["error"])).unwrap().returns_count);
    }

    #[test]
    fn test_rejections() {
        let policy = DerivedQueryPolicy;
        assert!(policy.plan(&method("Upsert", &["string"], &["error"])).is_err());
        assert!(policy.plan(&method("FindByName", &[], &["*models.User", "error"])).is_err());
        assert!(policy.plan(&method("FindByNameAnd", &["string"], &["*models.User", "error"])).is_err());
    }

    #[test]
    fn test_represents() {
        let policy = DerivedQueryPolicy;
        assert!(policy.represents(&TypeExpr::parse("store.Key").unwrap()));
        assert!(policy.represents(&TypeExpr::parse("[]*models.User").unwrap()));
        assert!(!policy.represents(&TypeExpr::parse("any").unwrap()));
        assert!(!policy.represents(&TypeExpr::parse("iter.Seq[complex128]").unwrap()));
        assert!(!policy.represents(&TypeExpr::parse("unsafe.Pointer").unwrap()));
    }
}
