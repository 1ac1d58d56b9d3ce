use repogen_repository::Operation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Method names a generated implementation inherits instead of generating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineContract {
    methods: BTreeSet<String>,
}

impl BaselineContract {
    /// The generic repository contract's operation set
    pub fn repository() -> Self {
        Self::from_names(Operation::ALL.iter().map(|op| op.method_name()))
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            methods: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains(name)
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl Default for BaselineContract {
    fn default() -> Self {
        Self::repository()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_baseline() {
        let baseline = BaselineContract::repository();
        assert_eq!(baseline.len(), Operation::ALL.len());
        assert!(baseline.contains("FindByID"));
        assert!(baseline.contains("DeleteAll"));
        assert!(!baseline.contains("FindByEmail"));
    }

    #[test]
    fn test_from_names() {
        let baseline = BaselineContract::from_names(["Get", "Put"]);
        assert_eq!(baseline.methods().collect::<Vec<_>>(), vec!["Get", "Put"]);
        assert!(BaselineContract::from_names(Vec::<String>::new()).is_empty());
    }
}
