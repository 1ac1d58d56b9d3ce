use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Per-call options of the mapping layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Permit mutations that carry no filter and therefore touch every row
    pub allow_global_update: bool,
}

impl Session {
    pub const fn new() -> Self {
        Self {
            allow_global_update: false,
        }
    }

    /// Builder: opt in to whole-collection mutation
    #[must_use]
    pub const fn allow_global_update(mut self, allow: bool) -> Self {
        self.allow_global_update = allow;
        self
    }
}

/// Count request: optional single-column equality filter and row limit
#[derive(Debug, Clone, Copy)]
pub struct CountQuery<'q, ID> {
    pub filter: Option<(&'q str, &'q ID)>,
    pub limit: Option<usize>,
}

impl<'q, ID> CountQuery<'q, ID> {
    /// Count every row
    pub const fn all() -> Self {
        Self {
            filter: None,
            limit: None,
        }
    }

    /// Count rows whose `column` equals `value`
    pub const fn column_eq(column: &'q str, value: &'q ID) -> Self {
        Self {
            filter: Some((column, value)),
            limit: None,
        }
    }

    /// Builder: stop counting after `limit` rows
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Rows a delete applies to
#[derive(Debug)]
pub enum DeleteTarget<'q, T, ID> {
    /// The row backing this entity, located through its identity
    Entity(&'q T),
    /// Rows with these primary keys
    Ids(&'q [ID]),
    /// Every row; guarded by `Session::allow_global_update`
    All,
}

/// The persistence layer a repository delegates to.
///
/// Repositories hold mappers behind an `Arc`; implementations provide their
/// own synchronization.
pub trait Mapper<T, ID>: Send + Sync {
    /// Insert or update `entity` per the mapper's identity convention,
    /// writing back any generated identity
    fn save(&self, entity: &mut T) -> Result<()>;

    /// Row with primary key `id`, or `PersistenceError::RecordNotFound`
    fn first(&self, id: &ID) -> Result<T>;

    /// Rows with the given primary keys, or every row when `ids` is `None`.
    /// Result order is the mapper's own.
    fn find(&self, ids: Option<&[ID]>) -> Result<Vec<T>>;

    fn count(&self, query: &CountQuery<'_, ID>) -> Result<u64>;

    /// Delete the targeted rows, returning how many were removed
    fn delete(&self, target: DeleteTarget<'_, T, ID>, session: Session) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_defaults_to_guarded() {
        assert!(!Session::default().allow_global_update);
        assert!(!Session::new().allow_global_update);
        assert!(Session::new().allow_global_update(true).allow_global_update);
    }

    #[test]
    fn test_count_query_builders() {
        let id = 7u64;
        let query = CountQuery::column_eq("id", &id).limit(1);
        assert_eq!(query.filter, Some(("id", &7)));
        assert_eq!(query.limit, Some(1));

        let all = CountQuery::<u64>::all();
        assert!(all.filter.is_none() && all.limit.is_none());
    }
}
