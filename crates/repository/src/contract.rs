use crate::error::Result;
use crate::stream::EntityStream;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier column assumed by `exists_by_id`.
///
/// Not derived from entity metadata; mappers whose primary key lives in a
/// differently named column reject the lookup with `UnknownColumn`.
pub const ID_COLUMN: &str = "id";

/// The operations of the baseline repository contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operation {
    Save,
    SaveAll,
    FindById,
    ExistsById,
    FindAll,
    FindAllById,
    Count,
    DeleteById,
    Delete,
    DeleteAllById,
    DeleteAll,
}

impl Operation {
    pub const ALL: [Operation; 11] = [
        Operation::Save,
        Operation::SaveAll,
        Operation::FindById,
        Operation::ExistsById,
        Operation::FindAll,
        Operation::FindAllById,
        Operation::Count,
        Operation::DeleteById,
        Operation::Delete,
        Operation::DeleteAllById,
        Operation::DeleteAll,
    ];

    /// Method name as declared on repository interfaces
    pub const fn method_name(self) -> &'static str {
        match self {
            Operation::Save => "Save",
            Operation::SaveAll => "SaveAll",
            Operation::FindById => "FindByID",
            Operation::ExistsById => "ExistsByID",
            Operation::FindAll => "FindAll",
            Operation::FindAllById => "FindAllByID",
            Operation::Count => "Count",
            Operation::DeleteById => "DeleteByID",
            Operation::Delete => "Delete",
            Operation::DeleteAllById => "DeleteAllByID",
            Operation::DeleteAll => "DeleteAll",
        }
    }

    pub fn from_method_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.method_name() == name)
    }

    /// Operations returning a lazy sequence
    pub const fn is_streaming(self) -> bool {
        matches!(
            self,
            Operation::SaveAll | Operation::FindAll | Operation::FindAllById
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// Generic CRUD contract over entity `T` identified by `ID`.
///
/// Every generated or hand-written repository implements exactly this set.
/// Persistence errors pass through unchanged, except that a single-entity
/// lookup reports absence as `Ok(None)`.
pub trait Repository<T, ID> {
    /// Insert if new, update if existing; returns the stored entity
    fn save(&self, entity: T) -> Result<T>;

    /// Save each entity as it is pulled. Not atomic: the first failure is
    /// yielded and nothing after it is saved.
    fn save_all<'a, I>(&'a self, entities: I) -> EntityStream<'a, T>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'a;

    /// `Ok(None)` when no entity has this id
    fn find_by_id(&self, id: &ID) -> Result<Option<T>>;

    fn exists_by_id(&self, id: &ID) -> Result<bool>;

    fn find_all(&self) -> EntityStream<'_, T>;

    /// Entities with the given ids. Empty input issues no query. Result
    /// order is not the request order.
    fn find_all_by_id<'a, I>(&'a self, ids: I) -> EntityStream<'a, T>
    where
        I: IntoIterator<Item = ID>,
        I::IntoIter: 'a;

    fn count(&self) -> Result<u64>;

    fn delete_by_id(&self, id: &ID) -> Result<()>;

    fn delete(&self, entity: &T) -> Result<()>;

    /// Empty input is a no-op
    fn delete_all_by_id<I>(&self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = ID>;

    /// Remove every entity; refused by the mapping layer unless global
    /// updates are opted in
    fn delete_all(&self) -> Result<()>;
}
