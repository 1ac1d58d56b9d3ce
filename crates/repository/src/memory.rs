use crate::contract::ID_COLUMN;
use crate::error::{PersistenceError, Result};
use crate::mapper::{CountQuery, DeleteTarget, Mapper, Session};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Identity convention of entities stored by `MemoryMapper`
pub trait Entity<ID>: Clone {
    /// `None` until the entity has been saved
    fn id(&self) -> Option<ID>;

    fn set_id(&mut self, id: ID);
}

/// Identifier types the in-memory mapper can generate from a counter
pub trait SequentialId: Sized {
    fn from_sequence(n: u64) -> Option<Self>;
}

macro_rules! sequential_id {
    ($($ty:ty),*) => {
        $(
            impl SequentialId for $ty {
                fn from_sequence(n: u64) -> Option<Self> {
                    <$ty>::try_from(n).ok()
                }
            }
        )*
    };
}

sequential_id!(u32, u64, usize, i32, i64);

/// Number of calls issued against a mapper
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapperStats {
    pub queries: u64,
    pub mutations: u64,
}

/// Thread-safe in-memory mapper keyed by primary key.
///
/// Only the `id` column is known. Rows come back in key order.
pub struct MemoryMapper<T, ID> {
    rows: RwLock<BTreeMap<ID, T>>,
    sequence: AtomicU64,
    queries: AtomicU64,
    mutations: AtomicU64,
}

impl<T, ID: Ord> MemoryMapper<T, ID> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            sequence: AtomicU64::new(0),
            queries: AtomicU64::new(0),
            mutations: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> MapperStats {
        MapperStats {
            queries: self.queries.load(Ordering::Relaxed),
            mutations: self.mutations.load(Ordering::Relaxed),
        }
    }

    /// Number of stored rows, without counting as a query
    pub fn len(&self) -> Result<usize> {
        self.rows
            .read()
            .map(|rows| rows.len())
            .map_err(|_| PersistenceError::Poisoned)
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<ID, T>>> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.rows.read().map_err(|_| PersistenceError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<ID, T>>> {
        self.mutations.fetch_add(1, Ordering::Relaxed);
        self.rows.write().map_err(|_| PersistenceError::Poisoned)
    }
}

impl<T, ID: Ord> Default for MemoryMapper<T, ID> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, ID: Ord> fmt::Debug for MemoryMapper<T, ID> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryMapper")
            .field("rows", &self.len().ok())
            .field("stats", &self.stats())
            .finish()
    }
}

impl<T, ID> Mapper<T, ID> for MemoryMapper<T, ID>
where
    T: Entity<ID> + Send + Sync,
    ID: Ord + Clone + SequentialId + Send + Sync,
{
    fn save(&self, entity: &mut T) -> Result<()> {
        let mut rows = self.write()?;

        let id = match entity.id() {
            Some(id) => id,
            None => loop {
                let n = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
                let candidate = ID::from_sequence(n)
                    .ok_or_else(|| PersistenceError::backend("identifier sequence exhausted"))?;
                if !rows.contains_key(&candidate) {
                    entity.set_id(candidate.clone());
                    break candidate;
                }
            },
        };

        rows.insert(id, entity.clone());
        Ok(())
    }

    fn first(&self, id: &ID) -> Result<T> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or(PersistenceError::RecordNotFound)
    }

    fn find(&self, ids: Option<&[ID]>) -> Result<Vec<T>> {
        let rows = self.read()?;
        let found = match ids {
            None => rows.values().cloned().collect(),
            Some(ids) => {
                let wanted: BTreeSet<&ID> = ids.iter().collect();
                rows.iter()
                    .filter(|(id, _)| wanted.contains(id))
                    .map(|(_, entity)| entity.clone())
                    .collect()
            }
        };
        Ok(found)
    }

    fn count(&self, query: &CountQuery<'_, ID>) -> Result<u64> {
        let rows = self.read()?;
        let matched = match query.filter {
            None => rows.len() as u64,
            Some((column, id)) if column == ID_COLUMN => u64::from(rows.contains_key(id)),
            Some((column, _)) => return Err(PersistenceError::UnknownColumn(column.to_string())),
        };
        Ok(match query.limit {
            Some(limit) => matched.min(limit as u64),
            None => matched,
        })
    }

    fn delete(&self, target: DeleteTarget<'_, T, ID>, session: Session) -> Result<u64> {
        let mut rows = self.write()?;
        match target {
            DeleteTarget::Entity(entity) => {
                let id = entity.id().ok_or(PersistenceError::MissingWhereClause)?;
                Ok(u64::from(rows.remove(&id).is_some()))
            }
            DeleteTarget::Ids(ids) => Ok(ids
                .iter()
                .filter(|id| rows.remove(*id).is_some())
                .count() as u64),
            DeleteTarget::All => {
                if rows.is_empty() {
                    return Ok(0);
                }
                if !session.allow_global_update {
                    log::warn!("Refusing to delete {} rows without a filter", rows.len());
                    return Err(PersistenceError::MissingWhereClause);
                }
                let removed = rows.len() as u64;
                rows.clear();
                Ok(removed)
            }
        }
    }
}
