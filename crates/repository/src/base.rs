use crate::contract::{Repository, ID_COLUMN};
use crate::error::{PersistenceError, Result};
use crate::mapper::{CountQuery, DeleteTarget, Mapper, Session};
use crate::stream::EntityStream;
use std::fmt;
use std::marker::PhantomData;
use std::slice;
use std::sync::Arc;

/// Repository implementation delegating every operation to a shared mapper.
///
/// Generated repositories embed one of these and add their custom finders.
pub struct BaseRepository<T, ID, M> {
    mapper: Arc<M>,
    session: Session,
    _entity: PhantomData<fn() -> (T, ID)>,
}

impl<T, ID, M> BaseRepository<T, ID, M>
where
    M: Mapper<T, ID>,
{
    pub fn new(mapper: Arc<M>) -> Self {
        Self {
            mapper,
            session: Session::default(),
            _entity: PhantomData,
        }
    }

    /// Builder: mapping-layer options used for deletes
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn mapper(&self) -> &Arc<M> {
        &self.mapper
    }

    pub fn session(&self) -> Session {
        self.session
    }
}

impl<T, ID, M> Clone for BaseRepository<T, ID, M> {
    fn clone(&self) -> Self {
        Self {
            mapper: Arc::clone(&self.mapper),
            session: self.session,
            _entity: PhantomData,
        }
    }
}

impl<T, ID, M> fmt::Debug for BaseRepository<T, ID, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseRepository")
            .field("session", &self.session)
            .field("mapper_handles", &Arc::strong_count(&self.mapper))
            .finish()
    }
}

impl<T, ID, M> Repository<T, ID> for BaseRepository<T, ID, M>
where
    M: Mapper<T, ID>,
{
    fn save(&self, mut entity: T) -> Result<T> {
        self.mapper.save(&mut entity)?;
        Ok(entity)
    }

    fn save_all<'a, I>(&'a self, entities: I) -> EntityStream<'a, T>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'a,
    {
        EntityStream::streaming(entities.into_iter().map(move |entity| self.save(entity)))
    }

    fn find_by_id(&self, id: &ID) -> Result<Option<T>> {
        match self.mapper.first(id) {
            Ok(entity) => Ok(Some(entity)),
            Err(PersistenceError::RecordNotFound) => {
                log::debug!("find_by_id: no record, reporting absence");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn exists_by_id(&self, id: &ID) -> Result<bool> {
        let query = CountQuery::column_eq(ID_COLUMN, id).limit(1);
        Ok(self.mapper.count(&query)? > 0)
    }

    fn find_all(&self) -> EntityStream<'_, T> {
        let mapper = &self.mapper;
        EntityStream::deferred(move || mapper.find(None))
    }

    fn find_all_by_id<'a, I>(&'a self, ids: I) -> EntityStream<'a, T>
    where
        I: IntoIterator<Item = ID>,
        I::IntoIter: 'a,
    {
        let ids = ids.into_iter();
        let mapper = &self.mapper;
        EntityStream::deferred(move || {
            let ids: Vec<ID> = ids.collect();
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            mapper.find(Some(&ids))
        })
    }

    fn count(&self) -> Result<u64> {
        self.mapper.count(&CountQuery::all())
    }

    fn delete_by_id(&self, id: &ID) -> Result<()> {
        self.mapper
            .delete(DeleteTarget::Ids(slice::from_ref(id)), self.session)
            .map(|_| ())
    }

    fn delete(&self, entity: &T) -> Result<()> {
        self.mapper
            .delete(DeleteTarget::Entity(entity), self.session)
            .map(|_| ())
    }

    fn delete_all_by_id<I>(&self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = ID>,
    {
        let ids: Vec<ID> = ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(());
        }
        self.mapper
            .delete(DeleteTarget::Ids(&ids), self.session)
            .map(|_| ())
    }

    fn delete_all(&self) -> Result<()> {
        let removed = self.mapper.delete(DeleteTarget::All, self.session)?;
        log::info!("delete_all removed {removed} rows");
        Ok(())
    }
}
