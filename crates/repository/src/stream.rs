use crate::error::Result;
use std::fmt;
use std::iter::FusedIterator;

type Query<'a, T> = Box<dyn FnOnce() -> Result<Vec<T>> + 'a>;
type Source<'a, T> = Box<dyn Iterator<Item = Result<T>> + 'a>;

enum State<'a, T> {
    /// Query not issued yet; runs on the first pull
    Deferred(Query<'a, T>),
    /// Query results being handed out
    Buffered(std::vec::IntoIter<T>),
    /// Each element produced on demand
    Streaming(Source<'a, T>),
    Exhausted,
}

/// Single-pass, pull-driven sequence of entities.
///
/// Nothing happens until `next()` is called. An error is yielded as an
/// element and ends the stream; dropping the stream early stops all work.
pub struct EntityStream<'a, T> {
    state: State<'a, T>,
}

impl<'a, T> EntityStream<'a, T> {
    /// Stream backed by a query that runs on the first pull
    pub fn deferred(query: impl FnOnce() -> Result<Vec<T>> + 'a) -> Self {
        Self {
            state: State::Deferred(Box::new(query)),
        }
    }

    /// Stream whose elements are produced one at a time by `source`
    pub fn streaming(source: impl Iterator<Item = Result<T>> + 'a) -> Self {
        Self {
            state: State::Streaming(Box::new(source)),
        }
    }

    /// Stream that yields nothing
    pub fn empty() -> Self {
        Self {
            state: State::Exhausted,
        }
    }
}

impl<T> Iterator for EntityStream<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, State::Exhausted) {
                State::Deferred(query) => match query() {
                    Ok(rows) => self.state = State::Buffered(rows.into_iter()),
                    Err(err) => return Some(Err(err)),
                },
                State::Buffered(mut rows) => {
                    let row = rows.next()?;
                    self.state = State::Buffered(rows);
                    return Some(Ok(row));
                }
                State::Streaming(mut source) => {
                    return match source.next()? {
                        Ok(item) => {
                            self.state = State::Streaming(source);
                            Some(Ok(item))
                        }
                        Err(err) => Some(Err(err)),
                    };
                }
                State::Exhausted => return None,
            }
        }
    }
}

impl<T> FusedIterator for EntityStream<'_, T> {}

impl<T> fmt::Debug for EntityStream<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Deferred(_) => "deferred",
            State::Buffered(_) => "buffered",
            State::Streaming(_) => "streaming",
            State::Exhausted => "exhausted",
        };
        f.debug_struct("EntityStream").field("state", &state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistenceError;
    use std::cell::Cell;

    #[test]
    fn test_deferred_query_runs_on_first_pull_only() {
        let calls = Cell::new(0);
        let mut stream = EntityStream::deferred(|| {
            calls.set(calls.get() + 1);
            Ok(vec![1, 2])
        });

        assert_eq!(calls.get(), 0);
        assert_eq!(stream.next(), Some(Ok(1)));
        assert_eq!(stream.next(), Some(Ok(2)));
        assert_eq!(stream.next(), None);
        assert_eq!(stream.next(), None);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_dropped_stream_never_queries() {
        let calls = Cell::new(0);
        let stream = EntityStream::deferred(|| {
            calls.set(calls.get() + 1);
            Ok(vec![1])
        });
        drop(stream);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_query_error_is_yielded_once() {
        let mut stream: EntityStream<'_, i32> =
            EntityStream::deferred(|| Err(PersistenceError::backend("down")));
        assert_eq!(stream.next(), Some(Err(PersistenceError::backend("down"))));
        assert_eq!(stream.next(), None);
    }

    #[test]
    fn test_streaming_halts_after_error() {
        let pulled = Cell::new(0);
        let source = [Ok(1), Err(PersistenceError::RecordNotFound), Ok(3)]
            .into_iter()
            .inspect(|_| pulled.set(pulled.get() + 1));
        let items: Vec<_> = EntityStream::streaming(source).collect();

        assert_eq!(items, vec![Ok(1), Err(PersistenceError::RecordNotFound)]);
        assert_eq!(pulled.get(), 2);
    }

    #[test]
    fn test_empty() {
        assert_eq!(EntityStream::<u8>::empty().count(), 0);
    }
}
