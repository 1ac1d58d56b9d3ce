//! # Repogen Repository
//!
//! The generic repository contract every generated implementation satisfies,
//! and a base implementation over a shared persistence mapper.
//!
//! ## Layers
//!
//! ```text
//! Repository<T, ID>            contract: CRUD, batch, existence
//!     │
//!     └──> BaseRepository      delegates to Arc<M>, carries the Session
//!             │
//!             └──> Mapper<T, ID>   persistence layer (MemoryMapper, ...)
//! ```
//!
//! Sequence-returning operations (`save_all`, `find_all`, `find_all_by_id`)
//! return an [`EntityStream`]: single pass, pull-driven, halting on the first
//! error.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use repogen_repository::{BaseRepository, Entity, MemoryMapper, Repository};
//!
//! #[derive(Clone)]
//! struct User {
//!     id: Option<u64>,
//!     email: String,
//! }
//!
//! impl Entity<u64> for User {
//!     fn id(&self) -> Option<u64> {
//!         self.id
//!     }
//!     fn set_id(&mut self, id: u64) {
//!         self.id = Some(id);
//!     }
//! }
//!
//! let repo = BaseRepository::new(Arc::new(MemoryMapper::<User, u64>::new()));
//! let saved = repo.save(User { id: None, email: "ada@example.com".into() }).unwrap();
//! assert!(repo.exists_by_id(&saved.id.unwrap()).unwrap());
//! assert!(repo.find_by_id(&42).unwrap().is_none());
//! ```

mod base;
mod contract;
mod error;
mod mapper;
mod memory;
mod stream;

pub use base::BaseRepository;
pub use contract::{Operation, Repository, ID_COLUMN};
pub use error::{PersistenceError, Result};
pub use mapper::{CountQuery, DeleteTarget, Mapper, Session};
pub use memory::{Entity, MapperStats, MemoryMapper, SequentialId};
pub use stream::EntityStream;
