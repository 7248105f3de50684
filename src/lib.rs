//! # Datastone
//!
//! A small storage abstraction that lets application code create, read,
//! update, delete and query records without depending on a concrete
//! database client.
//!
//! ## Layers
//!
//! - [`Connection`](traits::Connection): wraps a backend execution context and
//!   hands out collection-bound storages
//! - [`Storage`](traits::Storage): CRUD by [`Identifier`] on one collection
//! - [`Query`](traits::Query): filter / order / paginate / keys-only builder
//!   with first, all, count, delete and lazy iteration
//! - [`RecordIter`](traits::RecordIter): pull-based cursor over results
//!
//! The sled backend ([`databases::sled_store`]) is the shipped implementation.
//!
//! ## Quick Start
//!
//! ```rust
//! use datastone::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct User {
//!     name: String,
//! }
//!
//! let conn = SledConnection::new(SledContext::temporary()?);
//! let users = conn.storage("users");
//! let id = users.put(&User { name: "a".into() })?;
//! users.put(&User { name: "b".into() })?;
//!
//! let mut user = User::default();
//! let first = users.new_query().filter("name", Operator::Eq, "a").get_first(&mut user)?;
//! assert_eq!(first, id);
//! assert_eq!(users.new_query().count()?, 2);
//!
//! users.delete(&id)?;
//! let missing = users.new_query().filter("name", Operator::Eq, "a").get_first(&mut user);
//! assert!(matches!(missing, Err(DatastoneError::NotFound)));
//! # Ok::<(), DatastoneError>(())
//! ```

pub mod config;
pub mod databases;
pub mod error;
pub mod identifier;
pub mod prelude;
pub mod query;
pub mod traits;
pub mod value;

pub use error::{DatastoneError, DatastoneResult};
pub use identifier::Identifier;
