//! Sled backend for the datastone abstraction.
//!
//! Every collection lives in its own sled tree, named after the context's
//! namespace and the collection (kind) name. Records are flattened into an
//! [`Entity`](crate::value::Entity) and stored bincode-encoded under the
//! big-endian bytes of their numeric id, so an unordered scan returns records
//! in allocation order.
//!
//! ## Module Structure
//!
//! - `context.rs` - Backend execution context (SledContext)
//! - `connection.rs` - Connection implementation (SledConnection)
//! - `storage.rs` - Collection-bound CRUD (SledStorage)
//! - `query.rs` - Query builder and execution (SledQuery)
//! - `iterator.rs` - Result cursor (SledIter)
//! - `batch.rs` - Bulk deletes (SledDeleteBatch)
//!
//! # Examples
//!
//! ```rust
//! use datastone::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! let conn = SledConnection::new(SledContext::temporary().unwrap());
//! let users = conn.storage("users");
//!
//! let alice = User { name: "alice".into(), age: 31 };
//! let id = users.put(&alice).unwrap();
//! assert_eq!(users.get::<User>(&id).unwrap(), alice);
//!
//! let mut found = User::default();
//! let first = users
//!     .new_query()
//!     .filter("age", Operator::Gt, 30)
//!     .get_first(&mut found)
//!     .unwrap();
//! assert_eq!(first, id);
//! assert_eq!(found.name, "alice");
//! ```

use crate::error::{BackendError, DatastoneResult};
use crate::value::Entity;

pub mod batch;
pub mod connection;
pub mod context;
pub mod iterator;
pub mod query;
pub mod storage;

pub use batch::SledDeleteBatch;
pub use connection::SledConnection;
pub use context::SledContext;
pub use iterator::SledIter;
pub use query::SledQuery;
pub use storage::SledStorage;

// =============================================================================
// Serialization Helpers
// =============================================================================

/// Tree key for a numeric id.
#[inline]
pub(crate) fn id_to_bytes(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

#[inline]
pub(crate) fn id_from_bytes(bytes: &[u8]) -> DatastoneResult<u64> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| {
        BackendError::Decode(bincode::error::DecodeError::Other(
            "tree key is not an 8-byte id",
        ))
    })?;
    Ok(u64::from_be_bytes(raw))
}

/// Serialize an entity using bincode's standard configuration.
#[inline]
pub(crate) fn serialize_entity(entity: &Entity) -> DatastoneResult<Vec<u8>> {
    Ok(bincode::encode_to_vec(entity, bincode::config::standard())?)
}

#[inline]
pub(crate) fn deserialize_entity(bytes: &[u8]) -> DatastoneResult<Entity> {
    let (entity, _len) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(entity)
}
