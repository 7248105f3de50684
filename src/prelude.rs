//! Prelude module for convenient imports.
//!
//! ```rust
//! use datastone::prelude::*;
//! ```

pub use crate::config::{FileConfig, MemoryConfig};
pub use crate::error::{BackendError, DatastoneError, DatastoneResult, KeyDecodeError};
pub use crate::identifier::Identifier;
pub use crate::query::{Direction, Operator, QueryConfig};
pub use crate::traits::{Connection, Query, RecordIter, Records, Storage};
pub use crate::value::{Entity, Value};

#[cfg(feature = "sled")]
pub use crate::databases::sled_store::{
    SledConnection, SledContext, SledIter, SledQuery, SledStorage,
};
