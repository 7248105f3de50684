//! Backend-agnostic contracts.
//!
//! Application code talks to these traits only. Each backend supplies one
//! implementation of the whole family; the sled backend in
//! [`crate::databases::sled_store`] is the one shipped with this crate.

pub mod connection;
pub mod iter;
pub mod query;
pub mod storage;

pub use connection::Connection;
pub use iter::{RecordIter, Records};
pub use query::Query;
pub use storage::Storage;
