//! Error types for datastone operations.
//!
//! Every public operation returns [`DatastoneResult<T>`]. The top-level
//! [`DatastoneError`] separates the conditions callers are expected to branch
//! on (a missing record, an exhausted iterator, a malformed key) from opaque
//! failures raised by the backend, which are grouped under [`BackendError`].
//!
//! ```
//! use datastone::error::{DatastoneError, DatastoneResult};
//!
//! fn lookup(found: bool) -> DatastoneResult<u32> {
//!     if found { Ok(7) } else { Err(DatastoneError::NotFound) }
//! }
//!
//! match lookup(false) {
//!     Err(e) if e.is_not_found() => {}
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

use thiserror::Error;

pub type DatastoneResult<T> = Result<T, DatastoneError>;

#[derive(Error, Debug)]
pub enum DatastoneError {
    /// A keyed lookup or a single-result query matched nothing.
    #[error("no such entity")]
    NotFound,

    /// Iterator exhaustion. Not an error about any particular key.
    #[error("query has no more results")]
    Done,

    #[error("malformed identifier: {0}")]
    KeyDecode(#[from] KeyDecodeError),

    /// The identifier is incomplete or names a different collection.
    #[error("invalid identifier: {0}")]
    InvalidKey(String),

    /// A payload was requested from a keys-only query.
    #[error("query was executed keys-only; results carry no payload")]
    NoPayload,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl DatastoneError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatastoneError::NotFound)
    }

    pub fn is_done(&self) -> bool {
        matches!(self, DatastoneError::Done)
    }
}

#[derive(Error, Debug)]
pub enum KeyDecodeError {
    #[error("identifier is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("identifier payload is corrupt: {0}")]
    Payload(#[from] bincode::error::DecodeError),
    #[error("identifier has {0} trailing bytes")]
    TrailingBytes(usize),
    #[error("identifier is not in canonical form")]
    NotCanonical,
}

/// Failures raised while talking to the backend store or converting records
/// to and from their stored form.
#[derive(Error, Debug)]
pub enum BackendError {
    #[cfg(feature = "sled")]
    #[error("Sled Error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Encode Error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Decode Error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Record Conversion Error: {0}")]
    Record(#[from] serde_json::Error),

    #[error("Record must serialize to a map of properties, got {0}")]
    RecordShape(&'static str),

    #[error("Record contains an infinite or NaN float, which cannot be stored")]
    NonFiniteFloat,
}

macro_rules! impl_from_backend {
    ($($(#[$meta:meta])* $err:ty => $variant:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            impl From<$err> for DatastoneError {
                fn from(err: $err) -> Self {
                    DatastoneError::Backend(BackendError::$variant(err))
                }
            }
        )*
    };
}

impl_from_backend!(
    #[cfg(feature = "sled")]
    sled::Error => Sled,
    bincode::error::EncodeError => Encode,
    bincode::error::DecodeError => Decode,
    serde_json::Error => Record,
);
