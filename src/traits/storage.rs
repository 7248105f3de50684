use serde::Serialize;
use serde::de::DeserializeOwned;

use super::query::Query;
use crate::error::DatastoneResult;
use crate::identifier::Identifier;

/// CRUD access to one named collection.
pub trait Storage {
    type Query<'s>: Query
    where
        Self: 's;

    /// Name of the bound collection.
    fn name(&self) -> &str;

    /// An incomplete placeholder identifier for this collection.
    ///
    /// The placeholder is not bound to any record; [`Storage::put`] always
    /// allocates its own identifier.
    fn new_key(&self) -> DatastoneResult<Identifier>;

    /// Parse an identifier previously produced by [`Identifier::encode`].
    ///
    /// # Errors
    /// * `DatastoneError::KeyDecode` if `encoded` is malformed
    fn decode_key(&self, encoded: &str) -> DatastoneResult<Identifier>;

    fn new_query(&self) -> Self::Query<'_>;

    /// Insert `record` as a new entry.
    ///
    /// # Returns
    /// * `Ok(id)` - the freshly allocated identifier. Identifiers embedded in
    ///   `record` are stored as ordinary properties and never reused.
    /// * `Err(DatastoneError::Backend)` if the backend rejects the write
    fn put<T: Serialize>(&self, record: &T) -> DatastoneResult<Identifier>;

    /// Load the record stored at `key`.
    ///
    /// # Returns
    /// * `Ok(record)` if the record exists
    /// * `Err(DatastoneError::NotFound)` if it does not
    /// * `Err(DatastoneError::InvalidKey)` if `key` is incomplete or belongs
    ///   to another collection
    fn get<T: DeserializeOwned>(&self, key: &Identifier) -> DatastoneResult<T>;

    /// Overwrite the entry at `key`. Prior existence is not checked.
    fn update<T: Serialize>(&self, key: &Identifier, record: &T) -> DatastoneResult<()>;

    /// Remove the entry at `key`. Removing a missing entry succeeds.
    fn delete(&self, key: &Identifier) -> DatastoneResult<()>;

    /// Remove every entry in `keys` in a single backend operation.
    fn delete_multi(&self, keys: &[Identifier]) -> DatastoneResult<()>;
}
