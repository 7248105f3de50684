use log::{debug, trace};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::batch::SledDeleteBatch;
use super::connection::SledConnection;
use super::query::SledQuery;
use super::{deserialize_entity, id_to_bytes, serialize_entity};
use crate::error::{DatastoneError, DatastoneResult};
use crate::identifier::Identifier;
use crate::traits::{Connection, Storage};
use crate::value::Entity;

/// [`Storage`] for one collection reached through a [`SledConnection`].
///
/// Holds no backend resources of its own; the underlying tree is resolved on
/// every operation.
#[derive(Debug, Clone)]
pub struct SledStorage<'c> {
    name: String,
    conn: &'c SledConnection,
}

impl<'c> SledStorage<'c> {
    pub(crate) fn new(name: &str, conn: &'c SledConnection) -> Self {
        Self {
            name: name.to_owned(),
            conn,
        }
    }

    pub fn connection(&self) -> &'c SledConnection {
        self.conn
    }

    pub(crate) fn namespace(&self) -> &str {
        self.conn.context().namespace()
    }

    pub(crate) fn tree(&self) -> DatastoneResult<sled::Tree> {
        self.conn.context().collection(&self.name)
    }

    /// Tree key for `key`, provided it names a persisted record of this
    /// collection.
    fn tree_key(&self, key: &Identifier) -> DatastoneResult<[u8; 8]> {
        let id = key
            .id()
            .ok_or_else(|| DatastoneError::InvalidKey(format!("{key} is incomplete")))?;
        if key.kind() != self.name || key.namespace() != self.namespace() {
            return Err(DatastoneError::InvalidKey(format!(
                "{key} belongs to {:?}/{:?}, not {:?}/{:?}",
                key.namespace(),
                key.kind(),
                self.namespace(),
                self.name
            )));
        }
        Ok(id_to_bytes(id))
    }

    pub(crate) fn identifier(&self, id: u64) -> Identifier {
        Identifier::complete(self.namespace(), &self.name, id)
    }
}

impl<'c> Storage for SledStorage<'c> {
    type Query<'s>
        = SledQuery<'s, 'c>
    where
        Self: 's;

    fn name(&self) -> &str {
        &self.name
    }

    fn new_key(&self) -> DatastoneResult<Identifier> {
        Ok(Identifier::incomplete(self.namespace(), &self.name))
    }

    fn decode_key(&self, encoded: &str) -> DatastoneResult<Identifier> {
        Ok(Identifier::decode(encoded)?)
    }

    fn new_query(&self) -> SledQuery<'_, 'c> {
        SledQuery::new(self)
    }

    fn put<T: Serialize>(&self, record: &T) -> DatastoneResult<Identifier> {
        let bytes = serialize_entity(&Entity::from_record(record)?)?;
        let id = self.conn.context().allocate_id()?;
        self.tree()?.insert(id_to_bytes(id), bytes)?;
        debug!("SledStorage: put {}#{}", self.name, id);
        Ok(self.identifier(id))
    }

    fn get<T: DeserializeOwned>(&self, key: &Identifier) -> DatastoneResult<T> {
        let tree_key = self.tree_key(key)?;
        match self.tree()?.get(tree_key)? {
            Some(bytes) => deserialize_entity(&bytes)?.into_record(),
            None => {
                trace!("SledStorage: {}#{:?} not found", self.name, key.id());
                Err(DatastoneError::NotFound)
            }
        }
    }

    fn update<T: Serialize>(&self, key: &Identifier, record: &T) -> DatastoneResult<()> {
        let tree_key = self.tree_key(key)?;
        let bytes = serialize_entity(&Entity::from_record(record)?)?;
        self.tree()?.insert(tree_key, bytes)?;
        debug!("SledStorage: updated {}#{:?}", self.name, key.id());
        Ok(())
    }

    fn delete(&self, key: &Identifier) -> DatastoneResult<()> {
        let tree_key = self.tree_key(key)?;
        self.tree()?.remove(tree_key)?;
        debug!("SledStorage: deleted {}#{:?}", self.name, key.id());
        Ok(())
    }

    fn delete_multi(&self, keys: &[Identifier]) -> DatastoneResult<()> {
        let mut batch = SledDeleteBatch::new(self.tree()?);
        for key in keys {
            batch.remove(self.tree_key(key)?);
        }
        let removed = batch.commit()?;
        debug!("SledStorage: bulk deleted {} from {}", removed, self.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::databases::sled_store::SledContext;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        title: String,
        stars: i32,
    }

    fn note(title: &str, stars: i32) -> Note {
        Note {
            title: title.into(),
            stars,
        }
    }

    #[test]
    fn put_then_get() {
        let conn = SledConnection::new(SledContext::temporary().unwrap());
        let notes = conn.storage("notes");
        let id = notes.put(&note("a", 1)).unwrap();
        assert!(id.is_complete());
        assert_eq!(id.kind(), "notes");
        assert_eq!(notes.get::<Note>(&id).unwrap(), note("a", 1));
    }

    #[test]
    fn new_key_is_an_incomplete_placeholder() {
        let conn = SledConnection::new(SledContext::temporary().unwrap());
        let notes = conn.storage("notes");
        let key = notes.new_key().unwrap();
        assert!(!key.is_complete());
        assert!(matches!(
            notes.get::<Note>(&key),
            Err(DatastoneError::InvalidKey(_))
        ));
    }

    #[test]
    fn foreign_keys_are_rejected() {
        let conn = SledConnection::new(SledContext::temporary().unwrap());
        let id = conn.storage("notes").put(&note("a", 1)).unwrap();
        let other = conn.storage("todos");
        assert!(matches!(other.delete(&id), Err(DatastoneError::InvalidKey(_))));
    }

    #[test]
    fn update_overwrites_without_existence_check() {
        let conn = SledConnection::new(SledContext::temporary().unwrap());
        let notes = conn.storage("notes");
        let id = notes.put(&note("a", 1)).unwrap();
        notes.update(&id, &note("b", 2)).unwrap();
        assert_eq!(notes.get::<Note>(&id).unwrap(), note("b", 2));

        notes.delete(&id).unwrap();
        notes.update(&id, &note("c", 3)).unwrap();
        assert_eq!(notes.get::<Note>(&id).unwrap(), note("c", 3));
    }

    #[test]
    fn delete_is_idempotent() {
        let conn = SledConnection::new(SledContext::temporary().unwrap());
        let notes = conn.storage("notes");
        let id = notes.put(&note("a", 1)).unwrap();
        notes.delete(&id).unwrap();
        notes.delete(&id).unwrap();
        assert!(matches!(notes.get::<Note>(&id), Err(DatastoneError::NotFound)));
    }

    #[test]
    fn delete_multi_validates_before_deleting() {
        let conn = SledConnection::new(SledContext::temporary().unwrap());
        let notes = conn.storage("notes");
        let id = notes.put(&note("a", 1)).unwrap();
        let placeholder = notes.new_key().unwrap();
        assert!(notes.delete_multi(&[id.clone(), placeholder]).is_err());
        assert_eq!(notes.get::<Note>(&id).unwrap(), note("a", 1));
    }
}
