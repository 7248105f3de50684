use log::debug;
use serde::de::DeserializeOwned;

use super::iterator::SledIter;
use super::storage::SledStorage;
use crate::error::{DatastoneError, DatastoneResult};
use crate::identifier::Identifier;
use crate::query::{Direction, Operator, Order, Predicate, QueryConfig};
use crate::traits::{Query, RecordIter, Storage};
use crate::value::Value;

/// [`Query`] against one [`SledStorage`].
///
/// The builder only records criteria in a [`QueryConfig`]; every execution
/// method opens a fresh [`SledIter`] over the collection's tree. A query is
/// not `Clone`; refinements always land on the one builder.
#[derive(Debug)]
pub struct SledQuery<'s, 'c> {
    storage: &'s SledStorage<'c>,
    config: QueryConfig,
}

impl<'s, 'c> SledQuery<'s, 'c> {
    pub(crate) fn new(storage: &'s SledStorage<'c>) -> Self {
        Self {
            storage,
            config: QueryConfig::default(),
        }
    }

    pub fn storage(&self) -> &'s SledStorage<'c> {
        self.storage
    }

    fn execute(&self, config: QueryConfig) -> DatastoneResult<SledIter> {
        let tree = self.storage.tree()?;
        SledIter::open(&tree, self.storage.namespace(), self.storage.name(), config)
    }

    /// The accumulated criteria, capped at one result.
    fn first_only(&self) -> QueryConfig {
        let mut config = self.config.clone();
        config.pagination.limit = Some(config.pagination.limit.map_or(1, |limit| limit.min(1)));
        config
    }

    fn keys_only_config(&self) -> QueryConfig {
        let mut config = self.config.clone();
        config.fetch_options.keys_only = true;
        config
    }
}

fn done_as_not_found(err: DatastoneError) -> DatastoneError {
    match err {
        DatastoneError::Done => DatastoneError::NotFound,
        other => other,
    }
}

impl<'s, 'c> Query for SledQuery<'s, 'c> {
    type Iter = SledIter;

    fn filter(&mut self, field: &str, operator: Operator, value: impl Into<Value>) -> &mut Self {
        self.config
            .predicates
            .push(Predicate::new(field, operator, value));
        self
    }

    fn keys_only(&mut self) -> &mut Self {
        self.config.fetch_options.keys_only = true;
        self
    }

    fn limit(&mut self, limit: usize) -> &mut Self {
        self.config.pagination.limit = Some(limit);
        self
    }

    fn offset(&mut self, offset: usize) -> &mut Self {
        self.config.pagination.offset = Some(offset);
        self
    }

    fn order(&mut self, field: &str) -> &mut Self {
        self.config.order = Some(Order {
            field: field.to_owned(),
            direction: Direction::Ascending,
        });
        self
    }

    fn order_descending(&mut self, field: &str) -> &mut Self {
        self.config.order = Some(Order {
            field: field.to_owned(),
            direction: Direction::Descending,
        });
        self
    }

    fn config(&self) -> &QueryConfig {
        &self.config
    }

    fn get_first<T: DeserializeOwned>(&self, dst: &mut T) -> DatastoneResult<Identifier> {
        self.execute(self.first_only())?
            .next(dst)
            .map_err(done_as_not_found)
    }

    fn get_all<T: DeserializeOwned>(&self, dst: &mut Vec<T>) -> DatastoneResult<Vec<Identifier>> {
        let mut iter = self.execute(self.config.clone())?;
        let mut keys = Vec::new();
        let mut records = Vec::new();
        loop {
            if self.config.fetch_options.keys_only {
                match iter.next_key() {
                    Ok(key) => keys.push(key),
                    Err(DatastoneError::Done) => break,
                    Err(e) => return Err(e),
                }
                continue;
            }
            let mut slot: Option<T> = None;
            match iter.next(&mut slot) {
                Ok(key) => {
                    keys.push(key);
                    records.extend(slot);
                }
                Err(DatastoneError::Done) => break,
                Err(e) => return Err(e),
            }
        }
        if keys.is_empty() {
            return Err(DatastoneError::NotFound);
        }
        dst.extend(records);
        Ok(keys)
    }

    fn get_keys(&self) -> DatastoneResult<Vec<Identifier>> {
        let keys = self.execute(self.keys_only_config())?.collect_keys()?;
        if keys.is_empty() {
            return Err(DatastoneError::NotFound);
        }
        Ok(keys)
    }

    fn delete_first(&self) -> DatastoneResult<Identifier> {
        let mut config = self.first_only();
        config.fetch_options.keys_only = true;
        let key = self
            .execute(config)?
            .next_key()
            .map_err(done_as_not_found)?;
        self.storage.delete(&key)?;
        Ok(key)
    }

    fn delete_all(&self) -> DatastoneResult<Vec<Identifier>> {
        let keys = self.get_keys()?;
        self.storage.delete_multi(&keys)?;
        debug!(
            "SledQuery: deleted {} matches from {}",
            keys.len(),
            self.storage.name()
        );
        Ok(keys)
    }

    fn count(&self) -> DatastoneResult<usize> {
        let mut iter = self.execute(self.keys_only_config())?;
        let mut count = 0;
        loop {
            match iter.next_key() {
                Ok(_) => count += 1,
                Err(DatastoneError::Done) => return Ok(count),
                Err(e) => return Err(e),
            }
        }
    }

    fn iter(&self) -> DatastoneResult<SledIter> {
        self.execute(self.config.clone())
    }
}
