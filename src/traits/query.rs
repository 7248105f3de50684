use serde::de::DeserializeOwned;

use super::iter::RecordIter;
use crate::error::DatastoneResult;
use crate::identifier::Identifier;
use crate::query::{Operator, QueryConfig};
use crate::value::Value;

/// Query builder bound to one [`Storage`](super::Storage).
///
/// Refinement methods mutate the builder and return it for chaining; nothing
/// reaches the backend until one of the execution methods runs. Execution
/// methods take `&self`, so the same query can be executed repeatedly.
///
/// ```ignore
/// let mut adults = users.new_query();
/// adults.filter("age", Operator::Ge, 18).order_descending("age").limit(10);
/// let total = adults.count()?;
/// ```
pub trait Query {
    type Iter: RecordIter;

    /// Add a predicate. Predicates are conjunctive.
    fn filter(&mut self, field: &str, operator: Operator, value: impl Into<Value>) -> &mut Self;
    fn keys_only(&mut self) -> &mut Self;
    fn limit(&mut self, limit: usize) -> &mut Self;
    fn offset(&mut self, offset: usize) -> &mut Self;
    /// Sort ascending by `field`, replacing any earlier ordering.
    fn order(&mut self, field: &str) -> &mut Self;
    /// Sort descending by `field`, replacing any earlier ordering.
    fn order_descending(&mut self, field: &str) -> &mut Self;

    /// Snapshot of the accumulated criteria.
    fn config(&self) -> &QueryConfig;

    /// Decode the first result into `dst` and return its identifier. For a
    /// keys-only query `dst` is left untouched.
    ///
    /// # Errors
    /// * `DatastoneError::NotFound` if nothing matches
    fn get_first<T: DeserializeOwned>(&self, dst: &mut T) -> DatastoneResult<Identifier>;

    /// Append every result to `dst` and return the identifiers in the same
    /// order. For a keys-only query `dst` is left untouched.
    ///
    /// # Errors
    /// * `DatastoneError::NotFound` if nothing matches
    fn get_all<T: DeserializeOwned>(&self, dst: &mut Vec<T>) -> DatastoneResult<Vec<Identifier>>;

    /// Identifiers of every match, without decoding payloads.
    ///
    /// # Errors
    /// * `DatastoneError::NotFound` if nothing matches
    fn get_keys(&self) -> DatastoneResult<Vec<Identifier>>;

    /// Delete the first match and return its identifier.
    ///
    /// Lookup and delete are two separate backend calls; a record removed by
    /// someone else in between is not reported.
    fn delete_first(&self) -> DatastoneResult<Identifier>;

    /// Delete every match with one bulk delete and return the identifiers.
    ///
    /// Not transactional: records written between the key scan and the bulk
    /// delete are not affected, and a failure of the bulk delete leaves the
    /// collection as it was before that call.
    fn delete_all(&self) -> DatastoneResult<Vec<Identifier>>;

    /// Number of matches. Zero is a successful result.
    fn count(&self) -> DatastoneResult<usize>;

    /// Start executing and return a lazy cursor over the results.
    fn iter(&self) -> DatastoneResult<Self::Iter>;
}
