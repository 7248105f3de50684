use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::error::{DatastoneError, DatastoneResult};
use crate::identifier::Identifier;

/// Pull-based cursor over query results.
///
/// The sequence is finite and cannot be restarted. Exhaustion is reported as
/// [`DatastoneError::Done`], never as `NotFound`.
pub trait RecordIter {
    /// Decode the next result into `dst` and return its identifier. For a
    /// keys-only query `dst` is left untouched.
    fn next<T: DeserializeOwned>(&mut self, dst: &mut T) -> DatastoneResult<Identifier>;

    /// Advance without decoding the payload.
    fn next_key(&mut self) -> DatastoneResult<Identifier>;

    /// Adapt the cursor into a standard iterator of decoded records.
    fn records<T: DeserializeOwned>(self) -> Records<Self, T>
    where
        Self: Sized,
    {
        Records {
            cursor: self,
            finished: false,
            _record: PhantomData,
        }
    }
}

/// [`Iterator`] over `(Identifier, T)` pairs; ends where the cursor reports
/// [`DatastoneError::Done`]. The first error also ends the iteration, and a
/// keys-only cursor yields [`DatastoneError::NoPayload`].
pub struct Records<I, T> {
    cursor: I,
    finished: bool,
    _record: PhantomData<T>,
}

impl<I, T> Iterator for Records<I, T>
where
    I: RecordIter,
    T: DeserializeOwned,
{
    type Item = DatastoneResult<(Identifier, T)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let mut slot: Option<T> = None;
        match self.cursor.next(&mut slot) {
            Ok(key) => match slot {
                Some(record) => Some(Ok((key, record))),
                None => {
                    self.finished = true;
                    Some(Err(DatastoneError::NoPayload))
                }
            },
            Err(DatastoneError::Done) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
