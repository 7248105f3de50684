use std::time::Instant;

use log::{debug, trace};
use serde::de::DeserializeOwned;

use super::{deserialize_entity, id_from_bytes};
use crate::error::{DatastoneError, DatastoneResult};
use crate::identifier::Identifier;
use crate::query::QueryConfig;
use crate::traits::RecordIter;
use crate::value::Entity;

/// Where matching rows come from.
enum Source {
    /// Unordered queries stream straight off the tree, filtering as they go.
    Scan(sled::Iter),
    /// Ordered queries are materialized and sorted when the cursor opens.
    Sorted(std::vec::IntoIter<(u64, Entity)>),
}

struct Hit {
    id: u64,
    entity: Option<Entity>,
}

/// Cursor over the results of a [`SledQuery`](super::SledQuery).
///
/// Offset and limit are applied while advancing, after filtering and ordering.
pub struct SledIter {
    namespace: String,
    kind: String,
    config: QueryConfig,
    source: Source,
    to_skip: usize,
    remaining: Option<usize>,
}

impl SledIter {
    pub(crate) fn open(
        tree: &sled::Tree,
        namespace: &str,
        kind: &str,
        config: QueryConfig,
    ) -> DatastoneResult<Self> {
        debug!("SledIter: executing on {kind}: {config}");
        let source = match &config.order {
            None => Source::Scan(tree.iter()),
            Some(order) => {
                let start = Instant::now();
                let mut rows = Vec::new();
                for row in tree.iter() {
                    let (key, value) = row?;
                    let entity = deserialize_entity(&value)?;
                    if config.admits(&entity) {
                        rows.push((id_from_bytes(&key)?, entity));
                    }
                }
                rows.sort_by(|(id_a, a), (id_b, b)| order.compare(a, b).then(id_a.cmp(id_b)));
                debug!(
                    "SledIter: sorted {} rows of {kind} in {:?}",
                    rows.len(),
                    start.elapsed()
                );
                Source::Sorted(rows.into_iter())
            }
        };

        Ok(Self {
            namespace: namespace.to_owned(),
            kind: kind.to_owned(),
            to_skip: config.pagination.offset.unwrap_or(0),
            remaining: config.pagination.limit,
            config,
            source,
        })
    }

    fn identifier(&self, id: u64) -> Identifier {
        Identifier::complete(&self.namespace, &self.kind, id)
    }

    /// Next row satisfying the filters, before pagination.
    fn pull(&mut self) -> DatastoneResult<Option<Hit>> {
        match &mut self.source {
            Source::Sorted(rows) => Ok(rows.next().map(|(id, entity)| Hit {
                id,
                entity: Some(entity),
            })),
            Source::Scan(rows) => {
                let needs_payload = self.config.needs_payload();
                for row in rows.by_ref() {
                    let (key, value) = row?;
                    let id = id_from_bytes(&key)?;
                    if !needs_payload {
                        return Ok(Some(Hit { id, entity: None }));
                    }
                    let entity = deserialize_entity(&value)?;
                    if self.config.admits(&entity) {
                        return Ok(Some(Hit {
                            id,
                            entity: Some(entity),
                        }));
                    }
                    trace!("SledIter: {}#{} filtered out", self.kind, id);
                }
                Ok(None)
            }
        }
    }

    fn advance(&mut self) -> DatastoneResult<Hit> {
        if self.remaining == Some(0) {
            return Err(DatastoneError::Done);
        }
        while self.to_skip > 0 {
            if self.pull()?.is_none() {
                self.to_skip = 0;
                return Err(DatastoneError::Done);
            }
            self.to_skip -= 1;
        }
        let hit = self.pull()?.ok_or(DatastoneError::Done)?;
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }
        Ok(hit)
    }

    /// Drain the remaining identifiers.
    pub(crate) fn collect_keys(mut self) -> DatastoneResult<Vec<Identifier>> {
        let mut keys = Vec::new();
        loop {
            match self.next_key() {
                Ok(key) => keys.push(key),
                Err(DatastoneError::Done) => return Ok(keys),
                Err(e) => return Err(e),
            }
        }
    }
}

impl RecordIter for SledIter {
    fn next<T: DeserializeOwned>(&mut self, dst: &mut T) -> DatastoneResult<Identifier> {
        let hit = self.advance()?;
        if !self.config.fetch_options.keys_only {
            if let Some(entity) = hit.entity {
                *dst = entity.into_record()?;
            }
        }
        Ok(self.identifier(hit.id))
    }

    fn next_key(&mut self) -> DatastoneResult<Identifier> {
        let hit = self.advance()?;
        Ok(self.identifier(hit.id))
    }
}
