use std::fmt;
use std::time::Instant;

use log::debug;

use crate::config::{FileConfig, MemoryConfig};
use crate::error::{BackendError, DatastoneResult};

/// Separates the namespace from the kind in tree names.
const TREE_NAME_SEPARATOR: u8 = 0x1f;

/// Execution context wrapped by a [`SledConnection`](super::SledConnection):
/// a handle to an open sled database plus the namespace collections are
/// resolved in.
///
/// `sled::Db` is reference counted, so cloning a context is cheap and every
/// clone talks to the same database.
#[derive(Clone)]
pub struct SledContext {
    db: sled::Db,
    namespace: String,
}

impl SledContext {
    /// Open (or create) a persistent database described by `config`.
    ///
    /// ## Errors
    ///
    /// Returns a backend error if the database cannot be opened, or if it does
    /// not exist and `create_if_missing` is off.
    pub fn open(config: &FileConfig) -> DatastoneResult<Self> {
        let start = Instant::now();
        debug!("SledContext: Opening database at {}", config.path.display());

        if !config.create_if_missing && !config.path.exists() {
            let missing = std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", config.path.display()),
            );
            return Err(BackendError::Sled(sled::Error::Io(missing)).into());
        }

        let db = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_capacity_bytes())
            .flush_every_ms(config.flush_every_ms)
            .open()?;

        debug!("SledContext: Opened in {:?}", start.elapsed());
        Ok(Self::from_db(db, config.namespace.clone()))
    }

    /// Open a throwaway database that is removed when the last handle drops.
    pub fn in_memory(config: &MemoryConfig) -> DatastoneResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .cache_capacity(config.cache_capacity_bytes())
            .open()?;
        debug!("SledContext: Opened temporary database");
        Ok(Self::from_db(db, config.namespace.clone()))
    }

    /// [`SledContext::in_memory`] with default settings.
    pub fn temporary() -> DatastoneResult<Self> {
        Self::in_memory(&MemoryConfig::default())
    }

    pub fn from_db(db: sled::Db, namespace: impl Into<String>) -> Self {
        Self {
            db,
            namespace: namespace.into(),
        }
    }

    /// The same database seen through another namespace.
    pub fn with_namespace(&self, namespace: impl Into<String>) -> Self {
        Self {
            db: self.db.clone(),
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Get direct access to the underlying sled database
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Flush the database to disk
    pub fn flush(&self) -> DatastoneResult<usize> {
        Ok(self.db.flush()?)
    }

    pub(crate) fn tree_name(&self, kind: &str) -> Vec<u8> {
        let mut name = Vec::with_capacity(self.namespace.len() + kind.len() + 1);
        name.extend_from_slice(self.namespace.as_bytes());
        name.push(TREE_NAME_SEPARATOR);
        name.extend_from_slice(kind.as_bytes());
        name
    }

    pub(crate) fn collection(&self, kind: &str) -> DatastoneResult<sled::Tree> {
        Ok(self.db.open_tree(self.tree_name(kind))?)
    }

    /// Allocate a fresh, non-zero record id. Ids are unique across the whole
    /// database, not just one collection.
    pub(crate) fn allocate_id(&self) -> DatastoneResult<u64> {
        Ok(self.db.generate_id()? + 1)
    }
}

impl fmt::Debug for SledContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SledContext")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
