//! Configuration for opening a backend context.
//!
//! Both configurations use the builder pattern via `typed-builder`.

use std::path::PathBuf;
use typed_builder::TypedBuilder;

/// Configuration for a persistent, file-backed context.
///
/// # Examples
///
/// ```
/// use datastone::config::FileConfig;
///
/// // Create with defaults
/// let config = FileConfig::builder()
///     .path("my_database")
///     .build();
///
/// // Customize options
/// let config = FileConfig::builder()
///     .path("/data/store")
///     .cache_size_mb(512)
///     .namespace("tenant-a")
///     .flush_every_ms(None)
///     .build();
/// assert_eq!(config.namespace, "tenant-a");
/// ```
#[derive(Debug, Clone, TypedBuilder)]
#[builder(doc)]
pub struct FileConfig {
    /// Directory holding the database files
    #[builder(setter(into))]
    pub path: PathBuf,

    /// Page cache size in megabytes
    #[builder(default = 256)]
    pub cache_size_mb: u64,

    /// Background flush interval; `None` flushes only on explicit request
    #[builder(default = Some(500))]
    pub flush_every_ms: Option<u64>,

    /// Whether to create the database if it doesn't exist
    #[builder(default = true)]
    pub create_if_missing: bool,

    /// Namespace partitioning every collection opened through the context
    #[builder(default, setter(into))]
    pub namespace: String,
}

impl FileConfig {
    /// Create a basic configuration with just a path
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            cache_size_mb: 256,
            flush_every_ms: Some(500),
            create_if_missing: true,
            namespace: String::new(),
        }
    }

    pub(crate) fn cache_capacity_bytes(&self) -> u64 {
        self.cache_size_mb.saturating_mul(1024 * 1024)
    }
}

/// Configuration for a temporary context that is discarded on drop.
///
/// # Examples
///
/// ```
/// use datastone::config::MemoryConfig;
///
/// let config = MemoryConfig::builder()
///     .cache_size_mb(16)
///     .build();
/// assert_eq!(config.namespace, "");
/// ```
#[derive(Debug, Clone, TypedBuilder)]
#[builder(doc)]
pub struct MemoryConfig {
    /// Page cache size in megabytes
    #[builder(default = 64)]
    pub cache_size_mb: u64,

    /// Namespace partitioning every collection opened through the context
    #[builder(default, setter(into))]
    pub namespace: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            cache_size_mb: 64,
            namespace: String::new(),
        }
    }
}

impl MemoryConfig {
    pub(crate) fn cache_capacity_bytes(&self) -> u64 {
        self.cache_size_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_config_builder() {
        let config = FileConfig::builder()
            .path(PathBuf::from("/tmp/test_store"))
            .cache_size_mb(512)
            .create_if_missing(false)
            .build();

        assert_eq!(config.path, PathBuf::from("/tmp/test_store"));
        assert_eq!(config.cache_size_mb, 512);
        assert!(!config.create_if_missing);
        assert_eq!(config.cache_capacity_bytes(), 512 * 1024 * 1024);
    }

    #[test]
    fn test_file_config_defaults() {
        let config = FileConfig::new("/tmp/default_store");
        assert_eq!(config.cache_size_mb, 256);
        assert_eq!(config.flush_every_ms, Some(500));
        assert!(config.create_if_missing);
        assert!(config.namespace.is_empty());
    }

    #[test]
    fn test_memory_config_default() {
        let config = MemoryConfig::default();
        assert_eq!(config.cache_size_mb, 64);
        assert!(config.namespace.is_empty());
    }
}
