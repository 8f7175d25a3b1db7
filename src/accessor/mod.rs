//! Resource accessors
//!
//! An accessor opens a named resource and hands back a readable stream that
//! can report its own metadata. Uploads depend only on the [`Accessor`] and
//! [`ResourceReader`] traits, never on a concrete backend.
//!
//! # Built-in backends
//!
//! | Selector | Backend |
//! |----------|---------|
//! | `file` | Local filesystem, optionally rooted at a directory |
//! | `data` | The identifier itself is the content |
//!
//! # Example
//!
//! ```
//! use http_uploadr::accessor::AccessorRegistry;
//! use http_uploadr::config::AccessorsConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = AccessorRegistry::from_config(&AccessorsConfig::default());
//! let accessor = registry.get("data")?;
//! let resource = accessor.open("hello").await?;
//! assert_eq!(resource.stat().await?.size, 5);
//! # Ok(())
//! # }
//! ```

use crate::config::AccessorsConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncRead;

pub mod data;
pub mod file;

pub use data::DataAccessor;
pub use file::FileAccessor;

/// Selector of the local filesystem accessor
pub const FILE_ACCESSOR: &str = "file";

/// Selector of the in-memory data accessor
pub const DATA_ACCESSOR: &str = "data";

/// Accessor errors
#[derive(Error, Debug)]
pub enum AccessorError {
    #[error("Unknown accessor '{0}'")]
    UnknownAccessor(String),

    #[error("Invalid path '{0}'")]
    InvalidPath(String),

    #[error("Unable to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to stat {path}: {source}")]
    Stat {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Metadata reported by an opened resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceInfo {
    pub size: u64,
    pub is_dir: bool,
}

/// An opened resource: a byte stream that can describe itself
#[async_trait]
pub trait ResourceReader: AsyncRead + Send + Sync + Unpin {
    async fn stat(&self) -> Result<ResourceInfo, AccessorError>;
}

/// Opens named resources on some storage backend
#[async_trait]
pub trait Accessor: Send + Sync {
    async fn open(&self, path: &str) -> Result<Box<dyn ResourceReader>, AccessorError>;
}

/// Maps selector strings to accessor implementations
pub struct AccessorRegistry {
    accessors: HashMap<String, Arc<dyn Accessor>>,
    default: String,
}

impl AccessorRegistry {
    /// Create an empty registry; `default` is used for empty selectors
    pub fn new(default: &str) -> Self {
        Self {
            accessors: HashMap::new(),
            default: default.to_string(),
        }
    }

    /// Create a registry holding the built-in backends
    pub fn from_config(config: &AccessorsConfig) -> Self {
        let mut registry = Self::new(&config.default);
        registry.register(
            FILE_ACCESSOR,
            Arc::new(FileAccessor::new(config.file.root.clone())),
        );
        registry.register(DATA_ACCESSOR, Arc::new(DataAccessor));
        registry
    }

    /// Register (or replace) the accessor behind `name`
    pub fn register(&mut self, name: &str, accessor: Arc<dyn Accessor>) {
        tracing::debug!(accessor = name, "Registered accessor");
        self.accessors.insert(name.to_string(), accessor);
    }

    /// Resolve a selector; an empty selector yields the default accessor
    pub fn get(&self, selector: &str) -> Result<Arc<dyn Accessor>, AccessorError> {
        let name = if selector.is_empty() {
            self.default.as_str()
        } else {
            selector
        };

        self.accessors
            .get(name)
            .cloned()
            .ok_or_else(|| AccessorError::UnknownAccessor(name.to_string()))
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    /// Registered selectors, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.accessors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for AccessorRegistry {
    fn default() -> Self {
        Self::from_config(&AccessorsConfig::default())
    }
}
