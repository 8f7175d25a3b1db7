//! Local filesystem accessor

use super::{Accessor, AccessorError, ResourceInfo, ResourceReader};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncRead, ReadBuf};

/// Opens files on the local filesystem
///
/// When a root is configured, relative identifiers are resolved against it.
/// Absolute identifiers are used as given.
#[derive(Debug, Default, Clone)]
pub struct FileAccessor {
    root: Option<PathBuf>,
}

impl FileAccessor {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Resolve an identifier to the path that will be opened
    pub fn resolve(&self, path: &str) -> Result<PathBuf, AccessorError> {
        if path.is_empty() {
            return Err(AccessorError::InvalidPath(path.to_string()));
        }

        let candidate = Path::new(path);
        match &self.root {
            Some(root) if candidate.is_relative() => Ok(root.join(candidate)),
            _ => Ok(candidate.to_path_buf()),
        }
    }
}

/// An open local file
#[derive(Debug)]
pub struct FileResource {
    file: File,
    path: PathBuf,
}

impl FileResource {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AsyncRead for FileResource {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.file).poll_read(cx, buf)
    }
}

#[async_trait]
impl ResourceReader for FileResource {
    async fn stat(&self) -> Result<ResourceInfo, AccessorError> {
        let metadata = self
            .file
            .metadata()
            .await
            .map_err(|source| AccessorError::Stat {
                path: self.path.display().to_string(),
                source,
            })?;

        Ok(ResourceInfo {
            size: metadata.len(),
            is_dir: metadata.is_dir(),
        })
    }
}

#[async_trait]
impl Accessor for FileAccessor {
    async fn open(&self, path: &str) -> Result<Box<dyn ResourceReader>, AccessorError> {
        let resolved = self.resolve(path)?;
        let file = File::open(&resolved)
            .await
            .map_err(|source| AccessorError::Open {
                path: path.to_string(),
                source,
            })?;

        tracing::debug!(path = %resolved.display(), "Opened file resource");

        Ok(Box::new(FileResource {
            file,
            path: resolved,
        }))
    }
}
