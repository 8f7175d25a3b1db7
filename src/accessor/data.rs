//! In-memory accessor: the path is the content

use super::{Accessor, AccessorError, ResourceInfo, ResourceReader};
use async_trait::async_trait;
use std::io::Cursor;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

/// Accessor whose "path" is the literal bytes of the resource
#[derive(Debug, Default, Clone, Copy)]
pub struct DataAccessor;

/// Resource backed by an owned byte buffer
#[derive(Debug)]
pub struct DataResource {
    cursor: Cursor<Vec<u8>>,
}

impl DataResource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            cursor: Cursor::new(data.into()),
        }
    }
}

impl AsyncRead for DataResource {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.cursor).poll_read(cx, buf)
    }
}

#[async_trait]
impl ResourceReader for DataResource {
    async fn stat(&self) -> Result<ResourceInfo, AccessorError> {
        Ok(ResourceInfo {
            size: self.cursor.get_ref().len() as u64,
            is_dir: false,
        })
    }
}

#[async_trait]
impl Accessor for DataAccessor {
    async fn open(&self, path: &str) -> Result<Box<dyn ResourceReader>, AccessorError> {
        Ok(Box::new(DataResource::new(path.as_bytes())))
    }
}
