use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::{Stream, StreamExt};

use crate::error::Result;

/// Numeric id the remote store assigns to every file and directory.
pub type ObjectId = u64;

/// Body of a downloaded file.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One child returned by a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub id: ObjectId,
    pub kind: EntryKind,
    pub size: u64,
    pub created_at: Option<DateTime<Utc>>,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// The two calls the remote store understands.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Immediate children of directory `id`.
    async fn list_children(&self, id: ObjectId) -> Result<Vec<DirEntry>>;

    /// Content of file `id`.
    async fn open_content(&self, id: ObjectId) -> Result<ByteStream>;
}

/// Drains a [`ByteStream`] into memory.
pub async fn read_to_end(mut stream: ByteStream) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}
