//! In-process gateway for unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;

use crate::{
    error::{PutfsError, Result},
    gateway::{ByteStream, DirEntry, EntryKind, Gateway, ObjectId},
};

#[derive(Default)]
pub(crate) struct FakeGateway {
    listings: Mutex<HashMap<ObjectId, Vec<DirEntry>>>,
    contents: HashMap<ObjectId, Vec<u8>>,
    transport_failures: HashSet<ObjectId>,
    remote_failures: HashSet<ObjectId>,
    calls: Mutex<Vec<ObjectId>>,
}

impl FakeGateway {
    pub(crate) fn dir(mut self, parent: ObjectId, name: &str, id: ObjectId) -> Self {
        self.push(parent, name, id, EntryKind::Directory, 0);
        self
    }

    pub(crate) fn file(mut self, parent: ObjectId, name: &str, id: ObjectId, body: &[u8]) -> Self {
        self.push(parent, name, id, EntryKind::File, body.len() as u64);
        self.contents.insert(id, body.to_vec());
        self
    }

    pub(crate) fn fail_transport(mut self, id: ObjectId) -> Self {
        self.transport_failures.insert(id);
        self
    }

    pub(crate) fn fail_remote(mut self, id: ObjectId) -> Self {
        self.remote_failures.insert(id);
        self
    }

    /// Gives the child `name` of `parent` a new id, as a remote rename or
    /// re-upload would.
    pub(crate) fn replace(&self, parent: ObjectId, name: &str, id: ObjectId) {
        let mut listings = self.listings.lock().unwrap();
        if let Some(child) = listings
            .get_mut(&parent)
            .and_then(|children| children.iter_mut().find(|c| c.name == name))
        {
            child.id = id;
        }
    }

    /// Ids passed to `list_children`, in call order.
    pub(crate) fn calls(&self) -> Vec<ObjectId> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&mut self, parent: ObjectId, name: &str, id: ObjectId, kind: EntryKind, size: u64) {
        self.listings.get_mut().unwrap().entry(parent).or_default().push(DirEntry {
            name: name.to_string(),
            id,
            kind,
            size,
            created_at: None,
        });
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn list_children(&self, id: ObjectId) -> Result<Vec<DirEntry>> {
        self.calls.lock().unwrap().push(id);
        tokio::task::yield_now().await;

        if self.transport_failures.contains(&id) {
            return Err(PutfsError::Transport("connection reset".into()));
        }
        if self.remote_failures.contains(&id) {
            return Err(PutfsError::Remote {
                status: "ERROR".into(),
                message: "received error response from server".into(),
            });
        }
        Ok(self.listings.lock().unwrap().get(&id).cloned().unwrap_or_default())
    }

    async fn open_content(&self, id: ObjectId) -> Result<ByteStream> {
        let body = self
            .contents
            .get(&id)
            .cloned()
            .ok_or_else(|| PutfsError::Transport(format!("no download redirect for {}", id)))?;
        let chunks: Vec<Result<Bytes>> = body
            .chunks(4)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(Box::pin(stream::iter(chunks)))
    }
}

/// root
/// ├── readme.txt (1)
/// ├── one/ (100)
/// │   ├── readme.txt (101)
/// │   └── two/ (200)
/// │       ├── target.txt (201)
/// │       └── three/ (300)
/// └── other/ (400)
///     └── b.txt (401)
pub(crate) fn sample_tree() -> FakeGateway {
    FakeGateway::default()
        .file(0, "readme.txt", 1, b"read me")
        .dir(0, "one", 100)
        .dir(0, "other", 400)
        .file(100, "readme.txt", 101, b"nested read me")
        .dir(100, "two", 200)
        .file(200, "target.txt", 201, b"I am a file")
        .dir(200, "three", 300)
        .file(400, "b.txt", 401, b"bee")
}
