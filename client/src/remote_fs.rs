use chrono::{DateTime, Utc};
use std::{fmt, sync::Arc, time::Duration};
use tracing::{debug, instrument};

use crate::{
    config::ClientConfig,
    error::{PutfsError, Result},
    gateway::{ByteStream, DirEntry, EntryKind, Gateway, ObjectId},
    path,
    putio::HttpGateway,
    resolver::Resolver,
};

/// Modification times are reported to the second.
pub const PRECISION: Duration = Duration::from_secs(1);

/// A remote rooted at a directory of the store.
///
/// Paths handed to [`RemoteFs::list`] and [`RemoteFs::new_object`] are
/// relative to `root`, and so are the `remote` paths of what they return.
pub struct RemoteFs {
    name: String,
    root: String,
    resolver: Arc<Resolver>,
}

/// A directory as seen in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirRecord {
    pub remote: String,
    pub size: u64,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct RemoteFile {
    remote: String,
    name: String,
    size: u64,
    created_at: Option<DateTime<Utc>>,
    id: ObjectId,
    resolver: Arc<Resolver>,
}

pub enum Listing {
    Dir(DirRecord),
    File(RemoteFile),
}

impl Listing {
    pub fn remote(&self) -> &str {
        match self {
            Listing::Dir(d) => &d.remote,
            Listing::File(f) => f.remote(),
        }
    }
}

impl RemoteFs {
    pub fn new(name: impl Into<String>, root: &str, resolver: Arc<Resolver>) -> Self {
        RemoteFs {
            name: name.into(),
            root: path::normalize(root),
            resolver,
        }
    }

    /// Remote backed by the put.io API described by `config`.
    pub fn from_config(name: impl Into<String>, root: &str, config: &ClientConfig) -> Result<Self> {
        let gateway: Arc<dyn Gateway> = Arc::new(HttpGateway::new(config)?);
        Ok(Self::new(name, root, Arc::new(Resolver::new(gateway))))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn precision(&self) -> Duration {
        PRECISION
    }

    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }

    /// Files and directories directly inside `dir`.
    #[instrument(level = "debug", skip(self), fields(root = %self.root))]
    pub async fn list(&self, dir: &str) -> Result<Vec<Listing>> {
        let rel = path::normalize(dir);
        let entries = self.resolver.list_dir(&path::join(&self.root, &rel)).await?;
        debug!(dir = %rel, count = entries.len(), "listed remote directory");

        Ok(entries
            .into_iter()
            .map(|e| {
                let remote = path::join(&rel, &e.name);
                match e.kind {
                    EntryKind::Directory => Listing::Dir(DirRecord {
                        remote,
                        size: e.size,
                        created_at: e.created_at,
                    }),
                    EntryKind::File => Listing::File(self.file(remote, e)),
                }
            })
            .collect())
    }

    /// The file at `remote`. Directories are reported as not found.
    #[instrument(level = "debug", skip(self), fields(root = %self.root))]
    pub async fn new_object(&self, remote: &str) -> Result<RemoteFile> {
        let rel = path::normalize(remote);
        let (parent, name) = path::split_parent(&rel).ok_or_else(|| PutfsError::not_found(""))?;

        let entries = self
            .resolver
            .list_dir(&path::join(&self.root, parent))
            .await?;

        entries
            .into_iter()
            .find(|e| e.name == name && e.kind == EntryKind::File)
            .map(|e| self.file(rel.clone(), e))
            .ok_or_else(|| PutfsError::not_found(rel))
    }

    fn file(&self, remote: String, entry: DirEntry) -> RemoteFile {
        RemoteFile {
            remote,
            name: entry.name,
            size: entry.size,
            created_at: entry.created_at,
            id: entry.id,
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl fmt::Display for RemoteFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "put.io root '{}'", self.root)
    }
}

impl RemoteFile {
    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Creation time; the API has no separate modification time.
    pub fn mod_time(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn storable(&self) -> bool {
        false
    }

    pub fn hash(&self) -> Result<String> {
        Err(PutfsError::Unsupported("hashing"))
    }

    pub fn set_mod_time(&self, _t: DateTime<Utc>) -> Result<()> {
        Err(PutfsError::Unsupported("setting modification time"))
    }

    pub async fn open(&self) -> Result<ByteStream> {
        self.resolver.open(self.id).await
    }
}

impl fmt::Display for RemoteFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a file called {}", self.name)
    }
}

impl fmt::Debug for RemoteFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteFile")
            .field("remote", &self.remote)
            .field("id", &self.id)
            .field("size", &self.size)
            .finish()
    }
}
