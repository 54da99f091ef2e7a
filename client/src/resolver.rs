use std::sync::Arc;

use tracing::{debug, instrument, trace, warn};

use crate::{
    cache::ResolutionCache,
    error::{PutfsError, Result},
    gateway::{ByteStream, DirEntry, Gateway, ObjectId},
    path,
};

/// Resolves slash-separated paths to remote object ids.
///
/// The remote store can only list the children of an id, so a path is
/// resolved by listing one directory level at a time. Every child seen in a
/// listing is cached, not just the one on the requested path.
pub struct Resolver {
    gateway: Arc<dyn Gateway>,
    cache: Arc<ResolutionCache>,
}

impl Resolver {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Resolver {
            gateway,
            cache: Arc::new(ResolutionCache::new()),
        }
    }

    pub fn cache(&self) -> Arc<ResolutionCache> {
        Arc::clone(&self.cache)
    }

    /// Id of the object at `path`.
    ///
    /// The walk starts at the deepest cached ancestor and lists one level per
    /// step until the target shows up in the cache.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve(&self, path: &str) -> Result<ObjectId> {
        let target = path::normalize(path);

        if let Some(id) = self.cache.get(&target) {
            trace!(target = %target, id, "resolution cache hit");
            return Ok(id);
        }

        let segments: Vec<&str> = target.split('/').collect();

        // The root is always cached, so this finds at least depth 0.
        let start = (0..segments.len())
            .rev()
            .find(|&depth| self.cache.contains(&segments[..depth].join("/")))
            .unwrap_or(0);

        for depth in start..segments.len() {
            let parent = segments[..depth].join("/");
            let parent_id = match self.cache.get(&parent) {
                Some(id) => id,
                None => {
                    debug!(target = %target, missing = %parent, "path segment not found");
                    return Err(PutfsError::not_found(target));
                }
            };

            let children = self.gateway.list_children(parent_id).await?;
            debug!(parent = %parent, parent_id, count = children.len(), "listed directory");
            self.absorb(&parent, &children);

            if let Some(id) = self.cache.get(&target) {
                debug!(target = %target, id, "path resolved");
                return Ok(id);
            }
        }

        debug!(target = %target, "final path segment not found");
        Err(PutfsError::not_found(target))
    }

    /// Children of directory `id`, straight from the gateway.
    pub async fn list_children(&self, id: ObjectId) -> Result<Vec<DirEntry>> {
        self.gateway.list_children(id).await
    }

    /// Resolves `dir`, lists it and caches every child under it.
    pub async fn list_dir(&self, dir: &str) -> Result<Vec<DirEntry>> {
        let dir = path::normalize(dir);
        let id = self.resolve(&dir).await?;
        let children = self.gateway.list_children(id).await?;
        self.absorb(&dir, &children);
        Ok(children)
    }

    pub async fn open(&self, id: ObjectId) -> Result<ByteStream> {
        self.gateway.open_content(id).await
    }

    /// Caches every child of `parent`. Names that are not a single path
    /// segment would land on the parent itself or under an uncached
    /// ancestor, so they are skipped.
    fn absorb(&self, parent: &str, children: &[DirEntry]) {
        self.cache.extend(children.iter().filter_map(|child| {
            if !is_segment(&child.name) {
                warn!(parent = %parent, name = %child.name, id = child.id, "skipping listing entry with unusable name");
                return None;
            }
            Some((path::join(parent, &child.name), child.id))
        }));
    }
}

fn is_segment(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/')
}
