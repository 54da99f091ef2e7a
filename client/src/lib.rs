//! Path-addressed access to the put.io file store.
//!
//! The store only understands numeric object ids. [`Resolver`] turns
//! slash-separated paths into those ids by walking the remote tree one
//! directory listing at a time and caching everything it sees.

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod path;
pub mod putio;
pub mod remote_fs;
pub mod resolver;

#[cfg(test)]
mod fake;

pub use cache::ResolutionCache;
pub use config::ClientConfig;
pub use error::{PutfsError, Result};
pub use gateway::{read_to_end, ByteStream, DirEntry, EntryKind, Gateway, ObjectId};
pub use putio::HttpGateway;
pub use remote_fs::{DirRecord, Listing, RemoteFile, RemoteFs};
pub use resolver::Resolver;
