use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use futures_util::StreamExt;
use reqwest::{
    header::{CONTENT_TYPE, LOCATION},
    redirect::Policy,
    Client, StatusCode,
};
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    config::ClientConfig,
    error::{PutfsError, Result},
    gateway::{ByteStream, DirEntry, EntryKind, Gateway, ObjectId},
};

/// Content type the API reports for folders.
pub const DIRECTORY_CONTENT_TYPE: &str = "application/x-directory";

/// Timestamp layout of `created_at` (no zone, UTC).
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// -----------------------------------------------------------------------------
// Wire types
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct FileObject {
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default, deserialize_with = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parent_id: Option<ObjectId>,
    #[serde(default)]
    pub crc32: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListFilesResponse {
    #[serde(default)]
    pub files: Vec<FileObject>,
    #[serde(default)]
    pub parent: Option<FileObject>,
    pub status: String,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ListFilesResponse {
    fn into_remote_error(self) -> PutfsError {
        let message = match (self.error_type, self.error_message) {
            (Some(kind), Some(msg)) if !kind.is_empty() && !msg.is_empty() => {
                format!("{}: {}", kind, msg)
            }
            _ => "received error response from server".to_string(),
        };
        PutfsError::Remote {
            status: self.status,
            message,
        }
    }
}

impl From<FileObject> for DirEntry {
    fn from(f: FileObject) -> Self {
        let kind = if f.content_type.as_deref() == Some(DIRECTORY_CONTENT_TYPE) {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        DirEntry {
            name: f.name,
            id: f.id,
            kind,
            size: f.size.unwrap_or_default(),
            created_at: f.created_at,
        }
    }
}

fn created_at<'de, D>(d: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(d)? {
        Some(raw) if !raw.is_empty() => NaiveDateTime::parse_from_str(&raw, CREATED_AT_FORMAT)
            .map(|t| Some(t.and_utc()))
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

// -----------------------------------------------------------------------------
// Gateway
// -----------------------------------------------------------------------------

/// [`Gateway`] over the put.io v2 REST API.
pub struct HttpGateway {
    client: Client,
    // download links answer with a redirect we need to see
    no_redirect: Client,
    api_url: String,
    token: String,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder().timeout(timeout).build()?;
        let no_redirect = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()?;

        Ok(HttpGateway {
            client,
            no_redirect,
            api_url: config.api_base().to_string(),
            token: config.token()?.to_string(),
        })
    }

    async fn list_files(&self, parent_id: ObjectId) -> Result<ListFilesResponse> {
        let url = format!("{}/files/list", self.api_url);
        let parent = parent_id.to_string();
        let res = self
            .client
            .get(&url)
            .query(&[("parent_id", parent.as_str()), ("oauth_token", self.token.as_str())])
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = res.status();
        let body = res.bytes().await?;

        let listing: ListFilesResponse = match serde_json::from_slice(&body) {
            Ok(l) => l,
            Err(e) => {
                warn!(parent_id, %status, "undecodable listing response");
                return Err(PutfsError::Remote {
                    status: status.to_string(),
                    message: format!("malformed listing response: {}", e),
                });
            }
        };

        if listing.status != "OK" {
            return Err(listing.into_remote_error());
        }
        Ok(listing)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list_children(&self, id: ObjectId) -> Result<Vec<DirEntry>> {
        debug!(id, "listing directory");
        let listing = self.list_files(id).await?;
        Ok(listing.files.into_iter().map(DirEntry::from).collect())
    }

    async fn open_content(&self, id: ObjectId) -> Result<ByteStream> {
        debug!(id, "resolving download link");
        let url = format!("{}/files/{}/download", self.api_url, id);
        let res = self
            .no_redirect
            .get(&url)
            .query(&[("oauth_token", self.token.as_str())])
            .send()
            .await?;

        if res.status() != StatusCode::FOUND {
            return Err(PutfsError::Transport(format!(
                "unexpected status code from server: {}",
                res.status()
            )));
        }

        let location = res
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| PutfsError::Transport("download redirect without location".into()))?;
        let target = res
            .url()
            .join(location)
            .map_err(|e| PutfsError::Transport(format!("bad download location: {}", e)))?;

        debug!(id, "fetching file content");
        let body = self.client.get(target).send().await?.error_for_status()?;
        Ok(Box::pin(
            body.bytes_stream().map(|chunk| chunk.map_err(PutfsError::from)),
        ))
    }
}
