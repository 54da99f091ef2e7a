use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::SharedState;

pub const DIRECTORY_CONTENT_TYPE: &str = "application/x-directory";
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// -------------------------------------------
// Types
// -------------------------------------------

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    File,
    Directory,
}

#[derive(Debug, Clone)]
pub struct RemoteNode {
    pub id: u64,
    pub parent_id: u64,
    pub name: String,
    pub node_type: NodeType,
    pub content: Vec<u8>,
    pub created_at: String,
    pub children: Vec<u64>,
}

/// The store's object tree, keyed by numeric id. Id 0 is the root.
#[derive(Debug, Clone)]
pub struct RemoteTree {
    nodes: HashMap<u64, RemoteNode>,
}

impl Default for RemoteTree {
    fn default() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            0,
            RemoteNode {
                id: 0,
                parent_id: 0,
                name: String::new(),
                node_type: NodeType::Directory,
                content: Vec::new(),
                created_at: now(),
                children: Vec::new(),
            },
        );
        RemoteTree { nodes }
    }
}

impl RemoteTree {
    /// Adds a directory under `parent` with a fresh id.
    pub fn add_dir(&mut self, parent: u64, name: &str) -> anyhow::Result<u64> {
        let id = self.next_id();
        self.insert(parent, id, name, NodeType::Directory, Vec::new())?;
        Ok(id)
    }

    /// Adds a file under `parent` with a fresh id.
    pub fn add_file(&mut self, parent: u64, name: &str, content: &[u8]) -> anyhow::Result<u64> {
        let id = self.next_id();
        self.insert(parent, id, name, NodeType::File, content.to_vec())?;
        Ok(id)
    }

    /// Adds a node with a caller-chosen id.
    pub fn insert(
        &mut self,
        parent: u64,
        id: u64,
        name: &str,
        node_type: NodeType,
        content: Vec<u8>,
    ) -> anyhow::Result<()> {
        if self.nodes.contains_key(&id) {
            anyhow::bail!("id {} already in use", id);
        }
        let p = self
            .nodes
            .get_mut(&parent)
            .ok_or_else(|| anyhow::anyhow!("parent {} does not exist", parent))?;
        if p.node_type != NodeType::Directory {
            anyhow::bail!("parent {} is not a directory", parent);
        }
        p.children.push(id);

        self.nodes.insert(
            id,
            RemoteNode {
                id,
                parent_id: parent,
                name: name.to_string(),
                node_type,
                content,
                created_at: now(),
                children: Vec::new(),
            },
        );
        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<&RemoteNode> {
        self.nodes.get(&id)
    }

    pub fn children(&self, id: u64) -> Option<Vec<&RemoteNode>> {
        let dir = self.nodes.get(&id)?;
        if dir.node_type != NodeType::Directory {
            return None;
        }
        Some(dir.children.iter().filter_map(|c| self.nodes.get(c)).collect())
    }

    fn next_id(&self) -> u64 {
        self.nodes.keys().max().map_or(1, |m| m + 1)
    }
}

fn now() -> String {
    Utc::now().format(CREATED_AT_FORMAT).to_string()
}

// -------------------------------------------
// Wire types
// -------------------------------------------

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FileObject {
    pub id: u64,
    pub parent_id: u64,
    pub name: String,
    pub size: u64,
    pub content_type: String,
    pub created_at: String,
}

impl From<&RemoteNode> for FileObject {
    fn from(n: &RemoteNode) -> Self {
        FileObject {
            id: n.id,
            parent_id: n.parent_id,
            name: n.name.clone(),
            size: n.content.len() as u64,
            content_type: match n.node_type {
                NodeType::Directory => DIRECTORY_CONTENT_TYPE.to_string(),
                NodeType::File => "application/octet-stream".to_string(),
            },
            created_at: n.created_at.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ListFilesResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub files: Vec<FileObject>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent: Option<FileObject>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_message: Option<String>,
}

impl ListFilesResponse {
    fn error(error_type: &str, message: &str) -> Self {
        ListFilesResponse {
            status: "ERROR".into(),
            error_type: Some(error_type.into()),
            error_message: Some(message.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub parent_id: u64,
    pub oauth_token: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub oauth_token: String,
}

// -------------------------------------------
// Handlers
// -------------------------------------------

/// GET /v2/files/list?parent_id=&oauth_token=
pub async fn list(
    State(state): State<SharedState>,
    Query(q): Query<ListQuery>,
) -> (StatusCode, Json<ListFilesResponse>) {
    let mut st = state.lock().unwrap();

    if q.oauth_token != st.oauth_token {
        warn!("list rejected: bad oauth token");
        return (
            StatusCode::UNAUTHORIZED,
            Json(ListFilesResponse::error("invalid_grant", "invalid oauth token")),
        );
    }

    *st.list_requests.entry(q.parent_id).or_insert(0) += 1;

    let Some(children) = st.tree.children(q.parent_id) else {
        debug!(parent_id = q.parent_id, "list of unknown directory");
        return (
            StatusCode::NOT_FOUND,
            Json(ListFilesResponse::error("NotFound", "parent not found")),
        );
    };

    let files: Vec<FileObject> = children.into_iter().map(FileObject::from).collect();
    let parent = st.tree.get(q.parent_id).map(FileObject::from);
    debug!(parent_id = q.parent_id, count = files.len(), "listed directory");

    (
        StatusCode::OK,
        Json(ListFilesResponse {
            status: "OK".into(),
            files,
            parent,
            ..Default::default()
        }),
    )
}

/// GET /v2/files/:id/download?oauth_token=
///
/// Answers with a redirect to the content route, like the real API does
/// with its CDN links.
pub async fn download(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Query(q): Query<TokenQuery>,
) -> Response {
    let mut st = state.lock().unwrap();

    if q.oauth_token != st.oauth_token {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match st.tree.get(id) {
        Some(n) if n.node_type == NodeType::File => {}
        _ => return StatusCode::NOT_FOUND.into_response(),
    }

    st.download_requests += 1;
    let location = format!("{}/content/{}", st.public_url, id);
    (StatusCode::FOUND, [(header::LOCATION, location)], "redirect").into_response()
}

/// GET /content/:id
pub async fn content(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Vec<u8>, StatusCode> {
    let st = state.lock().unwrap();
    match st.tree.get(id) {
        Some(n) if n.node_type == NodeType::File => Ok(n.content.clone()),
        _ => Err(StatusCode::NOT_FOUND),
    }
}
