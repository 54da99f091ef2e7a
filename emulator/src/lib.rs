//! In-memory emulator of the put.io file endpoints.
//!
//! Serves just enough of the v2 API for the client: directory listings by
//! parent id and redirect-based downloads. Counts requests so tests can
//! assert how often each directory was listed.

use axum::{routing::get, Router};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod tree;

pub use tree::{NodeType, RemoteTree};

/// Shared emulator state across API handlers.
#[derive(Debug)]
pub struct EmulatorState {
    pub tree: RemoteTree,
    pub oauth_token: String,
    /// Scheme and authority that download redirects point at.
    pub public_url: String,
    /// Number of list calls per parent id.
    pub list_requests: HashMap<u64, usize>,
    pub download_requests: usize,
}

impl EmulatorState {
    pub fn new(tree: RemoteTree, oauth_token: impl Into<String>) -> Self {
        EmulatorState {
            tree,
            oauth_token: oauth_token.into(),
            public_url: String::new(),
            list_requests: HashMap::new(),
            download_requests: 0,
        }
    }
}

pub type SharedState = Arc<Mutex<EmulatorState>>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/v2/files/list", get(tree::list))
        .route("/v2/files/:id/download", get(tree::download))
        .route("/content/:id", get(tree::content))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Serves the emulator on `listener` until the task is dropped.
pub async fn serve(listener: TcpListener, state: SharedState) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    {
        let mut st = state.lock().unwrap();
        if st.public_url.is_empty() {
            st.public_url = format!("http://{}", addr);
        }
    }
    info!("put.io emulator listening on {}", addr);
    axum::serve(listener, router(state).into_make_service()).await?;
    Ok(())
}

/// An emulator running on an ephemeral localhost port.
pub struct RunningEmulator {
    pub addr: SocketAddr,
    pub state: SharedState,
    task: tokio::task::JoinHandle<()>,
}

impl RunningEmulator {
    pub async fn start(tree: RemoteTree, oauth_token: &str) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let mut st = EmulatorState::new(tree, oauth_token);
        st.public_url = format!("http://{}", addr);
        let state: SharedState = Arc::new(Mutex::new(st));

        let serve_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            if let Err(e) = serve(listener, serve_state).await {
                tracing::warn!("emulator stopped: {}", e);
            }
        });

        Ok(RunningEmulator { addr, state, task })
    }

    /// Base url to configure the client with.
    pub fn api_url(&self) -> String {
        format!("http://{}/v2", self.addr)
    }

    pub fn list_requests(&self, parent_id: u64) -> usize {
        let st = self.state.lock().unwrap();
        st.list_requests.get(&parent_id).copied().unwrap_or(0)
    }

    pub fn total_list_requests(&self) -> usize {
        self.state.lock().unwrap().list_requests.values().sum()
    }

    pub fn download_requests(&self) -> usize {
        self.state.lock().unwrap().download_requests
    }
}

impl Drop for RunningEmulator {
    fn drop(&mut self) {
        self.task.abort();
    }
}
