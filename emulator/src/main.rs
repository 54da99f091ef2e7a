use putfs_emulator::{serve, EmulatorState, RemoteTree, SharedState};
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};
use tokio::net::TcpListener;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pretty logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let addr: SocketAddr = std::env::var("PUTFS_EMULATOR_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;
    let token = std::env::var("PUTFS_EMULATOR_TOKEN").unwrap_or_else(|_| "oauth".to_string());

    let state: SharedState = Arc::new(Mutex::new(EmulatorState::new(demo_tree()?, token)));

    let listener = TcpListener::bind(addr).await?;
    serve(listener, state).await
}

/// readme.txt, movies/trailer.mp4 and music/albums/track01.mp3.
fn demo_tree() -> anyhow::Result<RemoteTree> {
    let mut tree = RemoteTree::default();
    tree.add_file(0, "readme.txt", b"welcome to the put.io emulator\n")?;

    let movies = tree.add_dir(0, "movies")?;
    tree.add_file(movies, "trailer.mp4", &[0u8; 4096])?;

    let music = tree.add_dir(0, "music")?;
    let albums = tree.add_dir(music, "albums")?;
    tree.add_file(albums, "track01.mp3", &[1u8; 2048])?;

    Ok(tree)
}
