use std::path::Path;
use tokio::net::TcpListener;

use blog_backend::db::FileBlogRepository;
use blog_backend::{create_app, AppState};

/// Serve the app over a JSON file store on an ephemeral port.
pub async fn spawn_app(data_dir: &Path) -> anyhow::Result<(String, tokio::task::JoinHandle<()>)> {
    let repo = FileBlogRepository::new(data_dir.join("blogs.json"));
    let app = create_app(AppState::from_repository(repo));
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server error");
    });
    Ok((format!("http://{}", addr), server_handle))
}

/// Base URL of a port nothing listens on.
#[allow(dead_code)]
pub fn closed_base_url() -> String {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .expect("ephemeral port");
    format!("http://127.0.0.1:{}", port)
}
