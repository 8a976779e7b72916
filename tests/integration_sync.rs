mod common;
use common::{closed_base_url, spawn_app};
use std::sync::Arc;
use std::time::Duration;

use blog_backend::blog::{BlogPatch, BlogStatus, NewBlog};
use blog_backend::BlogError;
use blog_backend::client::{
    BlogApi, FileStorage, HttpBlogApi, LocalCache, RefreshOutcome, RemoteError, SyncError,
    SyncReconciler,
};

fn reconciler(base: &str, cache_dir: &std::path::Path) -> anyhow::Result<SyncReconciler> {
    let api = HttpBlogApi::new(base, Duration::from_secs(2))?;
    let cache = LocalCache::new(FileStorage::new(cache_dir).into_arc(), "blogs");
    Ok(SyncReconciler::new(cache, Arc::new(api)))
}

fn new_blog(title: &str, content: &str) -> NewBlog {
    NewBlog {
        title: title.to_string(),
        content: content.to_string(),
        ..NewBlog::default()
    }
}

#[tokio::test]
async fn http_api_maps_server_errors() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (base, server_handle) = spawn_app(dir.path()).await?;
    let api = HttpBlogApi::new(&base, Duration::from_secs(2))?;

    let created = api.create(&new_blog("Farming Tips", "<p>word word word</p>")).await?;
    assert_eq!(created.slug, "farming-tips");
    assert_eq!((created.word_count, created.reading_time), (3, 1));
    assert_eq!(created.status, BlogStatus::Draft);

    match api.create(&new_blog("Farming Tips", "")).await {
        Err(RemoteError::Rejected { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "A blog with this slug already exists");
        }
        other => panic!("expected rejection, got {:?}", other),
    }

    let missing = api.fetch("no-such-blog").await.unwrap_err();
    assert!(missing.is_not_found());

    let patched = api
        .update(
            &created.id,
            &BlogPatch {
                thumbnail: Some(Some("data:image/png;base64,AAAA".to_string())),
                ..BlogPatch::default()
            },
        )
        .await?;
    assert_eq!(patched.thumbnail.as_deref(), Some("data:image/png;base64,AAAA"));
    assert!(patched.updated_at > created.updated_at);

    api.delete(&created.id).await?;
    assert!(api.fetch_all().await?.is_empty());

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn initialize_then_refresh_against_live_server() -> anyhow::Result<()> {
    let data = tempfile::tempdir()?;
    let cache_dir = tempfile::tempdir()?;
    let (base, server_handle) = spawn_app(data.path()).await?;
    let api = HttpBlogApi::new(&base, Duration::from_secs(2))?;
    api.create(&new_blog("Seeded", "<p>seed</p>")).await?;

    let sync = reconciler(&base, cache_dir.path())?;
    let first = sync.initialize().await;
    assert_eq!(first.len(), 1);

    // Created behind the client's back: initialize must not see it.
    api.create(&new_blog("Later", "")).await?;
    assert_eq!(sync.initialize().await.len(), 1);

    match sync.refresh().await {
        RefreshOutcome::Synced(blogs) => assert_eq!(blogs.len(), 2),
        other => panic!("expected synced refresh, got {:?}", other),
    }
    assert_eq!(sync.cache().get_all().len(), 2);

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn writes_fall_back_to_cache_when_offline() -> anyhow::Result<()> {
    let data = tempfile::tempdir()?;
    let cache_dir = tempfile::tempdir()?;
    let (base, server_handle) = spawn_app(data.path()).await?;

    let online = reconciler(&base, cache_dir.path())?;
    let saved = online.create(new_blog("Online Post", "<p>a</p>")).await?;
    assert!(!saved.is_local());

    // Same cache directory, unreachable server.
    let offline = reconciler(&closed_base_url(), cache_dir.path())?;
    let local = offline
        .create(new_blog("Offline Draft", "<p>one two</p>"))
        .await?;
    assert!(local.is_local());
    assert_eq!(local.message(), "Blog saved locally");
    assert_eq!(local.blog().word_count, 2);

    let toggled = offline.toggle_status(&saved.blog().id).await?;
    assert!(toggled.is_local());
    assert_eq!(toggled.blog().status, BlogStatus::Published);

    let err = offline
        .create(new_blog("Online Post", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Local(_)));

    match offline.refresh().await {
        RefreshOutcome::Offline(blogs) => assert_eq!(blogs.len(), 2),
        other => panic!("expected offline refresh, got {:?}", other),
    }

    // Back online: the local-only draft survives the merge.
    match online.refresh().await {
        RefreshOutcome::Synced(blogs) => {
            let slugs: Vec<&str> = blogs.iter().map(|b| b.slug.as_str()).collect();
            assert_eq!(slugs, vec!["online-post", "offline-draft"]);
            assert_eq!(blogs[0].status, BlogStatus::Draft);
        }
        other => panic!("expected synced refresh, got {:?}", other),
    }

    // The draft still exists only locally, so its slug is taken.
    let err = online
        .create(new_blog("Offline Draft", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Local(BlogError::Conflict(_))));
    assert_eq!(HttpBlogApi::new(&base, Duration::from_secs(2))?.fetch_all().await?.len(), 1);

    server_handle.abort();
    Ok(())
}
