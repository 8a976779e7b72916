mod common;
use common::spawn_app;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn blog_crud_over_http() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (base, server_handle) = spawn_app(dir.path()).await?;
    let client = reqwest::Client::new();

    // create without slug
    let create = client
        .post(format!("{}/api/blogs", base))
        .json(&json!({"title": "Farming Tips", "content": "<p>word word word</p>", "category": "Agriculture"}))
        .send()
        .await?;
    assert_eq!(create.status(), StatusCode::CREATED);
    let created: Value = create.json().await?;
    assert_eq!(created["success"], true);
    let blog = &created["blog"];
    assert_eq!(blog["slug"], "farming-tips");
    assert_eq!(blog["wordCount"], 3);
    assert_eq!(blog["readingTime"], 1);
    assert_eq!(blog["status"], "draft");
    assert_eq!(blog["createdAt"], blog["updatedAt"]);
    let id = blog["id"].as_str().unwrap().to_string();

    // duplicate slug
    let dup = client
        .post(format!("{}/api/blogs", base))
        .json(&json!({"title": "Farming  Tips!"}))
        .send()
        .await?;
    assert_eq!(dup.status(), StatusCode::BAD_REQUEST);
    let err: Value = dup.json().await?;
    assert_eq!(err["error"], "A blog with this slug already exists");

    // get by id and by slug
    for key in [id.as_str(), "farming-tips"] {
        let one = client.get(format!("{}/api/blogs/{}", base, key)).send().await?;
        assert_eq!(one.status(), StatusCode::OK);
    }

    // update content recomputes stats
    let upd = client
        .put(format!("{}/api/blogs/{}", base, id))
        .json(&json!({"content": "<p>one two three four five</p>", "status": "published"}))
        .send()
        .await?;
    assert_eq!(upd.status(), StatusCode::OK);
    let updated: Value = upd.json().await?;
    assert_eq!(updated["blog"]["wordCount"], 5);
    assert_ne!(updated["blog"]["updatedAt"], blog["updatedAt"]);

    // public surface sees the published post
    let public: Value = client
        .get(format!("{}/api/public/blogs?category=Agriculture", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(public["blogs"].as_array().map(|b| b.len()), Some(1));
    let categories: Value = client
        .get(format!("{}/api/public/categories", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(categories["categories"], json!(["Agriculture"]));

    // delete
    let del = client.delete(format!("{}/api/blogs/{}", base, id)).send().await?;
    assert_eq!(del.status(), StatusCode::OK);
    let del_body: Value = del.json().await?;
    assert_eq!(del_body["success"], true);
    let gone = client.get(format!("{}/api/blogs/{}", base, id)).send().await?;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    server_handle.abort();
    Ok(())
}

#[tokio::test]
async fn blogs_survive_a_restart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let client = reqwest::Client::new();

    let (base, first) = spawn_app(dir.path()).await?;
    let res = client
        .post(format!("{}/api/blogs", base))
        .json(&json!({"title": "Persistent"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    first.abort();

    let (base, second) = spawn_app(dir.path()).await?;
    let list: Value = client.get(format!("{}/api/blogs", base)).send().await?.json().await?;
    assert_eq!(list["blogs"][0]["slug"], "persistent");

    let drafts: Value = client
        .get(format!("{}/api/blogs?status=published", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(drafts["blogs"].as_array().map(|b| b.len()), Some(0));

    second.abort();
    Ok(())
}
