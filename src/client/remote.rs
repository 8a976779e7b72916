/**
 * Remote blog API capability
 * The sync layer only talks to the server through `BlogApi`
 */
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::blog::{Blog, BlogPatch, NewBlog};
use crate::error::ErrorResponse;
use crate::routes::blog::{BlogListResponse, BlogResponse};

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The request never produced a response (offline, DNS, timeout).
    #[error("server unreachable: {0}")]
    Unreachable(String),
    /// 5xx from the server.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    /// 4xx: the server understood and refused the request.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Protocol(String),
}

impl RemoteError {
    /// Whether a write may fall back to the local cache. Explicit
    /// rejections (bad input, duplicate slug) must reach the user instead.
    pub fn allows_local_fallback(&self) -> bool {
        !matches!(self, RemoteError::Rejected { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::Rejected { status: 404, .. })
    }
}

#[async_trait]
pub trait BlogApi: Send + Sync + 'static {
    async fn fetch_all(&self) -> Result<Vec<Blog>, RemoteError>;
    async fn fetch(&self, id_or_slug: &str) -> Result<Blog, RemoteError>;
    async fn create(&self, input: &NewBlog) -> Result<Blog, RemoteError>;
    async fn update(&self, id: &str, patch: &BlogPatch) -> Result<Blog, RemoteError>;
    async fn delete(&self, id: &str) -> Result<(), RemoteError>;
}

pub type DynBlogApi = Arc<dyn BlogApi>;

/// `BlogApi` over the JSON HTTP routes
pub struct HttpBlogApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBlogApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let raw = base_url.into();
        let base_url = Url::parse(&raw)
            .map_err(|e| RemoteError::Protocol(format!("invalid API base '{}': {}", raw, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::Protocol(format!("invalid API base '{}'", raw)));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Protocol(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    /// `{base}/api/blogs`, plus `key` as one percent-encoded path segment.
    fn url(&self, key: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "blogs"]);
            if let Some(key) = key {
                segments.push(key);
            }
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Unreachable(e.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Unreachable(e.to_string()))?;

        if status.is_success() {
            return serde_json::from_slice(&bytes).map_err(|e| RemoteError::Protocol(e.to_string()));
        }

        let message = serde_json::from_slice::<ErrorResponse>(&bytes)
            .map(|body| body.error)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("request failed").to_string());
        tracing::debug!(status = %status, message = %message, "blog API returned an error");

        if status.is_server_error() {
            Err(RemoteError::Server {
                status: status.as_u16(),
                message,
            })
        } else {
            Err(RemoteError::Rejected {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[derive(serde::Deserialize)]
struct Ack {
    success: bool,
}

#[async_trait]
impl BlogApi for HttpBlogApi {
    async fn fetch_all(&self) -> Result<Vec<Blog>, RemoteError> {
        let body: BlogListResponse = self.send(self.client.get(self.url(None))).await?;
        if !body.success {
            return Err(RemoteError::Protocol("list response without success".to_string()));
        }
        Ok(body.blogs)
    }

    async fn fetch(&self, id_or_slug: &str) -> Result<Blog, RemoteError> {
        let body: BlogResponse = self
            .send(self.client.get(self.url(Some(id_or_slug))))
            .await?;
        Ok(body.blog)
    }

    async fn create(&self, input: &NewBlog) -> Result<Blog, RemoteError> {
        let body: BlogResponse = self.send(self.client.post(self.url(None)).json(input)).await?;
        Ok(body.blog)
    }

    async fn update(&self, id: &str, patch: &BlogPatch) -> Result<Blog, RemoteError> {
        let body: BlogResponse = self
            .send(self.client.put(self.url(Some(id))).json(patch))
            .await?;
        Ok(body.blog)
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let ack: Ack = self
            .send(self.client.delete(self.url(Some(id))))
            .await?;
        if ack.success {
            Ok(())
        } else {
            Err(RemoteError::Protocol("delete not acknowledged".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_policy() {
        assert!(RemoteError::Unreachable("refused".into()).allows_local_fallback());
        assert!(RemoteError::Server {
            status: 500,
            message: "x".into()
        }
        .allows_local_fallback());
        let rejected = RemoteError::Rejected {
            status: 400,
            message: "A blog with this slug already exists".into(),
        };
        assert!(!rejected.allows_local_fallback());
        assert!(!rejected.is_not_found());
        assert!(RemoteError::Rejected {
            status: 404,
            message: "Blog not found".into()
        }
        .is_not_found());
    }

    #[test]
    fn test_urls_are_built_from_the_base() {
        let api = HttpBlogApi::new("http://localhost:3001/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.url(None).as_str(), "http://localhost:3001/api/blogs");
        assert_eq!(api.url(Some("abc")).as_str(), "http://localhost:3001/api/blogs/abc");

        let prefixed = HttpBlogApi::new("http://localhost:3001/blog", Duration::from_secs(1)).unwrap();
        assert_eq!(prefixed.url(Some("abc")).as_str(), "http://localhost:3001/blog/api/blogs/abc");
    }

    #[test]
    fn test_keys_are_a_single_encoded_segment() {
        let api = HttpBlogApi::new("http://localhost:3001", Duration::from_secs(1)).unwrap();
        let url = api.url(Some("a?b/c#d"));
        assert_eq!(url.as_str(), "http://localhost:3001/api/blogs/a%3Fb%2Fc%23d");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_invalid_base_is_rejected() {
        assert!(matches!(
            HttpBlogApi::new("not a url", Duration::from_secs(1)),
            Err(RemoteError::Protocol(_))
        ));
        assert!(HttpBlogApi::new("mailto:someone@example.com", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let api = HttpBlogApi::new(format!("http://127.0.0.1:{}", port), Duration::from_millis(500))
            .unwrap();
        assert!(matches!(
            api.fetch_all().await,
            Err(RemoteError::Unreachable(_))
        ));
    }
}
