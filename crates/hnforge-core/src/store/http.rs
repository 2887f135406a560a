use super::{content_digest, public_url, AssetStore, StoredObject};
use crate::error::StoreError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

/// HTTP `PUT` store (S3-compatible gateways, presigning proxies)
///
/// Objects are written to `{endpoint}/{path}` and served from
/// `{public_base_url}/{path}`.
#[derive(Debug, Clone)]
pub struct HttpStore {
    http: reqwest::Client,
    endpoint: String,
    public_base_url: String,
    token: Option<String>,
}

impl HttpStore {
    /// Create store writing to `endpoint`, serving from `public_base_url`
    #[must_use]
    pub fn new(endpoint: impl Into<String>, public_base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            public_base_url: public_base_url.into(),
            token: None,
        }
    }

    /// With bearer token sent on every write
    #[inline]
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// With a preconfigured HTTP client
    #[inline]
    #[must_use]
    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }
}

#[async_trait]
impl AssetStore for HttpStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StoreError> {
        let digest = content_digest(&bytes);
        let mut request = self
            .http
            .put(public_url(&self.endpoint, path))
            .header(CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Http {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(StoredObject {
            path: path.to_string(),
            url: public_url(&self.public_base_url, path),
            digest,
        })
    }
}
