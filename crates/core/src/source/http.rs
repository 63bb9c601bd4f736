use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::error::PatchError;
use crate::model::{Diff, PatchKey};
use crate::source::{classify_status, PatchSource};

/// Patch store served over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpPatchSource {
    base: Url,
    client: Client,
}

impl HttpPatchSource {
    /// Create a source rooted at `base_url`. A trailing slash is added if
    /// missing so relative keys resolve beneath it.
    pub fn new(base_url: &str) -> Result<Self, String> {
        let normalized =
            if base_url.ends_with('/') { base_url.to_string() } else { format!("{base_url}/") };
        let base = Url::parse(&normalized).map_err(|e| format!("invalid base URL '{base_url}': {e}"))?;
        let client = Client::builder()
            .build()
            .map_err(|e| format!("failed to initialize HTTP client: {e}"))?;
        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for `key`. Target locations that are already absolute
    /// URLs are used unchanged.
    pub fn url_for(&self, key: &PatchKey) -> Result<Url, PatchError> {
        let rel = key.resource_path();
        if let Ok(absolute) = Url::parse(&rel) {
            return Ok(absolute);
        }
        self.base.join(&rel).map_err(|e| PatchError::Transport {
            key: key.to_string(),
            status: None,
            message: format!("invalid patch URL: {e}"),
        })
    }
}

#[async_trait]
impl PatchSource for HttpPatchSource {
    async fn fetch(&self, key: &PatchKey) -> Result<Diff, PatchError> {
        let url = self.url_for(key)?;
        tracing::info!(%key, %url, "downloading patch");

        let transport = |e: reqwest::Error| PatchError::Transport {
            key: key.to_string(),
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        classify_status(key, response.status().as_u16())?;
        let bytes = response.bytes().await.map_err(transport)?;
        tracing::debug!(%key, len = bytes.len(), "patch downloaded");
        Diff::parse(key, bytes.to_vec())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
