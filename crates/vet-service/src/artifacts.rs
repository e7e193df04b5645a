//! Artifact locations and remote download.
//!
//! The index, content file and manifest are each either a local path or an
//! `http(s)` URL. Remote artifacts are fetched once at startup into a cache
//! directory; any failure is fatal to initialization.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use crate::error::InitError;

/// Where an artifact lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    Local(PathBuf),
    Remote(String),
}

impl ArtifactSource {
    /// `http://` and `https://` locations are remote, everything else a path.
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            ArtifactSource::Remote(trimmed.to_string())
        } else {
            ArtifactSource::Local(PathBuf::from(trimmed))
        }
    }

    pub fn location(&self) -> String {
        match self {
            ArtifactSource::Local(path) => path.display().to_string(),
            ArtifactSource::Remote(url) => url.clone(),
        }
    }

    /// File name to use when caching a download.
    fn cache_name(&self, fallback: &str) -> String {
        let ArtifactSource::Remote(url) = self else {
            return fallback.to_string();
        };
        let path = url.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/')
            .next()
            .filter(|name| !name.is_empty() && !name.contains(':'))
            .unwrap_or(fallback)
            .to_string()
    }
}

/// Resolves artifact sources to local files.
pub struct ArtifactFetcher {
    client: Client,
    cache_dir: PathBuf,
}

impl ArtifactFetcher {
    pub fn new(cache_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self, InitError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InitError::Config(e.to_string()))?;
        Ok(Self {
            client,
            cache_dir: cache_dir.into(),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Return a local path for `source`, downloading it when remote.
    ///
    /// `fallback_name` names the cached file when the URL has no usable file
    /// name. Distinct artifacts must use distinct fallbacks.
    pub async fn resolve(
        &self,
        source: &ArtifactSource,
        fallback_name: &str,
    ) -> Result<PathBuf, InitError> {
        match source {
            ArtifactSource::Local(path) => {
                if path.is_file() {
                    Ok(path.clone())
                } else {
                    Err(InitError::Artifact {
                        location: path.display().to_string(),
                        reason: "file not found".to_string(),
                    })
                }
            }
            ArtifactSource::Remote(url) => {
                let target = self.cache_dir.join(source.cache_name(fallback_name));
                self.download(url, &target).await?;
                Ok(target)
            }
        }
    }

    async fn download(&self, url: &str, target: &Path) -> Result<(), InitError> {
        let fail = |reason: String| InitError::Download {
            url: url.to_string(),
            reason,
        };

        debug!(url = %url, "Downloading artifact");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP {}", status)));
        }

        let bytes = response.bytes().await.map_err(|e| fail(e.to_string()))?;

        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| fail(format!("cannot create {}: {}", self.cache_dir.display(), e)))?;

        // The final name only ever holds a complete file
        let partial = target.with_extension("part");
        tokio::fs::write(&partial, &bytes)
            .await
            .map_err(|e| fail(format!("cannot write {}: {}", partial.display(), e)))?;
        tokio::fs::rename(&partial, target)
            .await
            .map_err(|e| fail(format!("cannot write {}: {}", target.display(), e)))?;

        info!(url = %url, path = ?target, bytes = bytes.len(), "Downloaded artifact");
        Ok(())
    }
}
