use crate::{
    config::StorageConfig,
    error::{ParalonError, Result},
    models::ImageReference,
};
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Per-download ceiling for fetching remote image URLs.
const DOWNLOAD_TIMEOUT_SECS: u64 = 30;

/// Persists image references and inbound uploads under the two storage
/// roots. Every file gets a fresh uuid-based name, so concurrent requests
/// never collide on the filesystem.
#[derive(Clone)]
pub struct ImageStore {
    client: Client,
    upload_dir: PathBuf,
    generated_dir: PathBuf,
}

impl ImageStore {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()
            .map_err(|e| ParalonError::TransportError(e.to_string()))?;

        Ok(Self {
            client,
            upload_dir: PathBuf::from(&config.upload_dir),
            generated_dir: PathBuf::from(&config.generated_dir),
        })
    }

    /// Generated outputs always get a `.png` name, even when the remote API
    /// hands back bytes in another encoding. Callers rely on the extension,
    /// so it stays fixed.
    pub fn fresh_png_name() -> String {
        format!("{}.png", Uuid::new_v4())
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn generated_dir(&self) -> &Path {
        &self.generated_dir
    }

    /// Resolves a reference into bytes (downloading a Url, decoding inline
    /// data) and writes them to `dest`, creating parent directories as
    /// needed. Decoding happens before anything touches the filesystem, so
    /// a malformed payload never leaves a partial file behind.
    pub async fn save(&self, reference: &ImageReference, dest: &Path) -> Result<()> {
        let bytes = match reference {
            ImageReference::Url(url) => self.fetch(url).await?,
            ImageReference::InlineData(b64) => general_purpose::STANDARD
                .decode(b64)
                .map_err(|e| ParalonError::DecodeError(format!("invalid base64 image: {}", e)))?,
        };

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    ParalonError::IoError(format!(
                        "failed to create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        tokio::fs::write(dest, &bytes).await.map_err(|e| {
            ParalonError::IoError(format!("failed to write {}: {}", dest.display(), e))
        })?;

        log::debug!("Saved image to {}", dest.display());
        Ok(())
    }

    /// Persists one generated reference under the generated root and
    /// returns the fresh filename.
    pub async fn save_generated(&self, reference: &ImageReference) -> Result<String> {
        let filename = Self::fresh_png_name();
        self.save(reference, &self.generated_dir.join(&filename))
            .await?;
        Ok(filename)
    }

    /// Writes already-produced bytes (e.g. post-processor output) under the
    /// generated root.
    pub async fn save_generated_bytes(&self, bytes: &[u8]) -> Result<String> {
        let filename = Self::fresh_png_name();
        let dest = self.generated_dir.join(&filename);
        tokio::fs::create_dir_all(&self.generated_dir).await?;
        tokio::fs::write(&dest, bytes).await.map_err(|e| {
            ParalonError::IoError(format!("failed to write {}: {}", dest.display(), e))
        })?;
        Ok(filename)
    }

    /// Saves an inbound upload under the uploads root with a uuid-prefixed
    /// name and returns the full path.
    pub async fn save_upload(&self, original_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self
            .upload_dir
            .join(format!("{}_{}", Uuid::new_v4(), original_name));
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            ParalonError::IoError(format!("failed to write {}: {}", path.display(), e))
        })?;
        Ok(path)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await.map_err(|e| {
            ParalonError::TransportError(format!("failed to download {}: {}", url, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ParalonError::TransportError(format!(
                "failed to download {}: HTTP {}",
                url, status
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            ParalonError::TransportError(format!("failed to download {}: {}", url, e))
        })?;
        Ok(bytes.to_vec())
    }
}
