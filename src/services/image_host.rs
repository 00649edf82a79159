//! Image hosts
//!
//! Uploaded images are stored either on local disk (served under
//! `/uploads`) or by an external image-hosting HTTP API. Callers only see
//! the [`ImageHost`] trait and keep the returned `storage_key` to delete the
//! file later.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use uuid::Uuid;

use crate::config::{ImageHostConfig, UploadConfig, UploadDriver};

/// Result of a successful store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Public URL of the file
    pub url: String,
    /// Key understood by [`ImageHost::remove`]
    pub storage_key: String,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Store `bytes` and return where they can be fetched
    async fn store(&self, bytes: &[u8], file_name: &str, mime_type: &str) -> Result<StoredImage>;

    /// Delete a stored file. Removing a file that is already gone succeeds.
    async fn remove(&self, storage_key: &str) -> Result<()>;
}

/// Build the image host selected by `upload.driver`
pub fn create_image_host(upload: &UploadConfig, remote: &ImageHostConfig) -> Result<Arc<dyn ImageHost>> {
    match upload.driver {
        UploadDriver::Local => {
            tracing::info!(path = %upload.path.display(), "Storing uploads on local disk");
            Ok(Arc::new(LocalImageHost::new(upload.path.clone(), &upload.public_base)))
        }
        UploadDriver::Remote => {
            tracing::info!(endpoint = %remote.endpoint, "Storing uploads on remote image host");
            Ok(Arc::new(RemoteImageHost::new(remote)?))
        }
    }
}

fn extension_for(file_name: &str, mime_type: &str) -> String {
    let from_mime = UploadConfig::default().get_extension(mime_type);
    if from_mime != "bin" {
        return from_mime.to_string();
    }
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_lowercase)
        .unwrap_or_else(|| "bin".to_string())
}

/// Files under a local directory, named `{uuid}.{ext}`
pub struct LocalImageHost {
    root: PathBuf,
    public_base: String,
}

impl LocalImageHost {
    pub fn new(root: PathBuf, public_base: &str) -> Self {
        Self {
            root,
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    /// Keys are bare file names; anything else could escape the upload root
    fn path_for(&self, storage_key: &str) -> Result<PathBuf> {
        let valid = !storage_key.is_empty()
            && !storage_key.starts_with('.')
            && storage_key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            anyhow::bail!("Invalid storage key: {}", storage_key);
        }
        Ok(self.root.join(storage_key))
    }
}

#[async_trait]
impl ImageHost for LocalImageHost {
    async fn store(&self, bytes: &[u8], file_name: &str, mime_type: &str) -> Result<StoredImage> {
        fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create upload directory {}", self.root.display()))?;

        let key = format!("{}.{}", Uuid::new_v4(), extension_for(file_name, mime_type));
        let path = self.path_for(&key)?;
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(StoredImage {
            url: format!("{}/{}", self.public_base, key),
            storage_key: key,
        })
    }

    async fn remove(&self, storage_key: &str) -> Result<()> {
        let path = self.path_for(storage_key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }
}

/// Upload response of the image API. Hosts differ in naming, so a few
/// aliases are accepted and an optional `data` envelope is unwrapped.
#[derive(Debug, Deserialize)]
struct RemoteUpload {
    #[serde(alias = "secure_url", alias = "link")]
    url: String,
    #[serde(alias = "id", alias = "file_id", alias = "public_id")]
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RemoteUploadBody {
    Wrapped { data: RemoteUpload },
    Plain(RemoteUpload),
}

impl RemoteUploadBody {
    fn into_inner(self) -> RemoteUpload {
        match self {
            RemoteUploadBody::Wrapped { data } => data,
            RemoteUploadBody::Plain(upload) => upload,
        }
    }
}

/// External image-hosting API.
///
/// `POST {endpoint}` with multipart fields `file` and `folder`, answered with
/// `{ "url", "key" }`; `DELETE {endpoint}/{key}` removes the file.
pub struct RemoteImageHost {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    folder: String,
}

impl RemoteImageHost {
    pub fn new(config: &ImageHostConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("Banyuanyar-CMS/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()
            .context("Failed to build image host HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            folder: config.folder.clone(),
        })
    }

    fn delete_url(&self, storage_key: &str) -> String {
        format!("{}/{}", self.endpoint, urlencoding::encode(storage_key))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl ImageHost for RemoteImageHost {
    async fn store(&self, bytes: &[u8], file_name: &str, mime_type: &str) -> Result<StoredImage> {
        let part = reqwest::multipart::Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .context("Invalid MIME type for upload")?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("folder", self.folder.clone());

        let response = self
            .authorize(self.client.post(&self.endpoint))
            .multipart(form)
            .send()
            .await
            .context("Image host upload request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Image host rejected upload: {} {}", status, body.trim());
        }

        let upload = response
            .json::<RemoteUploadBody>()
            .await
            .context("Unexpected image host response")?
            .into_inner();

        Ok(StoredImage {
            url: upload.url,
            storage_key: upload.key,
        })
    }

    async fn remove(&self, storage_key: &str) -> Result<()> {
        let response = self
            .authorize(self.client.delete(self.delete_url(storage_key)))
            .send()
            .await
            .context("Image host delete request failed")?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        anyhow::bail!("Image host refused delete of {}: {}", storage_key, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_store_and_remove() {
        let dir = TempDir::new().unwrap();
        let host = LocalImageHost::new(dir.path().join("uploads"), "/uploads/");

        let stored = host.store(b"\x89PNG", "Sawah.PNG", "image/png").await.unwrap();
        assert!(stored.storage_key.ends_with(".png"));
        assert_eq!(stored.url, format!("/uploads/{}", stored.storage_key));

        let path = dir.path().join("uploads").join(&stored.storage_key);
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG");

        host.remove(&stored.storage_key).await.unwrap();
        assert!(!path.exists());
        // already gone
        host.remove(&stored.storage_key).await.unwrap();
    }

    #[tokio::test]
    async fn test_local_rejects_path_keys() {
        let dir = TempDir::new().unwrap();
        let host = LocalImageHost::new(dir.path().to_path_buf(), "/uploads");
        assert!(host.remove("../config.yml").await.is_err());
        assert!(host.remove("a/b.png").await.is_err());
        assert!(host.remove("").await.is_err());
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("foto.jpeg", "image/jpeg"), "jpg");
        assert_eq!(extension_for("peta.TIFF", "image/tiff"), "tiff");
        assert_eq!(extension_for("noext", "application/octet-stream"), "bin");
    }

    #[test]
    fn test_remote_response_shapes() {
        let plain: RemoteUploadBody =
            serde_json::from_str(r#"{"url":"https://img.example/a.jpg","key":"a1"}"#).unwrap();
        assert_eq!(plain.into_inner().key, "a1");

        let wrapped: RemoteUploadBody =
            serde_json::from_str(r#"{"data":{"link":"https://img.example/b.jpg","id":"b2"}}"#).unwrap();
        let upload = wrapped.into_inner();
        assert_eq!(upload.url, "https://img.example/b.jpg");
        assert_eq!(upload.key, "b2");
    }

    #[test]
    fn test_remote_delete_url_encodes_key() {
        let config = ImageHostConfig {
            endpoint: "https://img.example/v1/files/".to_string(),
            ..Default::default()
        };
        let host = RemoteImageHost::new(&config).unwrap();
        assert_eq!(host.delete_url("desa/foto 1"), "https://img.example/v1/files/desa%2Ffoto%201");
    }

    #[test]
    fn test_create_image_host_local_default() {
        let host = create_image_host(&UploadConfig::default(), &ImageHostConfig::default());
        assert!(host.is_ok());
    }
}
