use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A file written to one of the public directories.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: String,
    pub path: PathBuf,
    pub url: String,
}

/// Local disk storage for uploaded photos and rendered results.
///
/// Files are named by a random UUID and served back under `/uploads/<name>`
/// and `/results/<name>`. Nothing is ever deleted.
pub struct LocalStorage {
    upload_dir: PathBuf,
    results_dir: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub fn new(upload_dir: &Path, results_dir: &Path, public_base_url: &str) -> Self {
        Self {
            upload_dir: upload_dir.to_path_buf(),
            results_dir: results_dir.to_path_buf(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create both directories if they are missing.
    pub async fn ensure_dirs(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::create_dir_all(&self.results_dir).await?;
        Ok(())
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Persist an uploaded photo.
    pub async fn save_upload(&self, data: &[u8], extension: &str) -> Result<StoredFile, StorageError> {
        self.write(&self.upload_dir, "uploads", data, extension).await
    }

    /// Persist a rendered result image.
    pub async fn save_result(&self, data: &[u8], extension: &str) -> Result<StoredFile, StorageError> {
        self.write(&self.results_dir, "results", data, extension).await
    }

    async fn write(
        &self,
        dir: &Path,
        route: &str,
        data: &[u8],
        extension: &str,
    ) -> Result<StoredFile, StorageError> {
        let name = format!("{}.{}", Uuid::new_v4(), extension);
        let path = dir.join(&name);
        tokio::fs::write(&path, data).await?;

        tracing::debug!(path = %path.display(), bytes = data.len(), "Stored file");

        Ok(StoredFile {
            url: format!("{}/{}/{}", self.public_base_url, route, name),
            name,
            path,
        })
    }
}

/// File extension for an image payload, falling back to the declared content type.
pub fn image_extension(data: &[u8], content_type: &str) -> &'static str {
    if let Ok(format) = image::guess_format(data) {
        if let Some(ext) = format.extensions_str().first() {
            return *ext;
        }
    }
    match content_type {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/heic" => "heic",
        _ => "jpg",
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Local storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
