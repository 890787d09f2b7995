// Local image storage for avatars and category covers

use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{AppError, Result};

/// Image bytes pulled out of a multipart request
#[derive(Debug)]
pub struct UploadedImage {
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    upload_dir: PathBuf,
    public_path: String,
    max_bytes: usize,
}

impl FileStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            upload_dir: PathBuf::from(&config.upload_dir),
            public_path: config.public_path.trim_end_matches('/').to_string(),
            max_bytes: config.max_upload_bytes,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Read the first file field named `field`, enforcing the size limit while streaming.
    pub async fn read_image(&self, mut multipart: Multipart, field: &str) -> Result<UploadedImage> {
        while let Some(mut part) = multipart.next_field().await? {
            if part.name() != Some(field) {
                continue;
            }

            let content_type = part.content_type().map(str::to_string);
            let file_name = part.file_name().map(str::to_string);
            let mut bytes = Vec::new();
            while let Some(chunk) = part.chunk().await? {
                if bytes.len() + chunk.len() > self.max_bytes {
                    return Err(AppError::PayloadTooLarge(format!(
                        "Upload exceeds {} bytes",
                        self.max_bytes
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }

            if bytes.is_empty() {
                return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
            }

            return Ok(UploadedImage {
                content_type,
                file_name,
                bytes,
            });
        }

        Err(AppError::BadRequest(format!("Missing '{}' file field", field)))
    }

    /// Store the image under a fresh name and return its public URL.
    pub async fn save_image(&self, image: &UploadedImage) -> Result<String> {
        let extension = image_extension(image.content_type.as_deref(), image.file_name.as_deref())
            .ok_or_else(|| {
                AppError::BadRequest("Only png, jpeg, webp and gif images are accepted".to_string())
            })?;
        if image.bytes.len() > self.max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Upload exceeds {} bytes",
                self.max_bytes
            )));
        }

        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Cannot create upload dir: {}", e)))?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        tokio::fs::write(self.upload_dir.join(&file_name), &image.bytes)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Cannot write upload: {}", e)))?;

        tracing::info!(file = %file_name, size = image.bytes.len(), "Stored upload");

        Ok(format!("{}/{}", self.public_path, file_name))
    }

    /// Delete a previously stored file by its public URL. Unknown URLs are ignored.
    pub async fn remove(&self, url: &str) {
        let Some(path) = self.local_path(url) else {
            return;
        };
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), "Failed to remove old upload: {}", e);
        }
    }

    fn local_path(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(&self.public_path)?.strip_prefix('/')?;
        // Only bare generated names, never nested or relative paths
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return None;
        }
        Some(self.upload_dir.join(name))
    }
}

/// Extension for an accepted image type, from the content type or else the file name.
pub fn image_extension(content_type: Option<&str>, file_name: Option<&str>) -> Option<&'static str> {
    let from_mime = content_type.and_then(|mime| match mime.to_ascii_lowercase().as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    });
    if from_mime.is_some() {
        return from_mime;
    }

    let ext = file_name?.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("png"),
        "jpg" | "jpeg" => Some("jpg"),
        "webp" => Some("webp"),
        "gif" => Some("gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: &Path, max_bytes: usize) -> FileStorage {
        FileStorage::new(&StorageConfig {
            upload_dir: dir.to_string_lossy().into_owned(),
            public_path: "/uploads/".to_string(),
            max_upload_bytes: max_bytes,
        })
    }

    fn image(content_type: &str, bytes: &[u8]) -> UploadedImage {
        UploadedImage {
            content_type: Some(content_type.to_string()),
            file_name: None,
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension(Some("image/PNG"), None), Some("png"));
        assert_eq!(image_extension(Some("application/octet-stream"), Some("me.JPEG")), Some("jpg"));
        assert_eq!(image_extension(None, Some("cover.webp")), Some("webp"));
        assert_eq!(image_extension(Some("text/html"), Some("evil.svg")), None);
        assert_eq!(image_extension(None, Some("noext")), None);
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = std::env::temp_dir().join(format!("live-admin-{}", Uuid::new_v4()));
        let storage = storage(&dir, 1024);

        let url = storage.save_image(&image("image/gif", b"GIF89a")).await.unwrap();
        assert!(url.starts_with("/uploads/") && url.ends_with(".gif"));

        let stored = storage.local_path(&url).unwrap();
        assert_eq!(tokio::fs::read(&stored).await.unwrap(), b"GIF89a");

        storage.remove(&url).await;
        assert!(tokio::fs::metadata(&stored).await.is_err());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_rejects_oversized_and_unknown_types() {
        let dir = std::env::temp_dir().join(format!("live-admin-{}", Uuid::new_v4()));
        let storage = storage(&dir, 4);

        let too_big = storage.save_image(&image("image/png", b"12345")).await;
        assert!(matches!(too_big, Err(AppError::PayloadTooLarge(_))));

        let wrong_type = storage.save_image(&image("image/svg+xml", b"1")).await;
        assert!(matches!(wrong_type, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_local_path_refuses_traversal() {
        let storage = storage(Path::new("/srv/uploads"), 10);

        assert_eq!(
            storage.local_path("/uploads/abc.png"),
            Some(PathBuf::from("/srv/uploads/abc.png"))
        );
        assert_eq!(storage.local_path("/uploads/../etc/passwd"), None);
        assert_eq!(storage.local_path("/uploads/.hidden"), None);
        assert_eq!(storage.local_path("https://cdn.example.com/a.png"), None);
    }
}
