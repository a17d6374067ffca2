use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::UploadConfig;

/// Content types accepted for listing images
pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

const DEFAULT_EXTENSION: &str = ".jpg";

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Invalid file type. Only JPEG, PNG, and WebP images are allowed.")]
    UnsupportedType(String),

    #[error("File too large. Maximum size is {}MB.", .max / (1024 * 1024))]
    TooLarge { size: usize, max: usize },

    #[error("Image not found")]
    NotFound(String),

    #[error("Invalid image name: {0}")]
    InvalidName(String),

    #[error("Failed to access upload storage: {0}")]
    Io(#[from] std::io::Error),
}

/// An uploaded file as received from a client
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// A file that now exists under the upload directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredImage {
    pub filename: String,
    pub url: String,
}

/// Image assets on local disk, addressed by generated unique filenames
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    public_prefix: String,
    max_bytes: usize,
}

impl ImageStore {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            public_prefix: config.public_prefix.trim_end_matches('/').to_string(),
            max_bytes: config.max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn ensure_dir(&self) -> Result<(), AssetError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Validate and persist an upload. The file only appears under its final
    /// name once fully written.
    pub async fn store(&self, upload: &ImageUpload) -> Result<StoredImage, AssetError> {
        self.check(upload)?;

        let filename = format!("{}{}", Uuid::new_v4(), extension_for(upload.file_name.as_deref()));
        let final_path = self.dir.join(&filename);
        let temp_path = self.dir.join(format!(".{}.part", filename));

        if let Err(e) = tokio::fs::write(&temp_path, &upload.bytes).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&temp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        info!("Stored image {} ({} bytes)", filename, upload.bytes.len());
        Ok(StoredImage {
            url: self.url_for(&filename),
            filename,
        })
    }

    /// Delete a stored asset by its generated name
    pub async fn remove(&self, filename: &str) -> Result<(), AssetError> {
        validate_filename(filename)?;

        match tokio::fs::remove_file(self.dir.join(filename)).await {
            Ok(()) => {
                info!("Removed image {}", filename);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AssetError::NotFound(filename.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the asset behind a listing's image reference. References that
    /// point outside the upload prefix (external URLs) are left alone.
    pub async fn remove_url(&self, url: &str) -> Result<(), AssetError> {
        match self.filename_from_url(url) {
            Some(filename) => self.remove(filename).await,
            None => {
                debug!("Image reference '{}' is not a managed asset", url);
                Ok(())
            }
        }
    }

    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{}", self.public_prefix, filename)
    }

    pub fn filename_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.public_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty())
    }

    fn check(&self, upload: &ImageUpload) -> Result<(), AssetError> {
        let content_type = upload
            .content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
            .unwrap_or_default();

        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(AssetError::UnsupportedType(content_type));
        }

        if upload.bytes.len() > self.max_bytes {
            return Err(AssetError::TooLarge {
                size: upload.bytes.len(),
                max: self.max_bytes,
            });
        }

        Ok(())
    }
}

/// Lowercased original extension, `.jpg` when absent or unusual
fn extension_for(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

fn validate_filename(filename: &str) -> Result<(), AssetError> {
    let bad = filename.is_empty()
        || filename.starts_with('.')
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..");
    if bad {
        return Err(AssetError::InvalidName(filename.to_string()));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Fresh upload directory under the system temp dir
    pub(crate) fn temp_upload_dir() -> PathBuf {
        std::env::temp_dir().join(format!("car-market-test-{}", Uuid::new_v4().simple()))
    }

    pub(crate) fn png(bytes: &[u8]) -> ImageUpload {
        ImageUpload {
            bytes: bytes.to_vec(),
            content_type: Some("image/png".to_string()),
            file_name: Some("photo.PNG".to_string()),
        }
    }

    async fn store() -> ImageStore {
        let store = ImageStore::new(&UploadConfig {
            dir: temp_upload_dir(),
            public_prefix: "/uploads".to_string(),
            max_bytes: 16,
        });
        store.ensure_dir().await.unwrap();
        store
    }

    #[test]
    fn extension_defaults_and_normalizes() {
        assert_eq!(extension_for(Some("car.JPEG")), ".jpeg");
        assert_eq!(extension_for(Some("car")), ".jpg");
        assert_eq!(extension_for(None), ".jpg");
        assert_eq!(extension_for(Some("car.p$g")), ".jpg");
    }

    #[test]
    fn filenames_cannot_escape_upload_dir() {
        assert!(validate_filename("abc.jpg").is_ok());
        for bad in ["", "../etc/passwd", "a/b.jpg", ".hidden", "a\\b.png"] {
            assert!(matches!(validate_filename(bad), Err(AssetError::InvalidName(_))), "{bad}");
        }
    }

    #[tokio::test]
    async fn store_writes_file_with_unique_name() {
        let store = store().await;
        let first = store.store(&png(b"abc")).await.unwrap();
        let second = store.store(&png(b"abc")).await.unwrap();

        assert_ne!(first.filename, second.filename);
        assert!(first.filename.ends_with(".png"));
        assert_eq!(first.url, format!("/uploads/{}", first.filename));
        assert_eq!(tokio::fs::read(store.dir().join(&first.filename)).await.unwrap(), b"abc");

        // No temp files left behind
        let mut entries = tokio::fs::read_dir(store.dir()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            assert!(!entry.file_name().to_string_lossy().starts_with('.'));
        }
    }

    #[tokio::test]
    async fn store_rejects_bad_type_and_size() {
        let store = store().await;

        let gif = ImageUpload {
            content_type: Some("image/gif".to_string()),
            ..png(b"abc")
        };
        assert!(matches!(store.store(&gif).await, Err(AssetError::UnsupportedType(_))));

        let untyped = ImageUpload {
            content_type: None,
            ..png(b"abc")
        };
        assert!(matches!(store.store(&untyped).await, Err(AssetError::UnsupportedType(_))));

        let big = png(&[0u8; 17]);
        assert!(matches!(store.store(&big).await, Err(AssetError::TooLarge { size: 17, max: 16 })));

        let exact = png(&[0u8; 16]);
        assert!(store.store(&exact).await.is_ok());
    }

    #[tokio::test]
    async fn remove_reports_missing_files() {
        let store = store().await;
        let stored = store.store(&png(b"abc")).await.unwrap();

        store.remove(&stored.filename).await.unwrap();
        assert!(!store.dir().join(&stored.filename).exists());
        assert!(matches!(store.remove(&stored.filename).await, Err(AssetError::NotFound(_))));
    }

    #[tokio::test]
    async fn remove_url_ignores_external_references() {
        let store = store().await;
        assert!(store.remove_url("https://cdn.example.com/car.jpg").await.is_ok());
        assert!(store.remove_url("").await.is_ok());

        let stored = store.store(&png(b"abc")).await.unwrap();
        assert_eq!(store.filename_from_url(&stored.url), Some(stored.filename.as_str()));
        store.remove_url(&stored.url).await.unwrap();
        assert!(!store.dir().join(&stored.filename).exists());
    }

    #[test]
    fn too_large_message_names_limit_in_megabytes() {
        let err = AssetError::TooLarge {
            size: 6 * 1024 * 1024,
            max: 5 * 1024 * 1024,
        };
        assert_eq!(err.to_string(), "File too large. Maximum size is 5MB.");
    }
}
