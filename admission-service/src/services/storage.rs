//! Admission photo storage.
//!
//! Photos land under `<base>/admissions/` and are served statically at
//! `/uploads/admissions/<file>`. Filenames carry a timestamp plus a random
//! suffix, so no lock is needed against collisions.

use async_trait::async_trait;
use institute_core::error::AppError;
use rand::Rng;
use std::path::PathBuf;
use tokio::fs;

const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;
const ALLOWED_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "gif"];

#[async_trait]
pub trait PhotoStorage: Send + Sync {
    async fn save(&self, key: &str, data: Vec<u8>) -> Result<(), AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self { base_path })
    }
}

#[async_trait]
impl PhotoStorage for LocalStorage {
    async fn save(&self, key: &str, data: Vec<u8>) -> Result<(), AppError> {
        let path = self.base_path.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, data).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = self.base_path.join(key);
        if path.exists() {
            fs::remove_file(path).await?;
        }
        Ok(())
    }
}

/// Validate an uploaded photo and produce its storage key.
///
/// Rejects anything that is not a jpeg/jpg/png/gif or exceeds 5 MB.
pub fn photo_storage_key(filename: &str, size: usize) -> Result<String, AppError> {
    if size > MAX_PHOTO_BYTES {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Photo too large (max 5MB)"
        )));
    }

    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Unsupported photo type (allowed: jpeg, jpg, png, gif)"
        )));
    }

    let suffix: u32 = rand::thread_rng().gen();
    Ok(format!(
        "admissions/student-{}-{}.{}",
        chrono::Utc::now().timestamp_millis(),
        suffix,
        extension
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_image_extensions() {
        let key = photo_storage_key("me.JPG", 1024).unwrap();
        assert!(key.starts_with("admissions/student-"));
        assert!(key.ends_with(".jpg"));
    }

    #[test]
    fn rejects_non_image_files() {
        assert!(photo_storage_key("notes.pdf", 1024).is_err());
        assert!(photo_storage_key("noext", 1024).is_err());
    }

    #[test]
    fn rejects_oversized_photos() {
        assert!(photo_storage_key("me.png", 6 * 1024 * 1024).is_err());
    }
}
