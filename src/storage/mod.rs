//! Object storage keys for product images
//!
//! The server only reserves keys and computes public URLs. Clients upload
//! the bytes straight to the storage provider.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Deserialize, Validate)]
pub struct ReserveUploadRequest {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UploadSlot {
    pub key: String,
    pub public_url: String,
}

/// Lowercased extension of `file_name`, if it is an accepted image type
pub fn image_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.trim().rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// `{user_id}/{random}.{ext}`
pub fn object_key(user_id: Uuid, extension: &str) -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}/{}.{}", user_id, hex::encode(bytes), extension)
}

#[derive(Debug, Clone)]
pub struct StorageService {
    public_url: String,
    bucket: String,
}

impl StorageService {
    pub fn new(public_url: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.storage_public_url, &config.storage_bucket)
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_url, self.bucket, key)
    }

    pub fn reserve_product_image(
        &self,
        user_id: Uuid,
        file_name: &str,
    ) -> crate::error::ApiResult<UploadSlot> {
        let extension = image_extension(file_name).ok_or_else(|| {
            crate::error::ApiError::ValidationError(format!(
                "Unsupported image type for '{}', expected one of: {}",
                file_name,
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })?;

        let key = object_key(user_id, &extension);
        let public_url = self.public_url(&key);

        tracing::debug!(user_id = %user_id, key = %key, "Reserved product image upload");

        Ok(UploadSlot { key, public_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("Photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(image_extension("a.b.webp").as_deref(), Some("webp"));
        assert_eq!(image_extension("notes.txt"), None);
        assert_eq!(image_extension("noext"), None);
        assert_eq!(image_extension(".png"), None);
    }

    #[test]
    fn test_object_keys_are_scoped_and_unique() {
        let user = Uuid::new_v4();
        let a = object_key(user, "png");
        let b = object_key(user, "png");

        assert!(a.starts_with(&format!("{}/", user)));
        assert!(a.ends_with(".png"));
        assert_eq!(a.len(), user.to_string().len() + 1 + 32 + 4);
        assert_ne!(a, b);
    }

    #[test]
    fn test_public_url_joins_bucket_and_key() {
        let storage = StorageService::new("http://cdn.test/public/", "product-images");
        assert_eq!(
            storage.public_url("u/abc.png"),
            "http://cdn.test/public/product-images/u/abc.png"
        );
    }

    #[test]
    fn test_reserve_rejects_non_images() {
        let storage = StorageService::new("http://cdn.test", "bucket");
        assert!(storage
            .reserve_product_image(Uuid::new_v4(), "malware.exe")
            .is_err());

        let slot = storage
            .reserve_product_image(Uuid::new_v4(), "tractor.jpeg")
            .unwrap();
        assert!(slot.public_url.ends_with(&slot.key));
    }
}
