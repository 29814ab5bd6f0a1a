//! ============================================================================
//! Image Upload - Persist user photos on the external image host
//! ============================================================================
//! Photos never go to the ZeroBin API directly. They are pushed to an
//! ImgBB-compatible host as base64 form data and the returned public URL is
//! what the API receives.
//! ============================================================================

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::config::ClientConfig;
use crate::error::ApiError;

/// Largest image accepted for upload (10 MiB)
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// An image the user picked, held in memory until upload
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl SelectedImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ApiError> {
        let file_name = file_name.into();
        if bytes.is_empty() {
            return Err(ApiError::Invalid(format!("{} is empty", file_name)));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ApiError::Invalid(format!(
                "{} is {} bytes, limit is {}",
                file_name,
                bytes.len(),
                MAX_IMAGE_BYTES
            )));
        }
        Ok(Self { file_name, bytes })
    }

    /// Read an image from disk
    pub async fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.jpg".to_string());
        Ok(Self::new(file_name, bytes)?)
    }

    /// `data:` URL for an inline preview
    pub fn preview_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(&self.bytes))
    }

    pub fn mime_type(&self) -> &'static str {
        let lower = self.file_name.to_ascii_lowercase();
        if lower.ends_with(".png") {
            "image/png"
        } else if lower.ends_with(".webp") {
            "image/webp"
        } else if lower.ends_with(".gif") {
            "image/gif"
        } else {
            "image/jpeg"
        }
    }
}

/// Anything that can turn a selected image into a public URL
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload(&self, image: &SelectedImage) -> Result<String, ApiError>;
}

/// Uploader for an ImgBB-compatible host
pub struct ImageHostUploader {
    client: reqwest::Client,
    upload_url: String,
    api_key: Option<String>,
}

impl ImageHostUploader {
    pub fn new(upload_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url: upload_url.into(),
            api_key,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            upload_url: config.image_host_url.clone(),
            api_key: config.image_host_key.clone(),
        }
    }
}

#[async_trait]
impl ImageUploader for ImageHostUploader {
    async fn upload(&self, image: &SelectedImage) -> Result<String, ApiError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ApiError::Upload("image host key not configured".to_string()))?;

        info!("Uploading {} ({} bytes)", image.file_name, image.bytes.len());

        let encoded = STANDARD.encode(&image.bytes);
        let response = self
            .client
            .post(&self.upload_url)
            .query(&[("key", key)])
            .form(&[("image", encoded.as_str()), ("name", image.file_name.as_str())])
            .send()
            .await
            .map_err(|e| ApiError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Upload(format!(
                "image host error {}: {}",
                status,
                crate::error::snippet(&body)
            )));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Upload(format!("unreadable image host response: {}", e)))?;

        let url = parsed
            .data
            .and_then(|d| d.display_url.or(d.url))
            .ok_or_else(|| ApiError::Upload("image host returned no URL".to_string()))?;

        info!("Uploaded {} -> {}", image.file_name, url);
        Ok(url)
    }
}

// ============================================================================
// Image host response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: Option<UploadData>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: Option<String>,
    display_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::{serve, Canned};

    #[test]
    fn test_selected_image_limits() {
        assert!(SelectedImage::new("a.jpg", Vec::new()).is_err());
        assert!(SelectedImage::new("a.jpg", vec![0; MAX_IMAGE_BYTES + 1]).is_err());
        let img = SelectedImage::new("Bin.PNG", vec![1, 2, 3]).unwrap();
        assert_eq!(img.mime_type(), "image/png");
        assert_eq!(img.preview_data_url(), "data:image/png;base64,AQID");
    }

    #[tokio::test]
    async fn test_upload_without_key_fails() {
        let uploader = ImageHostUploader::new("http://127.0.0.1:9/upload", None);
        let img = SelectedImage::new("a.jpg", vec![1]).unwrap();
        let err = uploader.upload(&img).await.unwrap_err();
        assert!(matches!(err, ApiError::Upload(_)));
    }

    #[tokio::test]
    async fn test_upload_returns_url() {
        let (base, rx) = serve(vec![Canned::json(
            200,
            r#"{"data":{"url":"https://i.host/abc.jpg"},"success":true,"status":200}"#,
        )]);
        let uploader = ImageHostUploader::new(format!("{}/1/upload", base), Some("k3y".into()));
        let img = SelectedImage::new("bin.jpg", vec![1, 2, 3]).unwrap();

        let url = uploader.upload(&img).await.unwrap();
        assert_eq!(url, "https://i.host/abc.jpg");

        let recorded = rx.recv().unwrap();
        assert_eq!(recorded.url, "/1/upload?key=k3y");
        assert!(recorded.body.contains("image=AQID"));
    }

    #[tokio::test]
    async fn test_upload_host_error() {
        let (base, _rx) = serve(vec![Canned::json(400, r#"{"error":"bad key"}"#)]);
        let uploader = ImageHostUploader::new(base, Some("k".into()));
        let img = SelectedImage::new("bin.jpg", vec![9]).unwrap();
        let err = uploader.upload(&img).await.unwrap_err();
        assert!(err.to_string().contains("400"));
    }
}
