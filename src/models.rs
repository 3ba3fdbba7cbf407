//! Data models and structures
//!
//! Defines the per-invocation entities of the ingestion pipeline (payload,
//! staged target, registered asset) and the runtime configuration.

use crate::{Error, Result};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// Raster formats accepted from clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageMime {
    /// Map a data-URI subtype (`png`, `jpg`, `jpeg`, `gif`, `webp`) to a format.
    pub fn from_subtype(subtype: &str) -> Option<Self> {
        match subtype.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// File extension used when naming the upload. JPEG is shortened to `jpg`.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }
}

/// A decoded and validated client image, ready for staging.
#[derive(Debug, Clone)]
pub struct InlinePayload {
    pub mime: ImageMime,
    /// Content type exactly as declared by the client (lower-cased), e.g. `image/jpeg`.
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StagedUploadParameter {
    pub name: String,
    pub value: String,
}

/// Single-use destination issued by the platform for one blob.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTarget {
    pub url: String,
    pub resource_url: String,
    #[serde(default)]
    pub parameters: Vec<StagedUploadParameter>,
}

/// How bytes are pushed to an [`UploadTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportShape {
    /// Pre-signed URL: one `PUT` of the raw body.
    SignedPut,
    /// Form endpoint: one multipart `POST` of the staging parameters plus `file`.
    MultipartPost,
}

impl TransportShape {
    pub fn for_target(target: &UploadTarget) -> Self {
        if target.url.contains('?') {
            Self::SignedPut
        } else {
            Self::MultipartPost
        }
    }
}

/// Platform-side processing status of a registered file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileStatus {
    Uploaded,
    Processing,
    Ready,
    Failed,
    Error,
    #[serde(other)]
    Unrecognized,
}

impl FileStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed | Self::Error)
    }
}

/// A blob that the platform has accepted as a managed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredAsset {
    pub id: String,
    pub status: FileStatus,
}

// Configuration
pub const DEFAULT_API_VERSION: &str = "2024-10";
pub const DEFAULT_UPLOAD_RETRIES: u32 = 10;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
pub const DEFAULT_MAX_SIZE: usize = 5 * 1024 * 1024;
pub const DEFAULT_ALT_TEXT: &str = "Review Image";

/// Knobs for validation and polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageConfig {
    pub upload_retries: u32,
    pub retry_delay_ms: u64,
    pub max_size: usize,
    pub alt_text: String,
}

impl ImageConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            upload_retries: DEFAULT_UPLOAD_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            max_size: DEFAULT_MAX_SIZE,
            alt_text: DEFAULT_ALT_TEXT.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub shop_domain: Option<String>,
    pub access_token: String,
    pub api_version: String,
    pub images: ImageConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the process environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let images = ImageConfig {
            upload_retries: parse_or(&lookup, "IMAGE_UPLOAD_RETRIES", DEFAULT_UPLOAD_RETRIES)?,
            retry_delay_ms: parse_or(&lookup, "IMAGE_RETRY_DELAY_MS", DEFAULT_RETRY_DELAY_MS)?,
            max_size: parse_or(&lookup, "IMAGE_MAX_SIZE_BYTES", DEFAULT_MAX_SIZE)?,
            alt_text: lookup("IMAGE_ALT_TEXT").unwrap_or_else(|| DEFAULT_ALT_TEXT.to_string()),
        };

        Ok(Self {
            shop_domain: lookup("SHOPIFY_SHOP_DOMAIN").filter(|s| !s.trim().is_empty()),
            access_token: lookup("SHOPIFY_ACCESS_TOKEN")
                .ok_or_else(|| Error::Config("SHOPIFY_ACCESS_TOKEN not set".to_string()))?,
            api_version: lookup("SHOPIFY_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            images,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {} '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}
