//! Error handling and custom error types
//!
//! Provides unified error handling across the ingestion pipeline using thiserror.
//! The pipeline boundary collapses every variant to "no image", but the kind is
//! kept internally so it can be logged.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid image payload: {0}")]
    InvalidFormat(String),

    #[error("Image payload too large: {size} bytes exceeds limit of {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Staged upload failed: {0}")]
    StagingFailed(String),

    #[error("Upload transport failed: {0}")]
    UploadTransportFailed(String),

    #[error("Asset registration failed: {0}")]
    RegistrationFailed(String),

    #[error("Asset still processing after {attempts} status checks")]
    PollingTimeout { attempts: u32 },

    #[error("Asset processing failed: {0}")]
    AssetProcessingFailed(String),

    #[error("Platform API error: {0}")]
    Platform(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidFormat(_) => "invalid_format",
            Error::PayloadTooLarge { .. } => "payload_too_large",
            Error::StagingFailed(_) => "staging_failed",
            Error::UploadTransportFailed(_) => "upload_transport_failed",
            Error::RegistrationFailed(_) => "registration_failed",
            Error::PollingTimeout { .. } => "polling_timeout",
            Error::AssetProcessingFailed(_) => "asset_processing_failed",
            Error::Platform(_) => "platform",
            Error::Serialization(_) => "serialization",
            Error::Http(_) => "http",
            Error::Config(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_too_large_message_includes_sizes() {
        let err = Error::PayloadTooLarge {
            size: 2048,
            max: 1024,
        };
        let message = err.to_string();
        assert!(message.contains("2048"));
        assert!(message.contains("1024"));
        assert_eq!(err.kind(), "payload_too_large");
    }

    #[test]
    fn test_serde_error_converts() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = parse_err.into();
        assert_eq!(err.kind(), "serialization");
    }
}
