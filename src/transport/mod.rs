//! Byte transport to staged upload targets
//!
//! Pushes a validated payload to the single-use target issued by the
//! platform, using a signed `PUT` or a multipart `POST` depending on the
//! target URL.

pub mod client;
pub mod mock;

pub use client::HttpTransport;
pub use mock::{MockTransport, RecordedUpload};

use crate::models::{InlinePayload, TransportShape, UploadTarget};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Perform exactly one request against `target`. Returns the shape used.
    async fn upload(&self, target: &UploadTarget, payload: &InlinePayload)
        -> Result<TransportShape>;
}
