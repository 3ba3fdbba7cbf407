use super::UploadTransport;
use crate::models::{InlinePayload, TransportShape, UploadTarget};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// One upload observed by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    pub shape: TransportShape,
    pub url: String,
    /// Multipart field names in send order; empty for `PUT`.
    pub fields: Vec<String>,
    pub content_type: String,
    pub byte_len: usize,
}

#[derive(Clone)]
pub struct MockTransport {
    uploads: Arc<Mutex<Vec<RecordedUpload>>>,
    fail_with_status: Option<u16>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            uploads: Arc::new(Mutex::new(Vec::new())),
            fail_with_status: None,
        }
    }

    /// Reject every upload as if the storage endpoint answered `status`.
    pub fn failing_with_status(mut self, status: u16) -> Self {
        self.fail_with_status = Some(status);
        self
    }

    pub fn get_upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn get_uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UploadTransport for MockTransport {
    async fn upload(
        &self,
        target: &UploadTarget,
        payload: &InlinePayload,
    ) -> Result<TransportShape> {
        let shape = TransportShape::for_target(target);
        let fields = match shape {
            TransportShape::SignedPut => Vec::new(),
            TransportShape::MultipartPost => target
                .parameters
                .iter()
                .map(|p| p.name.clone())
                .chain(std::iter::once("file".to_string()))
                .collect(),
        };

        self.uploads.lock().unwrap().push(RecordedUpload {
            shape,
            url: target.url.clone(),
            fields,
            content_type: payload.content_type.clone(),
            byte_len: payload.bytes.len(),
        });

        match self.fail_with_status {
            Some(status) => Err(Error::UploadTransportFailed(format!(
                "{:?} rejected with status {}",
                shape, status
            ))),
            None => Ok(shape),
        }
    }
}
