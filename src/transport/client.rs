use super::UploadTransport;
use crate::models::{InlinePayload, TransportShape, UploadTarget};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::new_with_client(Client::new())
    }

    pub fn new_with_client(client: Client) -> Self {
        Self {
            client,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn multipart_form(target: &UploadTarget, payload: &InlinePayload) -> Result<Form> {
        let form = target
            .parameters
            .iter()
            .fold(Form::new(), |form, param| {
                form.text(param.name.clone(), param.value.clone())
            });

        let file = Part::bytes(payload.bytes.clone())
            .file_name(payload.filename.clone())
            .mime_str(&payload.content_type)
            .map_err(|e| {
                Error::UploadTransportFailed(format!(
                    "invalid content type '{}': {}",
                    payload.content_type, e
                ))
            })?;

        Ok(form.part("file", file))
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn upload(
        &self,
        target: &UploadTarget,
        payload: &InlinePayload,
    ) -> Result<TransportShape> {
        let shape = TransportShape::for_target(target);

        let request = match shape {
            TransportShape::SignedPut => self
                .client
                .put(&target.url)
                .header(CONTENT_TYPE, &payload.content_type)
                .body(payload.bytes.clone()),
            TransportShape::MultipartPost => self
                .client
                .post(&target.url)
                .multipart(Self::multipart_form(target, payload)?),
        };

        tracing::debug!(
            "Uploading {} ({} bytes) via {:?}",
            payload.filename,
            payload.bytes.len(),
            shape
        );

        let response = request.timeout(self.timeout).send().await.map_err(|e| {
            tracing::error!("Failed to send upload request: {}", e);
            Error::UploadTransportFailed(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Upload rejected (status {}): {}", status, error_text);
            return Err(Error::UploadTransportFailed(format!(
                "{:?} rejected with status {}",
                shape, status
            )));
        }

        Ok(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageMime, StagedUploadParameter};
    use wiremock::matchers::{body_bytes, header, header_regex, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG_BYTES: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn payload() -> InlinePayload {
        InlinePayload {
            mime: ImageMime::Png,
            content_type: "image/png".to_string(),
            bytes: PNG_BYTES.to_vec(),
            filename: "review-image-1700000000000.png".to_string(),
        }
    }

    fn form_target(server: &MockServer) -> UploadTarget {
        UploadTarget {
            url: format!("{}/form-upload", server.uri()),
            resource_url: format!("{}/tmp/1", server.uri()),
            parameters: vec![
                StagedUploadParameter {
                    name: "key".to_string(),
                    value: "tmp/1/review.png".to_string(),
                },
                StagedUploadParameter {
                    name: "policy".to_string(),
                    value: "cG9saWN5".to_string(),
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_signed_url_uses_put_with_content_type() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/signed-upload"))
            .and(query_param("X-Goog-Signature", "abc"))
            .and(header("content-type", "image/png"))
            .and(body_bytes(PNG_BYTES.to_vec()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let target = UploadTarget {
            url: format!("{}/signed-upload?X-Goog-Signature=abc", server.uri()),
            resource_url: format!("{}/signed-upload", server.uri()),
            parameters: Vec::new(),
        };

        let shape = HttpTransport::new()
            .upload(&target, &payload())
            .await
            .unwrap();
        assert_eq!(shape, TransportShape::SignedPut);
    }

    #[tokio::test]
    async fn test_form_url_uses_multipart_post_in_parameter_order() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/form-upload"))
            .and(header_regex("content-type", "^multipart/form-data"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let shape = HttpTransport::new()
            .upload(&form_target(&server), &payload())
            .await
            .unwrap();
        assert_eq!(shape, TransportShape::MultipartPost);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body = String::from_utf8_lossy(&requests[0].body);

        let key_at = body.find("name=\"key\"").expect("key field");
        let policy_at = body.find("name=\"policy\"").expect("policy field");
        let file_at = body.find("name=\"file\"").expect("file field");
        assert!(key_at < policy_at && policy_at < file_at);
        assert!(body.contains("filename=\"review-image-1700000000000.png\""));
        assert!(body.to_ascii_lowercase().contains("content-type: image/png"));
        assert!(body.contains("tmp/1/review.png"));
    }

    #[tokio::test]
    async fn test_rejected_upload_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/form-upload"))
            .respond_with(ResponseTemplate::new(403).set_body_string("policy expired"))
            .expect(1)
            .mount(&server)
            .await;

        let err = HttpTransport::new()
            .upload(&form_target(&server), &payload())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UploadTransportFailed(_)));
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn test_slow_storage_times_out_as_transport_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/form-upload"))
            .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_millis(500)))
            .expect(1)
            .mount(&server)
            .await;

        let err = HttpTransport::new()
            .with_timeout(Duration::from_millis(50))
            .upload(&form_target(&server), &payload())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UploadTransportFailed(_)));
    }
}
