//! Image ingestion orchestration.
//!
//! Runs decode → stage → upload → register → poll strictly in order. Any
//! failure short-circuits the remaining stages. Callers of [`ImagePipeline::ingest`]
//! only see `Some(url)` or `None`; the distinguished error kind is logged.

use crate::models::{FileStatus, ImageConfig, InlinePayload, RegisteredAsset, UploadTarget};
use crate::payload::decode_data_uri;
use crate::platform::{
    FileContentType, FileCreateInput, PlatformService, StagedUploadInput, StagedUploadResource,
    UserError,
};
use crate::transport::{HttpTransport, UploadTransport};
use crate::{Error, Result};
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, info, info_span, warn, Instrument};

/// Owns the byte transport and the validation/polling policy. Holds no
/// per-invocation state, so one pipeline can serve concurrent calls.
pub struct ImagePipeline {
    transport: Box<dyn UploadTransport>,
    config: ImageConfig,
}

impl ImagePipeline {
    pub fn new(config: ImageConfig) -> Self {
        Self::with_transport(Box::new(HttpTransport::new()), config)
    }

    /// Build a pipeline around a specific transport (mocks in tests).
    pub fn with_transport(transport: Box<dyn UploadTransport>, config: ImageConfig) -> Self {
        Self { transport, config }
    }

    /// Ingest one data URI for `shop_domain`. Returns the public URL of the
    /// processed asset, or `None` on any failure.
    pub async fn ingest(
        &self,
        data_uri: &str,
        shop_domain: &str,
        platform: &dyn PlatformService,
    ) -> Option<String> {
        match self.try_ingest(data_uri, shop_domain, platform).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(shop = %shop_domain, kind = e.kind(), "Image ingestion failed: {}", e);
                None
            }
        }
    }

    /// Same as [`ingest`](Self::ingest) but keeps the error.
    pub async fn try_ingest(
        &self,
        data_uri: &str,
        shop_domain: &str,
        platform: &dyn PlatformService,
    ) -> Result<String> {
        let span = info_span!("image_ingest", shop = %shop_domain);
        self.run(data_uri, platform).instrument(span).await
    }

    async fn run(&self, data_uri: &str, platform: &dyn PlatformService) -> Result<String> {
        let payload = decode_data_uri(data_uri, self.config.max_size)?;
        info!(
            "Decoded {} ({} bytes, {})",
            payload.filename,
            payload.bytes.len(),
            payload.content_type
        );

        let target = self.stage(platform, &payload).await?;

        let shape = self.transport.upload(&target, &payload).await?;
        info!("Uploaded {} via {:?}", payload.filename, shape);

        let asset = self.register(platform, &target).await?;
        info!("Registered file {} ({:?})", asset.id, asset.status);

        let url = self.poll_until_ready(platform, &asset).await?;
        info!("File {} ready at {}", asset.id, url);
        Ok(url)
    }

    async fn stage(
        &self,
        platform: &dyn PlatformService,
        payload: &InlinePayload,
    ) -> Result<UploadTarget> {
        let input = StagedUploadInput {
            filename: payload.filename.clone(),
            mime_type: payload.content_type.clone(),
            resource: StagedUploadResource::Image,
            file_size: payload.bytes.len().to_string(),
        };

        let response = platform
            .staged_uploads_create(input)
            .await
            .map_err(|e| Error::StagingFailed(e.to_string()))?;

        if !response.user_errors.is_empty() {
            warn!(
                "Staged upload reported user errors: {}",
                UserError::describe(&response.user_errors)
            );
        }

        let offered = response.staged_targets.len();
        let target = response
            .staged_targets
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::StagingFailed(if response.user_errors.is_empty() {
                    "no staged targets returned".to_string()
                } else {
                    UserError::describe(&response.user_errors)
                })
            })?;

        if offered > 1 {
            debug!("Ignoring {} extra staged targets", offered - 1);
        }
        Ok(target)
    }

    async fn register(
        &self,
        platform: &dyn PlatformService,
        target: &UploadTarget,
    ) -> Result<RegisteredAsset> {
        let input = FileCreateInput {
            alt: self.config.alt_text.clone(),
            content_type: FileContentType::Image,
            original_source: target.resource_url.clone(),
        };

        let response = platform
            .file_create(input)
            .await
            .map_err(|e| Error::RegistrationFailed(e.to_string()))?;

        if !response.user_errors.is_empty() {
            warn!(
                "File registration reported user errors: {}",
                UserError::describe(&response.user_errors)
            );
        }

        let file = response
            .files
            .into_iter()
            .next()
            .ok_or_else(|| Error::RegistrationFailed("no file returned".to_string()))?;
        let id = file
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::RegistrationFailed("file returned without an id".to_string()))?;

        Ok(RegisteredAsset {
            id,
            status: file.file_status,
        })
    }

    /// Sleep, query, repeat: at most `upload_retries` queries spaced by
    /// `retry_delay_ms`, with no backoff.
    async fn poll_until_ready(
        &self,
        platform: &dyn PlatformService,
        asset: &RegisteredAsset,
    ) -> Result<String> {
        let attempts = self.config.upload_retries;
        let schedule = FixedInterval::new(self.config.retry_delay()).take(attempts as usize);

        for (attempt, delay) in schedule.enumerate() {
            tokio::time::sleep(delay).await;

            let node = platform.file_status(&asset.id).await.map_err(|e| {
                Error::AssetProcessingFailed(format!("status query failed: {}", e))
            })?;

            let Some(node) = node else {
                debug!(
                    "File {} not resolvable yet (attempt {}/{})",
                    asset.id,
                    attempt + 1,
                    attempts
                );
                continue;
            };

            match node.file_status {
                FileStatus::Ready => {
                    return node.resolved_url().ok_or_else(|| {
                        Error::AssetProcessingFailed(format!(
                            "file {} is ready but has no URL",
                            asset.id
                        ))
                    });
                }
                FileStatus::Failed | FileStatus::Error => {
                    return Err(Error::AssetProcessingFailed(format!(
                        "platform reported {:?} for file {}",
                        node.file_status, asset.id
                    )));
                }
                other => debug!(
                    "File {} still {:?} (attempt {}/{})",
                    asset.id,
                    other,
                    attempt + 1,
                    attempts
                ),
            }
        }

        Err(Error::PollingTimeout { attempts })
    }
}

/// One-shot entry point: decode, stage, upload, register and poll a single
/// review image with the default HTTP transport.
pub async fn upload_review_image(
    data_uri: &str,
    shop_domain: &str,
    platform: &dyn PlatformService,
    config: &ImageConfig,
) -> Option<String> {
    ImagePipeline::new(config.clone())
        .ingest(data_uri, shop_domain, platform)
        .await
}
