//! Commerce platform integration for staged uploads and file registration
//!
//! Wraps the three Admin GraphQL operations the ingestion pipeline needs:
//! requesting a staged upload target, registering the uploaded blob as a
//! file, and reading a file's processing status.

pub mod client;
pub mod mock;
pub mod types;

pub use client::AdminGraphqlClient;
pub use mock::MockPlatformClient;
pub use types::{
    CreatedFile, FileContentType, FileCreateInput, FileCreatePayload, FileNode, NodeImage,
    StagedUploadInput, StagedUploadResource, StagedUploadsPayload, UserError,
};

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait PlatformService: Send + Sync {
    async fn staged_uploads_create(&self, input: StagedUploadInput)
        -> Result<StagedUploadsPayload>;
    async fn file_create(&self, input: FileCreateInput) -> Result<FileCreatePayload>;
    /// `Ok(None)` when the platform resolves the id to no node.
    async fn file_status(&self, id: &str) -> Result<Option<FileNode>>;
}
