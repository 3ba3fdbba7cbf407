//! Request and response contracts for the Admin GraphQL operations.
//!
//! Fields the pipeline depends on are non-optional, so a response that does
//! not match the expected shape fails to decode instead of being read as
//! "absent".

use crate::models::{FileStatus, UploadTarget};
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Envelope sent to the GraphQL endpoint.
#[derive(Debug, Serialize)]
pub struct GraphqlRequest<'a, V> {
    pub query: &'a str,
    pub variables: V,
    #[serde(rename = "operationName")]
    pub operation_name: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

/// Envelope returned by the GraphQL endpoint.
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<GraphqlError>,
}

impl<T> GraphqlResponse<T> {
    /// Top-level `errors` win over any partial `data`.
    pub fn into_data(self) -> Result<T> {
        if !self.errors.is_empty() {
            let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(Error::Platform(messages.join("; ")));
        }
        self.data
            .ok_or_else(|| Error::Platform("GraphQL response carried no data".to_string()))
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

impl UserError {
    pub fn describe(errors: &[UserError]) -> String {
        errors
            .iter()
            .map(|e| match &e.field {
                Some(field) if !field.is_empty() => format!("{}: {}", field.join("."), e.message),
                _ => e.message.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// stagedUploadsCreate

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StagedUploadResource {
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedUploadInput {
    pub filename: String,
    pub mime_type: String,
    pub resource: StagedUploadResource,
    /// The platform expects the size as a decimal string.
    pub file_size: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedUploadsPayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub staged_targets: Vec<UploadTarget>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
pub struct StagedUploadsCreateData {
    #[serde(rename = "stagedUploadsCreate")]
    pub staged_uploads_create: StagedUploadsPayload,
}

// fileCreate

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileContentType {
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCreateInput {
    pub alt: String,
    pub content_type: FileContentType,
    pub original_source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedFile {
    #[serde(default)]
    pub id: Option<String>,
    pub file_status: FileStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCreatePayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<CreatedFile>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
pub struct FileCreateData {
    #[serde(rename = "fileCreate")]
    pub file_create: FileCreatePayload,
}

// node(id:) status query

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeImage {
    #[serde(default)]
    pub original_src: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Either a generic file (`fileStatus`, `url`) or a media image
/// (`fileStatus`, `image { originalSrc url }`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub file_status: FileStatus,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image: Option<NodeImage>,
}

impl FileNode {
    /// Prefer the image's original source, then the image URL, then the generic file URL.
    /// `image.url` covers API versions that leave `originalSrc` unset.
    pub fn resolved_url(&self) -> Option<String> {
        let image = self.image.as_ref();
        [
            image.and_then(|i| i.original_src.as_deref()),
            image.and_then(|i| i.url.as_deref()),
            self.url.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|url| !url.is_empty())
        .map(str::to_string)
    }
}

#[derive(Debug, Deserialize)]
pub struct FileStatusData {
    pub node: Option<FileNode>,
}
