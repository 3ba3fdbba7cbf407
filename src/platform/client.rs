use super::types::{
    FileCreateData, FileCreateInput, FileCreatePayload, FileNode, FileStatusData,
    GraphqlRequest, GraphqlResponse, StagedUploadInput, StagedUploadsCreateData,
    StagedUploadsPayload,
};
use super::PlatformService;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const STAGED_UPLOADS_CREATE: &str = r#"
mutation stagedUploadsCreate($input: [StagedUploadInput!]!) {
  stagedUploadsCreate(input: $input) {
    stagedTargets {
      url
      resourceUrl
      parameters {
        name
        value
      }
    }
    userErrors {
      field
      message
    }
  }
}"#;

const FILE_CREATE: &str = r#"
mutation fileCreate($files: [FileCreateInput!]!) {
  fileCreate(files: $files) {
    files {
      id
      fileStatus
    }
    userErrors {
      field
      message
    }
  }
}"#;

const FILE_STATUS: &str = r#"
query fileStatus($id: ID!) {
  node(id: $id) {
    ... on GenericFile {
      fileStatus
      url
    }
    ... on MediaImage {
      fileStatus
      image {
        originalSrc
        url
      }
    }
  }
}"#;

/// Admin GraphQL client authenticated with an already-issued access token.
pub struct AdminGraphqlClient {
    client: Client,
    endpoint: String,
    access_token: String,
    timeout: Duration,
}

impl AdminGraphqlClient {
    pub fn new(shop_domain: &str, access_token: String, api_version: &str) -> Self {
        Self::new_with_client(shop_domain, access_token, api_version, Client::new())
    }

    pub fn new_with_client(
        shop_domain: &str,
        access_token: String,
        api_version: &str,
        client: Client,
    ) -> Self {
        let host = shop_domain
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');

        Self {
            client,
            endpoint: format!("https://{}/admin/api/{}/graphql.json", host, api_version),
            access_token,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Point the client at a different GraphQL URL (proxies, local harnesses).
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute<V: Serialize, T: DeserializeOwned>(
        &self,
        operation_name: &str,
        query: &str,
        variables: V,
    ) -> Result<T> {
        let request = GraphqlRequest {
            query,
            variables,
            operation_name,
        };

        tracing::debug!("Sending {} to {}", operation_name, self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send {} request: {}", operation_name, e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!(
                "Platform API error on {} (status {}): {}",
                operation_name,
                status,
                error_text
            );
            return Err(Error::Platform(format!(
                "{} failed (status {}): {}",
                operation_name, status, error_text
            )));
        }

        let body = response.text().await?;
        let envelope: GraphqlResponse<T> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                "Failed to parse {} response: {}\nBody: {}",
                operation_name,
                e,
                body
            );
            e
        })?;
        envelope.into_data()
    }
}

#[async_trait]
impl PlatformService for AdminGraphqlClient {
    async fn staged_uploads_create(
        &self,
        input: StagedUploadInput,
    ) -> Result<StagedUploadsPayload> {
        let data: StagedUploadsCreateData = self
            .execute(
                "stagedUploadsCreate",
                STAGED_UPLOADS_CREATE,
                json!({ "input": [input] }),
            )
            .await?;
        Ok(data.staged_uploads_create)
    }

    async fn file_create(&self, input: FileCreateInput) -> Result<FileCreatePayload> {
        let data: FileCreateData = self
            .execute("fileCreate", FILE_CREATE, json!({ "files": [input] }))
            .await?;
        Ok(data.file_create)
    }

    async fn file_status(&self, id: &str) -> Result<Option<FileNode>> {
        let data: FileStatusData = self
            .execute("fileStatus", FILE_STATUS, json!({ "id": id }))
            .await?;
        Ok(data.node)
    }
}
