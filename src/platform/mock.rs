use super::types::{
    CreatedFile, FileCreateInput, FileCreatePayload, FileNode, NodeImage, StagedUploadInput,
    StagedUploadsPayload,
};
use super::PlatformService;
use crate::models::{FileStatus, StagedUploadParameter, UploadTarget};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Reply<T> = std::result::Result<T, String>;

/// Scripted platform. Each operation replays its queued replies in order and
/// keeps repeating the last one once the queue is down to a single entry.
#[derive(Clone)]
pub struct MockPlatformClient {
    staged_replies: Arc<Mutex<VecDeque<Reply<StagedUploadsPayload>>>>,
    file_create_replies: Arc<Mutex<VecDeque<Reply<FileCreatePayload>>>>,
    status_replies: Arc<Mutex<VecDeque<Reply<Option<FileNode>>>>>,
    staged_inputs: Arc<Mutex<Vec<StagedUploadInput>>>,
    file_create_inputs: Arc<Mutex<Vec<FileCreateInput>>>,
    status_ids: Arc<Mutex<Vec<String>>>,
}

impl MockPlatformClient {
    pub fn new() -> Self {
        Self {
            staged_replies: Arc::new(Mutex::new(VecDeque::new())),
            file_create_replies: Arc::new(Mutex::new(VecDeque::new())),
            status_replies: Arc::new(Mutex::new(VecDeque::new())),
            staged_inputs: Arc::new(Mutex::new(Vec::new())),
            file_create_inputs: Arc::new(Mutex::new(Vec::new())),
            status_ids: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_staged_targets(self, targets: Vec<UploadTarget>) -> Self {
        self.staged_replies
            .lock()
            .unwrap()
            .push_back(Ok(StagedUploadsPayload {
                staged_targets: targets,
                user_errors: Vec::new(),
            }));
        self
    }

    pub fn with_staged_payload(self, payload: StagedUploadsPayload) -> Self {
        self.staged_replies.lock().unwrap().push_back(Ok(payload));
        self
    }

    pub fn with_staged_error(self, message: &str) -> Self {
        self.staged_replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn with_file_create_payload(self, payload: FileCreatePayload) -> Self {
        self.file_create_replies
            .lock()
            .unwrap()
            .push_back(Ok(payload));
        self
    }

    pub fn with_file_create_error(self, message: &str) -> Self {
        self.file_create_replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn with_status(self, status: FileStatus, url: Option<&str>) -> Self {
        self.status_replies
            .lock()
            .unwrap()
            .push_back(Ok(Some(Self::image_node(status, url))));
        self
    }

    pub fn with_status_node(self, node: Option<FileNode>) -> Self {
        self.status_replies.lock().unwrap().push_back(Ok(node));
        self
    }

    pub fn with_status_error(self, message: &str) -> Self {
        self.status_replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn get_staged_call_count(&self) -> usize {
        self.staged_inputs.lock().unwrap().len()
    }

    pub fn get_file_create_call_count(&self) -> usize {
        self.file_create_inputs.lock().unwrap().len()
    }

    pub fn get_status_call_count(&self) -> usize {
        self.status_ids.lock().unwrap().len()
    }

    pub fn get_total_call_count(&self) -> usize {
        self.get_staged_call_count()
            + self.get_file_create_call_count()
            + self.get_status_call_count()
    }

    pub fn get_staged_inputs(&self) -> Vec<StagedUploadInput> {
        self.staged_inputs.lock().unwrap().clone()
    }

    pub fn get_file_create_inputs(&self) -> Vec<FileCreateInput> {
        self.file_create_inputs.lock().unwrap().clone()
    }

    pub fn get_status_ids(&self) -> Vec<String> {
        self.status_ids.lock().unwrap().clone()
    }

    pub fn signed_target() -> UploadTarget {
        UploadTarget {
            url: "https://mock-storage.example.com/tmp/review-image?X-Goog-Signature=abc"
                .to_string(),
            resource_url: "https://mock-storage.example.com/tmp/review-image".to_string(),
            parameters: vec![StagedUploadParameter {
                name: "content_type".to_string(),
                value: "image/png".to_string(),
            }],
        }
    }

    pub fn image_node(status: FileStatus, url: Option<&str>) -> FileNode {
        FileNode {
            file_status: status,
            url: None,
            image: url.map(|u| NodeImage {
                original_src: Some(u.to_string()),
                url: Some(u.to_string()),
            }),
        }
    }

    fn next_reply<T: Clone>(queue: &Mutex<VecDeque<Reply<T>>>, fallback: T) -> Result<T> {
        let mut queue = queue.lock().unwrap();
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        match reply {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(Error::Platform(message)),
            None => Ok(fallback),
        }
    }
}

impl Default for MockPlatformClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformService for MockPlatformClient {
    async fn staged_uploads_create(
        &self,
        input: StagedUploadInput,
    ) -> Result<StagedUploadsPayload> {
        self.staged_inputs.lock().unwrap().push(input);
        Self::next_reply(
            &self.staged_replies,
            StagedUploadsPayload {
                staged_targets: vec![Self::signed_target()],
                user_errors: Vec::new(),
            },
        )
    }

    async fn file_create(&self, input: FileCreateInput) -> Result<FileCreatePayload> {
        self.file_create_inputs.lock().unwrap().push(input);
        Self::next_reply(
            &self.file_create_replies,
            FileCreatePayload {
                files: vec![CreatedFile {
                    id: Some("gid://shopify/MediaImage/1".to_string()),
                    file_status: FileStatus::Uploaded,
                }],
                user_errors: Vec::new(),
            },
        )
    }

    async fn file_status(&self, id: &str) -> Result<Option<FileNode>> {
        self.status_ids.lock().unwrap().push(id.to_string());
        Self::next_reply(
            &self.status_replies,
            Some(Self::image_node(
                FileStatus::Ready,
                Some("https://mock-cdn.example.com/review-image.png"),
            )),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::types::StagedUploadResource;

    fn staged_input() -> StagedUploadInput {
        StagedUploadInput {
            filename: "review-image-1.png".to_string(),
            mime_type: "image/png".to_string(),
            resource: StagedUploadResource::Image,
            file_size: "8".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_defaults_describe_happy_path() {
        let client = MockPlatformClient::new();

        let staged = client.staged_uploads_create(staged_input()).await.unwrap();
        assert_eq!(staged.staged_targets, vec![MockPlatformClient::signed_target()]);

        let node = client.file_status("gid://1").await.unwrap().unwrap();
        assert_eq!(node.file_status, FileStatus::Ready);
        assert_eq!(client.get_staged_call_count(), 1);
        assert_eq!(client.get_status_ids(), vec!["gid://1".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_replays_status_sequence_then_repeats_last() {
        let client = MockPlatformClient::new()
            .with_status(FileStatus::Uploaded, None)
            .with_status(FileStatus::Failed, None);

        let statuses = [
            client.file_status("a").await.unwrap().unwrap().file_status,
            client.file_status("a").await.unwrap().unwrap().file_status,
            client.file_status("a").await.unwrap().unwrap().file_status,
        ];
        assert_eq!(
            statuses,
            [FileStatus::Uploaded, FileStatus::Failed, FileStatus::Failed]
        );
        assert_eq!(client.get_status_call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_scripted_error() {
        let client = MockPlatformClient::new().with_staged_error("Throttled");
        let err = client.staged_uploads_create(staged_input()).await.unwrap_err();
        assert!(matches!(err, Error::Platform(ref m) if m == "Throttled"));
    }
}
