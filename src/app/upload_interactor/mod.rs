// Upload interactor - Hands a finished video to the analysis backend

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub file_name: String,
    pub public_url: String,
    /// Trim record pointing at the uploaded video
    pub parameters: TrimParameters,
}

/// Interactor for the upload use case
pub struct UploadInteractor {
    upload_port: Arc<dyn UploadPort>,
    status_port: Arc<dyn StatusPort>,
}

impl UploadInteractor {
    /// Create new upload interactor with injected ports
    pub fn new(upload_port: Arc<dyn UploadPort>, status_port: Arc<dyn StatusPort>) -> Self {
        Self {
            upload_port,
            status_port,
        }
    }

    /// Upload `video` as the result of trimming to `range`.
    ///
    /// Upload failures are returned as-is; nothing is retried.
    pub async fn upload(
        &self,
        video: &OutputVideo,
        range: TrimRange,
    ) -> Result<UploadReceipt, DomainError> {
        self.upload_at(video, range, Utc::now()).await
    }

    /// Same as [`upload`](Self::upload) with an explicit timestamp for the
    /// generated file name
    pub async fn upload_at(
        &self,
        video: &OutputVideo,
        range: TrimRange,
        now: DateTime<Utc>,
    ) -> Result<UploadReceipt, DomainError> {
        if video.is_empty() {
            return Err(DomainError::Upload("refusing to upload an empty video".to_string()));
        }

        let file_name = upload_file_name(video, now);
        let metadata = json!({
            "startTime": range.start,
            "endTime": range.end,
            "duration": range.span(),
            "size": video.len(),
        });

        let target = self
            .upload_port
            .request_upload_target(&file_name, video.mime_type(), &metadata)
            .await?;
        self.upload_port.put(&target.upload_url, video).await?;
        info!(%file_name, public_url = %target.public_url, bytes = video.len(), "Video uploaded");

        let parameters = TrimParameters {
            video_url: target.public_url.clone(),
            start_time: range.start,
            end_time: range.end,
            duration: range.span(),
        };
        Ok(UploadReceipt {
            file_name,
            public_url: target.public_url,
            parameters,
        })
    }

    /// One processing-status check for an uploaded file
    pub async fn status(&self, file_name: &str) -> Result<ProcessingStatus, DomainError> {
        if file_name.trim().is_empty() {
            return Err(DomainError::BadArgs("file name cannot be empty".to_string()));
        }
        self.status_port.check_status(file_name).await
    }
}

/// `swing_<utc timestamp>.<ext>`, with the extension taken from the MIME type
pub fn upload_file_name(video: &OutputVideo, now: DateTime<Utc>) -> String {
    format!(
        "swing_{}.{}",
        now.format("%Y%m%dT%H%M%S%3fZ"),
        video.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    #[derive(Default)]
    struct RecordingBackend {
        requests: Mutex<Vec<(String, String, serde_json::Value)>>,
        puts: Mutex<Vec<(String, String, usize)>>,
        fail_put: bool,
    }

    #[async_trait]
    impl UploadPort for RecordingBackend {
        async fn request_upload_target(
            &self,
            filename: &str,
            content_type: &str,
            metadata: &serde_json::Value,
        ) -> Result<UploadTarget, DomainError> {
            self.requests.lock().unwrap().push((
                filename.to_string(),
                content_type.to_string(),
                metadata.clone(),
            ));
            Ok(UploadTarget {
                upload_url: format!("https://storage.test/put/{}", filename),
                public_url: format!("https://cdn.test/{}", filename),
            })
        }

        async fn put(&self, upload_url: &str, video: &OutputVideo) -> Result<(), DomainError> {
            if self.fail_put {
                return Err(DomainError::Upload("HTTP 403".to_string()));
            }
            self.puts.lock().unwrap().push((
                upload_url.to_string(),
                video.mime_type().to_string(),
                video.len(),
            ));
            Ok(())
        }
    }

    #[async_trait]
    impl StatusPort for RecordingBackend {
        async fn check_status(&self, _file_name: &str) -> Result<ProcessingStatus, DomainError> {
            Ok(ProcessingStatus {
                exists: true,
                public_url: Some("https://cdn.test/result.json".to_string()),
                error: None,
            })
        }
    }

    fn interactor(backend: Arc<RecordingBackend>) -> UploadInteractor {
        UploadInteractor::new(
            Arc::clone(&backend) as Arc<dyn UploadPort>,
            backend as Arc<dyn StatusPort>,
        )
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_file_name_uses_mime_extension() {
        let webm = VideoBlob::new(vec![0u8; 4], "video/webm;codecs=vp9");
        assert_eq!(upload_file_name(&webm, fixed_time()), "swing_20240309T140507000Z.webm");

        let mp4 = VideoBlob::new(vec![0u8; 4], "video/mp4");
        assert!(upload_file_name(&mp4, fixed_time()).ends_with(".mp4"));
    }

    #[tokio::test]
    async fn test_upload_requests_target_then_puts() {
        let backend = Arc::new(RecordingBackend::default());
        let video = VideoBlob::new(vec![7u8; 2048], "video/webm");
        let range = TrimRange { start: 2.0, end: 9.0 };

        let receipt = interactor(Arc::clone(&backend))
            .upload_at(&video, range, fixed_time())
            .await
            .unwrap();

        assert_eq!(receipt.file_name, "swing_20240309T140507000Z.webm");
        assert_eq!(receipt.public_url, "https://cdn.test/swing_20240309T140507000Z.webm");
        assert_eq!(receipt.parameters.video_url, receipt.public_url);
        assert_eq!(receipt.parameters.duration, 7.0);

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1, "video/webm");
        assert_eq!(requests[0].2["startTime"], 2.0);
        assert_eq!(requests[0].2["size"], 2048);

        let puts = backend.puts.lock().unwrap();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].1, "video/webm");
        assert_eq!(puts[0].2, 2048);
    }

    #[tokio::test]
    async fn test_put_failure_propagates() {
        let backend = Arc::new(RecordingBackend {
            fail_put: true,
            ..Default::default()
        });
        let video = VideoBlob::new(vec![1u8; 10], "video/webm");
        let result = interactor(backend)
            .upload(&video, TrimRange { start: 0.0, end: 1.0 })
            .await;
        assert!(matches!(result, Err(DomainError::Upload(_))));
    }

    #[tokio::test]
    async fn test_status_rejects_empty_name() {
        let backend = Arc::new(RecordingBackend::default());
        let interactor = interactor(backend);
        assert!(matches!(interactor.status(" ").await, Err(DomainError::BadArgs(_))));
        assert!(interactor.status("swing_1.webm").await.unwrap().exists);
    }
}
