//! Metadata loader: binds a source to a decodable element and reads its
//! duration and dimensions.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{DeviceProfile, SourceVideo, VideoMetadata};
use crate::domain::rules::MetadataPolicy;
use crate::engine::cancel::CancelToken;
use crate::engine::signal::{race_signal, with_cancel, SignalOutcome};
use crate::ports::{MediaPort, ObjectUrl, VideoElement};

/// Revokes its object URL exactly once, when dropped
pub struct ObjectUrlGuard {
    media: Arc<dyn MediaPort>,
    url: Option<ObjectUrl>,
}

impl ObjectUrlGuard {
    pub fn new(media: Arc<dyn MediaPort>, url: ObjectUrl) -> Self {
        Self {
            media,
            url: Some(url),
        }
    }

    pub fn url(&self) -> Option<&ObjectUrl> {
        self.url.as_ref()
    }
}

impl Drop for ObjectUrlGuard {
    fn drop(&mut self) {
        if let Some(url) = self.url.take() {
            debug!(%url, "Revoking object URL");
            self.media.revoke_object_url(&url);
        }
    }
}

/// A source bound to an element with sanitized metadata.
///
/// Field order matters: the element is released before its URL.
pub struct LoadedVideo {
    pub element: Box<dyn VideoElement>,
    pub metadata: VideoMetadata,
    _url: ObjectUrlGuard,
}

/// Loads sources into decodable elements
pub struct MetadataLoader {
    media: Arc<dyn MediaPort>,
    policy: MetadataPolicy,
}

impl MetadataLoader {
    pub fn new(media: Arc<dyn MediaPort>, policy: MetadataPolicy) -> Self {
        Self { media, policy }
    }

    /// Load `source` and wait for its metadata.
    ///
    /// A timeout falls back to whatever the element already reports; only
    /// an element that reports nothing at all fails.
    pub async fn load(
        &self,
        source: &SourceVideo,
        profile: &DeviceProfile,
        cancel: &CancelToken,
    ) -> Result<LoadedVideo, DomainError> {
        cancel.check()?;
        let guard = ObjectUrlGuard::new(
            Arc::clone(&self.media),
            self.media.create_object_url(source),
        );
        let url = guard
            .url()
            .cloned()
            .ok_or_else(|| DomainError::MetadataLoad("object URL missing".to_string()))?;

        let mut element = with_cancel(self.media.open_element(&url), cancel)
            .await?
            .map_err(as_metadata_error)?;

        let timeout = self.policy.timeout(profile, source);
        let raw = match race_signal(element.loaded_metadata(), timeout, cancel).await? {
            SignalOutcome::Signaled(Ok(metadata)) => metadata,
            SignalOutcome::Signaled(Err(err)) => return Err(as_metadata_error(err)),
            SignalOutcome::TimedOut => match element.metadata_snapshot() {
                Some(metadata) => {
                    warn!(
                        timeout_ms = timeout.as_millis() as u64,
                        "Metadata event never fired, using element snapshot"
                    );
                    metadata
                }
                None => {
                    return Err(DomainError::MetadataLoad(format!(
                        "no metadata after {}ms",
                        timeout.as_millis()
                    )))
                }
            },
        };

        let duration = MetadataPolicy::sanitize_duration(raw.duration, source);
        if duration != raw.duration {
            warn!(
                reported = raw.duration,
                estimated = duration,
                "Element reported an unusable duration, estimating from size"
            );
        }

        let metadata = VideoMetadata {
            duration,
            width: raw.width,
            height: raw.height,
        };
        debug!(?metadata, "Loaded metadata");

        Ok(LoadedVideo {
            element,
            metadata,
            _url: guard,
        })
    }
}

fn as_metadata_error(err: DomainError) -> DomainError {
    match err {
        DomainError::MetadataLoad(_) | DomainError::Cancelled => err,
        other => DomainError::MetadataLoad(other.to_string()),
    }
}
