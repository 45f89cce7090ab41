// Y4M media adapter - Reference decoder/encoder backend over YUV4MPEG2 streams

pub mod element;
pub mod encoder;
pub mod format;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

pub use element::Y4mElement;
pub use encoder::Y4mEncoderSession;
pub use format::{Y4mVideo, Y4mWriter, Y4M_MIME};

/// Formats this backend can encode
pub const SUPPORTED_MIME_TYPES: [&str; 1] = [Y4M_MIME];

/// Media backend decoding and encoding Y4M in process
pub struct Y4mMediaAdapter {
    objects: Mutex<HashMap<ObjectUrl, SourceVideo>>,
    next_id: AtomicU64,
}

impl Y4mMediaAdapter {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Object URLs created and not yet revoked
    pub fn live_object_urls(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    fn lookup(&self, url: &ObjectUrl) -> Result<SourceVideo, DomainError> {
        let objects = self
            .objects
            .lock()
            .map_err(|_| DomainError::Decode("Object registry poisoned".to_string()))?;
        objects
            .get(url)
            .cloned()
            .ok_or_else(|| DomainError::Decode(format!("Unknown object URL: {}", url)))
    }
}

impl Default for Y4mMediaAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaPort for Y4mMediaAdapter {
    fn create_object_url(&self, source: &SourceVideo) -> ObjectUrl {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = ObjectUrl::new(format!("blob:swingtrim/{}", id));
        if let Ok(mut objects) = self.objects.lock() {
            objects.insert(url.clone(), source.clone());
        }
        url
    }

    fn revoke_object_url(&self, url: &ObjectUrl) {
        if let Ok(mut objects) = self.objects.lock() {
            objects.remove(url);
        }
    }

    async fn open_element(&self, url: &ObjectUrl) -> Result<Box<dyn VideoElement>, DomainError> {
        let source = self.lookup(url)?;
        let video = Y4mVideo::parse(&source)?;
        debug!(
            %url,
            width = video.header.width,
            height = video.header.height,
            frames = video.frame_count(),
            "Opened Y4M element"
        );
        Ok(Box::new(Y4mElement::new(Arc::new(video))))
    }

    async fn start_encoder(
        &self,
        options: &EncoderOptions,
    ) -> Result<(Box<dyn EncoderSession>, EncoderEvents), DomainError> {
        let (session, events) = Y4mEncoderSession::start(options)?;
        Ok((Box::new(session), events))
    }
}
