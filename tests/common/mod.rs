//! Scripted ports shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use swingtrim::adapters::y4m_media::{Y4mWriter, Y4M_MIME};
use swingtrim::domain::errors::DomainError;
use swingtrim::domain::model::*;
use swingtrim::engine::CancelHandle;
use swingtrim::ports::*;

pub const DESKTOP_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";
pub const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148";
pub const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) Mobile Safari/537.36";

pub fn desktop() -> DeviceProfile {
    DeviceProfile {
        is_mobile: false,
        is_ios: false,
        is_android: false,
        preferred_mime_type: "video/webm;codecs=vp9".to_string(),
    }
}

pub fn ios() -> DeviceProfile {
    DeviceProfile {
        is_mobile: true,
        is_ios: true,
        is_android: false,
        preferred_mime_type: "video/mp4;codecs=h264".to_string(),
    }
}

pub fn android() -> DeviceProfile {
    DeviceProfile {
        is_mobile: true,
        is_ios: false,
        is_android: true,
        preferred_mime_type: "video/webm;codecs=vp8".to_string(),
    }
}

/// Source bytes for the scripted backend; only identity and size matter
pub fn source_blob(len: usize) -> SourceVideo {
    VideoBlob::new(vec![7u8; len], "video/mp4")
}

/// Y4M source whose frames get brighter over time
pub fn y4m_source(width: u32, height: u32, fps: u32, frames: usize) -> SourceVideo {
    let frames: Vec<Frame> = (0..frames)
        .map(|i| {
            let level = ((i * 255) / frames.max(1)) as u8;
            Frame::solid(width, height, [level, 64, 255 - level, 255])
        })
        .collect();
    let bytes = Y4mWriter::new(width, height, fps)
        .encode_all(&frames)
        .expect("fixture encodes");
    VideoBlob::new(bytes, Y4M_MIME)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetadataScript {
    Ready,
    /// The metadata event never fires but the element reports values
    HangsWithSnapshot,
    /// The metadata event never fires and nothing is reported
    Hangs,
    Fails,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EncoderScript {
    /// One chunk of `bytes_per_frame` per capture, stop confirmed
    Chunks { bytes_per_frame: usize },
    /// Confirms stop without ever producing data
    Silent,
    /// Refuses any explicit format, accepts platform defaults
    RejectPreferred { bytes_per_frame: usize },
    /// Refuses to start at all
    Reject,
}

#[derive(Debug, Clone)]
pub struct ElementScript {
    pub metadata: VideoMetadata,
    pub metadata_mode: MetadataScript,
    pub seek_hangs: bool,
    pub playback_stalls: bool,
    /// Rate at which playback presents frames
    pub presented_fps: f64,
    /// Opens beyond this count fail
    pub max_opens: Option<usize>,
}

impl ElementScript {
    pub fn new(duration: f64) -> Self {
        Self {
            metadata: VideoMetadata {
                duration,
                width: 64,
                height: 48,
            },
            metadata_mode: MetadataScript::Ready,
            seek_hangs: false,
            playback_stalls: false,
            presented_fps: 30.0,
            max_opens: None,
        }
    }
}

/// Element that answers from its script without decoding anything
pub struct ScriptedElement {
    script: ElementScript,
    current_time: f64,
    seek_pending: bool,
    playing: bool,
    ended: bool,
}

#[async_trait]
impl VideoElement for ScriptedElement {
    async fn loaded_metadata(&mut self) -> Result<VideoMetadata, DomainError> {
        match self.script.metadata_mode {
            MetadataScript::Ready => Ok(self.script.metadata),
            MetadataScript::Fails => Err(DomainError::Decode("corrupt container".to_string())),
            MetadataScript::Hangs | MetadataScript::HangsWithSnapshot => {
                std::future::pending().await
            }
        }
    }

    fn metadata_snapshot(&self) -> Option<VideoMetadata> {
        match self.script.metadata_mode {
            MetadataScript::Hangs | MetadataScript::Fails => None,
            _ => Some(self.script.metadata),
        }
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.current_time = seconds;
        self.seek_pending = true;
        self.ended = false;
    }

    async fn seeked(&mut self) {
        if self.script.seek_hangs || !self.seek_pending {
            std::future::pending::<()>().await;
        }
        self.seek_pending = false;
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn current_frame(&self) -> Result<Frame, DomainError> {
        let metadata = self.script.metadata;
        let level = (self.current_time * 10.0).clamp(0.0, 255.0) as u8;
        Ok(Frame::solid(metadata.width, metadata.height, [level, 0, 0, 255]))
    }

    async fn play(&mut self, _rate: f64) -> Result<(), DomainError> {
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    async fn next_frame(&mut self) -> f64 {
        if !self.playing || self.script.playback_stalls {
            return std::future::pending().await;
        }
        let next = self.current_time + 1.0 / self.script.presented_fps;
        if next > self.script.metadata.duration {
            self.ended = true;
            return std::future::pending().await;
        }
        tokio::task::yield_now().await;
        self.current_time = next;
        next
    }

    fn is_ended(&self) -> bool {
        self.ended
    }
}

struct ScriptedSession {
    tx: mpsc::UnboundedSender<EncoderEvent>,
    bytes_per_frame: usize,
    mime_type: String,
    pts: Arc<Mutex<Vec<f64>>>,
}

impl EncoderSession for ScriptedSession {
    fn capture(&mut self, _frame: &Frame, pts: f64) -> Result<(), DomainError> {
        self.pts.lock().unwrap().push(pts);
        if self.bytes_per_frame > 0 {
            let _ = self.tx.send(EncoderEvent::Data(vec![0xAB; self.bytes_per_frame]));
        }
        Ok(())
    }

    fn stop(&mut self) {
        let _ = self.tx.send(EncoderEvent::Stopped {
            mime_type: self.mime_type.clone(),
        });
    }
}

/// Media backend driven by an element script and an encoder script
pub struct ScriptedMedia {
    pub element: ElementScript,
    pub encoder: EncoderScript,
    pub created_urls: AtomicUsize,
    pub revoked_urls: AtomicUsize,
    pub opens: AtomicUsize,
    pub encoder_requests: Mutex<Vec<EncoderOptions>>,
    pub captured_pts: Arc<Mutex<Vec<f64>>>,
}

impl ScriptedMedia {
    pub fn new(element: ElementScript, encoder: EncoderScript) -> Self {
        Self {
            element,
            encoder,
            created_urls: AtomicUsize::new(0),
            revoked_urls: AtomicUsize::new(0),
            opens: AtomicUsize::new(0),
            encoder_requests: Mutex::new(Vec::new()),
            captured_pts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn live_urls(&self) -> usize {
        self.created_urls.load(Ordering::SeqCst) - self.revoked_urls.load(Ordering::SeqCst)
    }

    pub fn captured_frames(&self) -> usize {
        self.captured_pts.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaPort for ScriptedMedia {
    fn create_object_url(&self, _source: &SourceVideo) -> ObjectUrl {
        let id = self.created_urls.fetch_add(1, Ordering::SeqCst);
        ObjectUrl::new(format!("blob:scripted/{}", id))
    }

    fn revoke_object_url(&self, _url: &ObjectUrl) {
        self.revoked_urls.fetch_add(1, Ordering::SeqCst);
    }

    async fn open_element(&self, _url: &ObjectUrl) -> Result<Box<dyn VideoElement>, DomainError> {
        let opened = self.opens.fetch_add(1, Ordering::SeqCst) + 1;
        if self.element.max_opens.is_some_and(|max| opened > max) {
            return Err(DomainError::Decode("element refused to load".to_string()));
        }
        Ok(Box::new(ScriptedElement {
            script: self.element.clone(),
            current_time: 0.0,
            seek_pending: false,
            playing: false,
            ended: false,
        }))
    }

    async fn start_encoder(
        &self,
        options: &EncoderOptions,
    ) -> Result<(Box<dyn EncoderSession>, EncoderEvents), DomainError> {
        self.encoder_requests.lock().unwrap().push(options.clone());
        let bytes_per_frame = match self.encoder {
            EncoderScript::Chunks { bytes_per_frame } => bytes_per_frame,
            EncoderScript::Silent => 0,
            EncoderScript::RejectPreferred { bytes_per_frame } => {
                if options.mime_type.is_some() {
                    return Err(DomainError::EncodingSession(
                        "format not supported".to_string(),
                    ));
                }
                bytes_per_frame
            }
            EncoderScript::Reject => {
                return Err(DomainError::EncodingSession("no encoder".to_string()))
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let session = ScriptedSession {
            tx,
            bytes_per_frame,
            mime_type: options
                .mime_type
                .clone()
                .unwrap_or_else(|| "video/webm".to_string()),
            pts: Arc::clone(&self.captured_pts),
        };
        Ok((Box::new(session), rx))
    }
}

/// Fixed network information
pub struct FixedNetwork(pub Option<ConnectionInfo>);

impl NetworkPort for FixedNetwork {
    fn connection(&self) -> Option<ConnectionInfo> {
        self.0.clone()
    }
}

/// Observer keeping every event; optionally cancels on the first captured frame
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PipelineEvent>>,
    cancel_on_frame: Mutex<Option<CancelHandle>>,
}

impl RecordingObserver {
    pub fn cancelling_on_first_frame(handle: CancelHandle) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            cancel_on_frame: Mutex::new(Some(handle)),
        }
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn states(&self) -> Vec<TrimState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PipelineEvent::StateChanged { state, .. } => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&PipelineEvent) -> bool) -> usize {
        self.events().iter().filter(|event| matches(event)).count()
    }
}

impl ObserverPort for RecordingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        if matches!(event, PipelineEvent::FrameCaptured { .. }) {
            if let Some(handle) = self.cancel_on_frame.lock().unwrap().take() {
                handle.cancel();
            }
        }
        self.events.lock().unwrap().push(event.clone());
    }
}
