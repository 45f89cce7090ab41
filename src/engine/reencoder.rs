//! Re-encoder: a drawing surface plus the streaming encoder capturing it.
//!
//! The encoder produces fragments on its own schedule; `close` waits for its
//! final stop signal before assembling the output.

use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{DeviceProfile, Frame, OutputVideo, QualityPreset, VideoBlob};
use crate::engine::cancel::CancelToken;
use crate::engine::signal::{race_signal, with_cancel};
use crate::engine::surface::DrawingSurface;
use crate::ports::{
    EncoderEvent, EncoderEvents, EncoderOptions, EncoderSession, MediaPort, ObserverPort,
    PipelineEvent,
};

/// Owns one encoder session and the fragments it has produced
pub struct ReEncoder {
    surface: DrawingSurface,
    session: Option<Box<dyn EncoderSession>>,
    events: EncoderEvents,
    chunks: Vec<Vec<u8>>,
    requested_mime: Option<String>,
    stopped_mime: Option<String>,
    stream_error: Option<String>,
    frames: usize,
}

impl ReEncoder {
    /// Encoder request for `preset`, sized from the source dimensions
    pub fn options(
        profile: &DeviceProfile,
        preset: &QualityPreset,
        source_width: u32,
        source_height: u32,
    ) -> EncoderOptions {
        let (width, height) = preset.target_dimensions(source_width, source_height);
        EncoderOptions {
            mime_type: Some(profile.preferred_mime_type.clone()),
            video_bits_per_second: (preset.bitrate > 0).then_some(preset.bitrate),
            frame_rate: preset.frame_rate.max(1),
            width,
            height,
            duration: None,
        }
    }

    /// Start an encoder with `options`.
    ///
    /// An encoder that refuses the requested format is retried once with
    /// platform defaults.
    pub async fn open(
        media: &dyn MediaPort,
        options: EncoderOptions,
        cancel: &CancelToken,
        observer: &dyn ObserverPort,
    ) -> Result<Self, DomainError> {
        debug!(?options, "Opening encoder");

        let first = with_cancel(media.start_encoder(&options), cancel).await?;
        let (session, events, options) = match first {
            Ok((session, events)) => (session, events, options),
            Err(DomainError::EncodingSession(reason)) => {
                warn!(%reason, "Encoder refused options, retrying with platform defaults");
                observer.on_event(&PipelineEvent::EncoderRetry {
                    reason: reason.clone(),
                });
                let defaults = options.platform_defaults();
                let (session, events) =
                    with_cancel(media.start_encoder(&defaults), cancel).await??;
                (session, events, defaults)
            }
            Err(other) => return Err(other),
        };

        Ok(Self {
            surface: DrawingSurface::new(options.width, options.height),
            session: Some(session),
            events,
            chunks: Vec::new(),
            requested_mime: options.mime_type,
            stopped_mime: None,
            stream_error: None,
            frames: 0,
        })
    }

    /// Surface size the output is encoded at
    pub fn dimensions(&self) -> (u32, u32) {
        (self.surface.width(), self.surface.height())
    }

    /// Frames pushed so far
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Draw `frame` and hand the surface to the capture stream.
    /// `pts` is the frame's position in the output, in seconds.
    pub fn push_frame(&mut self, frame: &Frame, pts: f64) -> Result<(), DomainError> {
        if let Some(reason) = &self.stream_error {
            return Err(DomainError::EncodingSession(reason.clone()));
        }
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| DomainError::EncodingSession("encoder already stopped".to_string()))?;

        self.surface.draw(frame);
        session.capture(self.surface.frame(), pts)?;
        self.frames += 1;
        self.drain_ready();
        Ok(())
    }

    /// Stop the encoder and assemble everything it produced.
    ///
    /// Waits up to `timeout` for the stop signal; fragments already received
    /// are used if it never arrives.
    pub async fn close(
        mut self,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<OutputVideo, DomainError> {
        if let Some(mut session) = self.session.take() {
            session.stop();
        }

        if self.stopped_mime.is_none() {
            let outcome = race_signal(self.wait_stopped(), timeout, cancel).await?;
            if outcome.is_timed_out() {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    chunks = self.chunks.len(),
                    "Encoder never confirmed stop, finalizing with received data"
                );
            }
        }
        self.drain_ready();

        if let Some(reason) = &self.stream_error {
            warn!(%reason, "Encoder reported an error during capture");
        }
        if self.chunks.is_empty() {
            return Err(DomainError::EmptyOutput { bytes: 0 });
        }

        let mime_type = self
            .stopped_mime
            .take()
            .or_else(|| self.requested_mime.take())
            .unwrap_or_default();
        let bytes: Vec<u8> = std::mem::take(&mut self.chunks).concat();
        debug!(
            bytes = bytes.len(),
            frames = self.frames,
            %mime_type,
            "Encoder output assembled"
        );
        Ok(VideoBlob::new(bytes, mime_type))
    }

    fn drain_ready(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.record(event);
        }
    }

    async fn wait_stopped(&mut self) {
        while self.stopped_mime.is_none() {
            match self.events.recv().await {
                Some(event) => self.record(event),
                None => break,
            }
        }
    }

    fn record(&mut self, event: EncoderEvent) {
        match event {
            EncoderEvent::Data(chunk) => {
                if !chunk.is_empty() {
                    self.chunks.push(chunk);
                }
            }
            EncoderEvent::Stopped { mime_type } => self.stopped_mime = Some(mime_type),
            EncoderEvent::Error(reason) => self.stream_error = Some(reason),
        }
    }
}

impl Drop for ReEncoder {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            debug!("Stopping abandoned encoder session");
            session.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use crate::domain::model::{QualityLevel, SourceVideo};
    use crate::ports::{NullObserver, ObjectUrl, VideoElement};

    /// Encoder that emits one chunk per captured frame
    struct ChunkSession {
        tx: mpsc::UnboundedSender<EncoderEvent>,
        confirm_stop: bool,
    }

    impl EncoderSession for ChunkSession {
        fn capture(&mut self, frame: &Frame, _pts: f64) -> Result<(), DomainError> {
            let _ = self.tx.send(EncoderEvent::Data(frame.pixels[..4].to_vec()));
            Ok(())
        }

        fn stop(&mut self) {
            if self.confirm_stop {
                let _ = self.tx.send(EncoderEvent::Stopped {
                    mime_type: "video/test".to_string(),
                });
            }
        }
    }

    struct FakeMedia {
        reject_mime: bool,
        confirm_stop: bool,
        requests: Mutex<Vec<EncoderOptions>>,
        // keeps the channel open when the session never confirms
        senders: Mutex<Vec<mpsc::UnboundedSender<EncoderEvent>>>,
    }

    impl FakeMedia {
        fn new(reject_mime: bool, confirm_stop: bool) -> Self {
            Self {
                reject_mime,
                confirm_stop,
                requests: Mutex::new(Vec::new()),
                senders: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MediaPort for FakeMedia {
        fn create_object_url(&self, _source: &SourceVideo) -> ObjectUrl {
            ObjectUrl::new("blob:test")
        }

        fn revoke_object_url(&self, _url: &ObjectUrl) {}

        async fn open_element(
            &self,
            _url: &ObjectUrl,
        ) -> Result<Box<dyn VideoElement>, DomainError> {
            Err(DomainError::Decode("no elements here".to_string()))
        }

        async fn start_encoder(
            &self,
            options: &EncoderOptions,
        ) -> Result<(Box<dyn EncoderSession>, EncoderEvents), DomainError> {
            self.requests.lock().unwrap().push(options.clone());
            if self.reject_mime && options.mime_type.is_some() {
                return Err(DomainError::EncodingSession("unsupported".to_string()));
            }
            let (tx, rx) = mpsc::unbounded_channel();
            self.senders.lock().unwrap().push(tx.clone());
            let session = ChunkSession {
                tx,
                confirm_stop: self.confirm_stop,
            };
            Ok((Box::new(session), rx))
        }
    }

    fn profile() -> DeviceProfile {
        DeviceProfile {
            is_mobile: false,
            is_ios: false,
            is_android: false,
            preferred_mime_type: "video/webm".to_string(),
        }
    }

    fn medium(source_width: u32, source_height: u32) -> EncoderOptions {
        let preset = QualityPreset::for_level(QualityLevel::Medium);
        ReEncoder::options(&profile(), &preset, source_width, source_height)
    }

    #[tokio::test]
    async fn test_open_sizes_surface_to_preset() {
        let media = FakeMedia::new(false, true);
        let cancel = CancelToken::never();
        let encoder = ReEncoder::open(&media, medium(1920, 1080), &cancel, &NullObserver)
            .await
            .unwrap();
        assert_eq!(encoder.dimensions(), (854, 480));

        let requests = media.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].mime_type.as_deref(), Some("video/webm"));
        assert_eq!(requests[0].video_bits_per_second, Some(1_000_000));
    }

    #[tokio::test]
    async fn test_open_retries_with_platform_defaults() {
        let media = FakeMedia::new(true, true);
        let cancel = CancelToken::never();
        ReEncoder::open(&media, medium(640, 360), &cancel, &NullObserver)
            .await
            .unwrap();

        let requests = media.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].mime_type, None);
        assert_eq!(requests[1].video_bits_per_second, None);
        assert_eq!(requests[1].width, 640);
    }

    #[tokio::test]
    async fn test_output_duration_survives_the_retry() {
        let media = FakeMedia::new(true, true);
        let cancel = CancelToken::never();
        let options = medium(640, 360).with_duration(7.0);
        ReEncoder::open(&media, options, &cancel, &NullObserver)
            .await
            .unwrap();

        let requests = media.requests.lock().unwrap();
        assert_eq!(requests[0].duration, Some(7.0));
        assert_eq!(requests[1].duration, Some(7.0));
    }

    #[tokio::test]
    async fn test_close_assembles_chunks_in_order() {
        let media = FakeMedia::new(false, true);
        let cancel = CancelToken::never();
        let mut encoder = ReEncoder::open(&media, medium(64, 48), &cancel, &NullObserver)
            .await
            .unwrap();

        encoder.push_frame(&Frame::solid(64, 48, [1, 1, 1, 255]), 0.0).unwrap();
        encoder.push_frame(&Frame::solid(64, 48, [2, 2, 2, 255]), 1.0 / 30.0).unwrap();
        assert_eq!(encoder.frames(), 2);

        let output = encoder.close(Duration::from_secs(1), &cancel).await.unwrap();
        assert_eq!(output.bytes(), &[1, 1, 1, 255, 2, 2, 2, 255]);
        assert_eq!(output.mime_type(), "video/test");
    }

    #[tokio::test]
    async fn test_close_without_chunks_is_empty_output() {
        let media = FakeMedia::new(false, true);
        let cancel = CancelToken::never();
        let encoder = ReEncoder::open(&media, medium(64, 48), &cancel, &NullObserver)
            .await
            .unwrap();

        let result = encoder.close(Duration::from_secs(1), &cancel).await;
        assert_eq!(result.unwrap_err(), DomainError::EmptyOutput { bytes: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_times_out_waiting_for_stop() {
        let media = Arc::new(FakeMedia::new(false, false));
        let cancel = CancelToken::never();
        let mut encoder = ReEncoder::open(media.as_ref(), medium(64, 48), &cancel, &NullObserver)
            .await
            .unwrap();
        encoder.push_frame(&Frame::solid(64, 48, [9, 9, 9, 255]), 0.0).unwrap();

        let output = encoder.close(Duration::from_secs(5), &cancel).await.unwrap();
        assert_eq!(output.bytes(), &[9, 9, 9, 255]);
        // no stop signal: the requested format is reported
        assert_eq!(output.mime_type(), "video/webm");
    }
}
