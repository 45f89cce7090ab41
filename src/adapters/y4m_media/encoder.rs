//! Streaming Y4M encoder running as its own task.
//!
//! Captured frames are placed on a constant-rate grid by their `pts`; gaps
//! repeat the previous frame, as a capture stream holds the last picture.
//! With a requested duration, slots past it are not written.

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::adapters::y4m_media::format::{Y4mWriter, Y4M_MIME};
use crate::domain::errors::DomainError;
use crate::domain::model::{extension_for_mime, Frame};
use crate::ports::{EncoderEvent, EncoderEvents, EncoderOptions, EncoderSession};

// Keeps `duration * fps` from landing a hair below an integer slot
const SLOT_TOLERANCE: f64 = 1e-6;

enum Command {
    Capture(Frame, f64),
    Stop,
}

/// Accepts only Y4M, or no format preference at all
pub fn check_options(options: &EncoderOptions) -> Result<(), DomainError> {
    if let Some(mime_type) = &options.mime_type {
        if extension_for_mime(mime_type) != "y4m" {
            return Err(DomainError::EncodingSession(format!(
                "Unsupported encoder format: {}",
                mime_type
            )));
        }
    }
    if options.width == 0 || options.height == 0 {
        return Err(DomainError::EncodingSession(format!(
            "Invalid encoder size {}x{}",
            options.width, options.height
        )));
    }
    Ok(())
}

pub struct Y4mEncoderSession {
    commands: mpsc::UnboundedSender<Command>,
    stopped: bool,
}

impl Y4mEncoderSession {
    /// Spawn the encoder task; must be called inside a tokio runtime
    pub fn start(options: &EncoderOptions) -> Result<(Self, EncoderEvents), DomainError> {
        check_options(options)?;
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let writer = Y4mWriter::new(options.width, options.height, options.frame_rate);
        let frame_rate = options.frame_rate.max(1);
        let last_slot = options
            .duration
            .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
            .map(|seconds| (seconds * frame_rate as f64 + SLOT_TOLERANCE).floor() as i64);
        tokio::spawn(run_encoder(writer, frame_rate, last_slot, command_rx, event_tx));
        debug!(
            width = options.width,
            height = options.height,
            frame_rate = options.frame_rate,
            "Y4M encoder started"
        );
        Ok((
            Self {
                commands: command_tx,
                stopped: false,
            },
            event_rx,
        ))
    }
}

impl EncoderSession for Y4mEncoderSession {
    fn capture(&mut self, frame: &Frame, pts: f64) -> Result<(), DomainError> {
        if self.stopped {
            return Err(DomainError::EncodingSession("Encoder is stopped".to_string()));
        }
        self.commands
            .send(Command::Capture(frame.clone(), pts))
            .map_err(|_| DomainError::EncodingSession("Encoder task has exited".to_string()))
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            let _ = self.commands.send(Command::Stop);
        }
    }
}

async fn run_encoder(
    writer: Y4mWriter,
    frame_rate: u32,
    last_slot: Option<i64>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<EncoderEvent>,
) {
    let mut header_sent = false;
    let mut last: Option<(i64, Vec<u8>)> = None;

    while let Some(command) = commands.recv().await {
        match command {
            Command::Capture(frame, pts) => {
                let slot = (pts.max(0.0) * frame_rate as f64).round() as i64;
                if last_slot.is_some_and(|max| slot > max) {
                    trace!(slot, "Dropping frame past the output duration");
                    continue;
                }
                let record = match writer.frame(&frame) {
                    Ok(record) => record,
                    Err(err) => {
                        let _ = events.send(EncoderEvent::Error(err.to_string()));
                        continue;
                    }
                };

                let mut chunk = Vec::new();
                if !header_sent {
                    chunk.extend(writer.header());
                    header_sent = true;
                }
                match &last {
                    Some((previous, _)) if slot <= *previous => {
                        trace!(slot, "Dropping frame for an occupied slot");
                        continue;
                    }
                    Some((previous, held)) => {
                        for _ in (previous + 1)..slot {
                            chunk.extend_from_slice(held);
                        }
                    }
                    None => {}
                }
                chunk.extend_from_slice(&record);
                last = Some((slot, record));

                if events.send(EncoderEvent::Data(chunk)).is_err() {
                    return;
                }
            }
            Command::Stop => break,
        }
    }

    let _ = events.send(EncoderEvent::Stopped {
        mime_type: Y4M_MIME.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::y4m_media::format::Y4mVideo;
    use crate::domain::model::VideoBlob;

    fn options(mime_type: Option<&str>) -> EncoderOptions {
        EncoderOptions {
            mime_type: mime_type.map(str::to_string),
            video_bits_per_second: None,
            frame_rate: 10,
            width: 4,
            height: 2,
            duration: None,
        }
    }

    async fn collect(mut events: EncoderEvents) -> (Vec<u8>, Option<String>) {
        let mut bytes = Vec::new();
        while let Some(event) = events.recv().await {
            match event {
                EncoderEvent::Data(chunk) => bytes.extend(chunk),
                EncoderEvent::Stopped { mime_type } => return (bytes, Some(mime_type)),
                EncoderEvent::Error(reason) => panic!("encoder error: {}", reason),
            }
        }
        (bytes, None)
    }

    #[test]
    fn test_rejects_foreign_formats() {
        assert!(check_options(&options(Some("video/webm;codecs=vp9"))).is_err());
        assert!(check_options(&options(Some("video/x-yuv4mpeg"))).is_ok());
        assert!(check_options(&options(None)).is_ok());
    }

    #[tokio::test]
    async fn test_encodes_frames_and_fills_gaps() {
        let (mut session, events) = Y4mEncoderSession::start(&options(None)).unwrap();
        session.capture(&Frame::solid(4, 2, [255, 0, 0, 255]), 0.0).unwrap();
        // slot 1 and 2 are missing and repeat the first frame
        session.capture(&Frame::solid(4, 2, [0, 0, 255, 255]), 0.3).unwrap();
        session.stop();

        let (bytes, mime_type) = collect(events).await;
        assert_eq!(mime_type.as_deref(), Some(Y4M_MIME));

        let video = Y4mVideo::parse(&VideoBlob::new(bytes, Y4M_MIME)).unwrap();
        assert_eq!(video.frame_count(), 4);
        assert!((video.duration() - 0.4).abs() < 1e-9);
        assert!(video.frame(2).unwrap().pixel(0, 0)[0] > 200);
        assert!(video.frame(3).unwrap().pixel(0, 0)[2] > 200);
    }

    #[tokio::test]
    async fn test_frames_past_duration_are_not_written() {
        // 0.25 s at 10 fps: slots 0, 1 and 2
        let (mut session, events) =
            Y4mEncoderSession::start(&options(None).with_duration(0.25)).unwrap();
        for i in 0..5 {
            let frame = Frame::solid(4, 2, [(i * 40) as u8, 0, 0, 255]);
            session.capture(&frame, i as f64 / 10.0).unwrap();
        }
        session.stop();

        let (bytes, _) = collect(events).await;
        let video = Y4mVideo::parse(&VideoBlob::new(bytes, Y4M_MIME)).unwrap();
        assert_eq!(video.frame_count(), 3);
        assert!((video.duration() - 0.25).abs() <= 0.1);
    }

    #[tokio::test]
    async fn test_capture_after_stop_fails() {
        let (mut session, _events) = Y4mEncoderSession::start(&options(None)).unwrap();
        session.stop();
        assert!(session.capture(&Frame::solid(4, 2, [0, 0, 0, 255]), 0.0).is_err());
    }

    #[tokio::test]
    async fn test_stop_without_frames_yields_no_data() {
        let (mut session, events) = Y4mEncoderSession::start(&options(None)).unwrap();
        session.stop();
        let (bytes, mime_type) = collect(events).await;
        assert!(bytes.is_empty());
        assert!(mime_type.is_some());
    }
}
