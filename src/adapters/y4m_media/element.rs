//! Decodable element over a parsed Y4M stream, with a playback clock on
//! tokio time.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::{Duration, Instant};

use crate::adapters::y4m_media::format::Y4mVideo;
use crate::domain::errors::DomainError;
use crate::domain::model::{Frame, VideoMetadata};
use crate::ports::VideoElement;

struct Playback {
    started_at: Instant,
    media_start: f64,
    rate: f64,
}

pub struct Y4mElement {
    video: Arc<Y4mVideo>,
    current_time: f64,
    seek_pending: bool,
    playback: Option<Playback>,
    presented: Option<usize>,
    ended: bool,
}

impl Y4mElement {
    pub fn new(video: Arc<Y4mVideo>) -> Self {
        Self {
            video,
            current_time: 0.0,
            seek_pending: false,
            playback: None,
            presented: None,
            ended: false,
        }
    }

    fn duration(&self) -> f64 {
        self.video.duration()
    }

    fn position(&self) -> f64 {
        match &self.playback {
            Some(playback) => {
                let elapsed = playback.started_at.elapsed().as_secs_f64() * playback.rate;
                (playback.media_start + elapsed).min(self.duration())
            }
            None => self.current_time,
        }
    }
}

#[async_trait]
impl VideoElement for Y4mElement {
    async fn loaded_metadata(&mut self) -> Result<VideoMetadata, DomainError> {
        if self.video.frame_count() == 0 {
            return Err(DomainError::Decode("Stream has no frames".to_string()));
        }
        Ok(self.video.metadata())
    }

    fn metadata_snapshot(&self) -> Option<VideoMetadata> {
        (self.video.frame_count() > 0).then(|| self.video.metadata())
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.current_time = seconds.clamp(0.0, self.duration());
        self.seek_pending = true;
        self.ended = false;
        if let Some(playback) = self.playback.as_mut() {
            playback.started_at = Instant::now();
            playback.media_start = self.current_time;
            self.presented = None;
        }
    }

    async fn seeked(&mut self) {
        if !self.seek_pending {
            // nothing to confirm; a real element would never fire either
            std::future::pending::<()>().await;
        }
        self.seek_pending = false;
        tokio::task::yield_now().await;
    }

    fn current_time(&self) -> f64 {
        self.position()
    }

    fn current_frame(&self) -> Result<Frame, DomainError> {
        let index = match (self.presented, &self.playback) {
            (Some(index), Some(_)) => index,
            _ => self.video.frame_index_at(self.position()),
        };
        self.video.frame(index)
    }

    async fn play(&mut self, rate: f64) -> Result<(), DomainError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(DomainError::Capture(format!("Invalid playback rate: {}", rate)));
        }
        self.playback = Some(Playback {
            started_at: Instant::now(),
            media_start: self.current_time,
            rate,
        });
        self.presented = None;
        self.ended = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.current_time = self.position();
        self.playback = None;
        self.presented = None;
    }

    async fn next_frame(&mut self) -> f64 {
        let Some(playback) = &self.playback else {
            return std::future::pending().await;
        };

        let frame_rate = self.video.header.frame_rate();
        let index = match self.presented {
            Some(previous) => previous + 1,
            None => self.video.frame_index_at(playback.media_start),
        };
        if index >= self.video.frame_count() {
            self.ended = true;
            return std::future::pending().await;
        }

        let media_time = index as f64 / frame_rate;
        let offset = ((media_time - playback.media_start) / playback.rate).max(0.0);
        let due = playback.started_at + Duration::from_secs_f64(offset);
        tokio::time::sleep_until(due).await;

        self.presented = Some(index);
        self.current_time = media_time;
        media_time
    }

    fn is_ended(&self) -> bool {
        self.ended
    }
}
