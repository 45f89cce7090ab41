//! End-to-end runs through the in-process Y4M media backend

mod common;

use std::sync::Arc;

use common::*;
use swingtrim::adapters::y4m_media::{Y4mMediaAdapter, Y4mVideo, Y4M_MIME};
use swingtrim::adapters::AppConfig;
use swingtrim::domain::model::*;
use swingtrim::engine::{CancelToken, EngineConfig};
use swingtrim::ports::*;
use swingtrim::{
    AppContainer, CompressInteractor, CompressRequest, DefaultAppContainer, TrimInteractor,
    TrimRequest,
};

const FRAME_TOLERANCE: f64 = 1.0 / 30.0 + 1e-6;

fn swing_source() -> SourceVideo {
    // 10 s at 30 fps
    y4m_source(64, 48, 30, 300)
}

type TrimRun = (TrimOutcome, Arc<Y4mMediaAdapter>, Arc<RecordingObserver>);

async fn trim_with(profile: DeviceProfile) -> TrimRun {
    trim_range_with(profile, 2.0, 9.0).await
}

async fn trim_range_with(profile: DeviceProfile, start: f64, end: f64) -> TrimRun {
    let media = Arc::new(Y4mMediaAdapter::new());
    let observer = Arc::new(RecordingObserver::default());
    let interactor = TrimInteractor::new(
        Arc::clone(&media) as Arc<dyn MediaPort>,
        Arc::clone(&observer) as Arc<dyn ObserverPort>,
        EngineConfig::default(),
        profile,
    );
    let outcome = interactor
        .trim(
            TrimRequest {
                source: swing_source(),
                start,
                end,
                quality: Some(QualityLevel::High),
            },
            &CancelToken::never(),
        )
        .await
        .unwrap();
    (outcome, media, observer)
}

fn assert_seven_second_clip(outcome: &TrimOutcome) {
    assert!(!outcome.fell_back_to_original);
    assert_eq!(outcome.video.mime_type(), Y4M_MIME);

    let clip = Y4mVideo::parse(&outcome.video).unwrap();
    assert_eq!((clip.header.width, clip.header.height), (64, 48));
    assert_eq!(clip.frame_count(), 211);
    assert!((clip.duration() - 7.0).abs() <= FRAME_TOLERANCE);

    // first output frame is source frame 60
    let expected = (60 * 255 / 300) as i32;
    let [r, _, _, _] = clip.frame(0).unwrap().pixel(0, 0);
    assert!((r as i32 - expected).abs() <= 6, "red {} vs {}", r, expected);
}

#[tokio::test]
async fn test_desktop_trim_produces_seven_seconds() {
    let (outcome, media, observer) = trim_with(desktop()).await;
    assert_eq!(outcome.strategy_used, Some(CaptureStrategy::Standard));
    assert_seven_second_clip(&outcome);

    // the backend only writes Y4M, so the preferred format is refused once
    assert_eq!(
        observer.count(|e| matches!(e, PipelineEvent::EncoderRetry { .. })),
        1
    );
    assert_eq!(media.live_object_urls(), 0);
}

#[tokio::test]
async fn test_ios_trim_produces_seven_seconds() {
    let (outcome, media, _) = trim_with(ios()).await;
    assert_eq!(outcome.strategy_used, Some(CaptureStrategy::DiscreteFrame));
    assert_seven_second_clip(&outcome);
    assert_eq!(media.live_object_urls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_android_trim_produces_seven_seconds() {
    let (outcome, media, _) = trim_with(android()).await;
    assert_eq!(outcome.strategy_used, Some(CaptureStrategy::ContinuousPlayback));
    assert_seven_second_clip(&outcome);
    assert_eq!(media.live_object_urls(), 0);
}

#[tokio::test]
async fn test_off_grid_range_keeps_duration_within_a_frame() {
    for (start, end) in [(2.0, 9.01), (2.0, 9.02), (1.005, 3.49)] {
        let (outcome, _, _) = trim_range_with(desktop(), start, end).await;
        assert!(!outcome.fell_back_to_original);

        let clip = Y4mVideo::parse(&outcome.video).unwrap();
        let span = end - start;
        assert!(
            (clip.duration() - span).abs() <= FRAME_TOLERANCE,
            "range {}..{}: {} frames, {:.4} s",
            start,
            end,
            clip.frame_count(),
            clip.duration()
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_off_grid_range_on_mobile_strategies() {
    for profile in [ios(), android()] {
        let (outcome, _, _) = trim_range_with(profile, 2.0, 9.01).await;
        let clip = Y4mVideo::parse(&outcome.video).unwrap();
        assert!((clip.duration() - 7.01).abs() <= FRAME_TOLERANCE);
    }
}

#[tokio::test]
async fn test_repeated_trim_gives_similar_output() {
    let (first, _, _) = trim_with(desktop()).await;
    let (second, _, _) = trim_with(desktop()).await;

    let (a, b) = (first.video.len() as f64, second.video.len() as f64);
    assert!((a - b).abs() / a.max(b) <= 0.05, "{} vs {} bytes", a, b);
    assert_eq!(first.range, second.range);
}

#[tokio::test]
async fn test_undecodable_source_fails_metadata() {
    let media = Arc::new(Y4mMediaAdapter::new());
    let interactor = TrimInteractor::new(
        Arc::clone(&media) as Arc<dyn MediaPort>,
        Arc::new(NullObserver),
        EngineConfig::default(),
        desktop(),
    );
    let result = interactor
        .trim(
            TrimRequest {
                source: VideoBlob::new(vec![0u8; 512], "video/webm"),
                start: 0.0,
                end: 1.0,
                quality: None,
            },
            &CancelToken::never(),
        )
        .await;
    assert!(result.is_err());
    assert_eq!(media.live_object_urls(), 0);
}

#[tokio::test]
async fn test_compress_downscales_to_very_low() {
    let media = Arc::new(Y4mMediaAdapter::new());
    let compressor = CompressInteractor::new(
        Arc::clone(&media) as Arc<dyn MediaPort>,
        Arc::new(FixedNetwork(None)),
        Arc::new(NullObserver),
        EngineConfig::default(),
        desktop(),
    );
    // 2 s at 15 fps
    let source = y4m_source(480, 270, 15, 30);

    let outcome = compressor
        .compress(
            CompressRequest {
                source: source.clone(),
                quality: Some(QualityLevel::VeryLow),
                max_duration: None,
            },
            &CancelToken::never(),
        )
        .await
        .unwrap();

    assert!(outcome.compressed);
    assert!(outcome.video.len() < source.len());
    let clip = Y4mVideo::parse(&outcome.video).unwrap();
    assert_eq!((clip.header.width, clip.header.height), (426, 240));
    // the source's own 30 frames, no repeat past its end
    assert_eq!(clip.frame_count(), 30);
    assert!((clip.duration() - 2.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_container_wires_the_reference_backend() {
    let mut config = AppConfig::default();
    config.platform.user_agent = DESKTOP_UA.to_string();
    let container = DefaultAppContainer::new(&config).unwrap();

    let outcome = container
        .trim_interactor()
        .trim(
            TrimRequest {
                source: y4m_source(32, 32, 30, 60),
                start: 0.5,
                end: 1.5,
                quality: None,
            },
            &CancelToken::never(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.strategy_used, Some(CaptureStrategy::Standard));
    let clip = Y4mVideo::parse(&outcome.video).unwrap();
    assert_eq!(clip.frame_count(), 31);
}
