// Unit tests for business rules

use super::*;

fn profile(is_mobile: bool, is_ios: bool, is_android: bool) -> DeviceProfile {
    DeviceProfile {
        is_mobile,
        is_ios,
        is_android,
        preferred_mime_type: "video/webm".to_string(),
    }
}

fn connection(effective_type: &str, downlink: Option<f64>) -> ConnectionInfo {
    ConnectionInfo {
        effective_type: effective_type.to_string(),
        downlink,
    }
}

#[test]
fn test_strategy_selection_by_device() {
    assert_eq!(
        StrategySelector::select(&profile(true, true, false)),
        CaptureStrategy::DiscreteFrame
    );
    assert_eq!(
        StrategySelector::select(&profile(true, false, true)),
        CaptureStrategy::ContinuousPlayback
    );
    assert_eq!(
        StrategySelector::select(&profile(false, false, false)),
        CaptureStrategy::Standard
    );
}

#[test]
fn test_fallback_chain_ends_at_discrete_frame() {
    assert_eq!(
        StrategySelector::fallback_for(CaptureStrategy::Standard),
        Some(CaptureStrategy::DiscreteFrame)
    );
    assert_eq!(
        StrategySelector::fallback_for(CaptureStrategy::ContinuousPlayback),
        Some(CaptureStrategy::DiscreteFrame)
    );
    assert_eq!(StrategySelector::fallback_for(CaptureStrategy::DiscreteFrame), None);
}

#[test]
fn test_network_2g_is_very_low() {
    let conditions = detect_network_conditions(Some(&connection("2g", None)));
    assert_eq!(conditions.quality_recommendation, QualityLevel::VeryLow);

    let slow = detect_network_conditions(Some(&connection("slow-2g", Some(0.05))));
    assert_eq!(slow.quality_recommendation, QualityLevel::VeryLow);
}

#[test]
fn test_network_4g_fast_is_high() {
    let conditions = detect_network_conditions(Some(&connection("4g", Some(10.0))));
    assert_eq!(conditions.quality_recommendation, QualityLevel::High);
    assert_eq!(conditions.effective_type.as_deref(), Some("4g"));
    assert_eq!(conditions.downlink, Some(10.0));
}

#[test]
fn test_network_4g_default_is_medium() {
    let slow_4g = detect_network_conditions(Some(&connection("4g", Some(2.0))));
    assert_eq!(slow_4g.quality_recommendation, QualityLevel::Medium);

    let unknown_downlink = detect_network_conditions(Some(&connection("4g", None)));
    assert_eq!(unknown_downlink.quality_recommendation, QualityLevel::Medium);
}

#[test]
fn test_network_3g_depends_on_downlink() {
    let low = detect_network_conditions(Some(&connection("3g", Some(0.4))));
    assert_eq!(low.quality_recommendation, QualityLevel::Low);

    let medium = detect_network_conditions(Some(&connection("3g", Some(1.5))));
    assert_eq!(medium.quality_recommendation, QualityLevel::Medium);
}

#[test]
fn test_network_absent_is_medium() {
    let conditions = detect_network_conditions(None);
    assert_eq!(conditions.quality_recommendation, QualityLevel::Medium);
    assert!(conditions.effective_type.is_none());
}

#[test]
fn test_deadline_uses_device_floor() {
    let policy = DeadlinePolicy::default();
    assert_eq!(
        policy.deadline(&profile(true, false, true), 7.0),
        Duration::from_secs(45)
    );
    assert_eq!(
        policy.deadline(&profile(false, false, false), 7.0),
        Duration::from_secs(120)
    );
}

#[test]
fn test_deadline_scales_with_long_captures() {
    let policy = DeadlinePolicy::default();
    // 1.5 * 100 + 10 exceeds both floors
    assert_eq!(
        policy.deadline(&profile(false, false, false), 100.0),
        Duration::from_secs(160)
    );
}

#[test]
fn test_metadata_timeout_by_device_and_size() {
    let policy = MetadataPolicy::default();
    let small = SourceVideo::new(vec![0u8; 10], "video/webm");
    assert_eq!(
        policy.timeout(&profile(false, false, false), &small),
        Duration::from_secs(3)
    );
    assert_eq!(
        policy.timeout(&profile(true, true, false), &small),
        Duration::from_secs(5)
    );
}

#[test]
fn test_sanitize_duration_estimates_from_size() {
    let three_mib = SourceVideo::new(vec![0u8; 3 * 1024 * 1024], "video/mp4");
    assert_eq!(MetadataPolicy::sanitize_duration(f64::INFINITY, &three_mib), 3.0);
    assert_eq!(MetadataPolicy::sanitize_duration(0.0, &three_mib), 3.0);
    assert_eq!(MetadataPolicy::sanitize_duration(4.2, &three_mib), 4.2);

    let tiny = SourceVideo::new(vec![0u8; 100], "video/mp4");
    assert_eq!(MetadataPolicy::sanitize_duration(f64::NAN, &tiny), 1.0);
}

#[test]
fn test_output_validator_threshold() {
    let small = OutputVideo::new(vec![0u8; MIN_OUTPUT_BYTES - 1], "video/webm");
    let ok = OutputVideo::new(vec![0u8; MIN_OUTPUT_BYTES], "video/webm");
    assert!(!OutputValidator::is_acceptable(&small, MIN_OUTPUT_BYTES));
    assert!(OutputValidator::is_acceptable(&ok, MIN_OUTPUT_BYTES));
}
