//! Capability prober: the single place that classifies the device and
//! chooses the encoder format.

use tracing::debug;

use crate::domain::model::DeviceProfile;
use crate::ports::PlatformPort;

/// Encoder formats in priority order
pub const DEFAULT_MIME_CANDIDATES: [&str; 5] = [
    "video/webm;codecs=h264",
    "video/webm;codecs=vp9",
    "video/webm;codecs=vp8",
    "video/webm",
    "video/mp4;codecs=h264",
];

/// Returned when the platform accepts none of the candidates
pub const FALLBACK_MIME_TYPE: &str = "video/webm";

const MOBILE_MARKERS: [&str; 5] = ["Mobi", "webOS", "BlackBerry", "IEMobile", "Opera Mini"];
const IOS_MARKERS: [&str; 3] = ["iPad", "iPhone", "iPod"];

/// Classifies the platform and picks the encoder format
#[derive(Debug, Clone)]
pub struct CapabilityProber {
    candidates: Vec<String>,
    fallback: String,
}

impl Default for CapabilityProber {
    fn default() -> Self {
        Self::new(
            DEFAULT_MIME_CANDIDATES.iter().map(|m| m.to_string()).collect(),
            FALLBACK_MIME_TYPE,
        )
    }
}

impl CapabilityProber {
    pub fn new(candidates: Vec<String>, fallback: impl Into<String>) -> Self {
        Self {
            candidates,
            fallback: fallback.into(),
        }
    }

    /// Inspect the platform. Never fails.
    pub fn probe(&self, platform: &dyn PlatformPort) -> DeviceProfile {
        let user_agent = platform.user_agent();
        let is_ios = Self::is_ios(&user_agent, platform.max_touch_points());
        let is_android = user_agent.contains("Android");
        let is_mobile = is_ios
            || is_android
            || MOBILE_MARKERS.iter().any(|marker| user_agent.contains(marker));

        let profile = DeviceProfile {
            is_mobile,
            is_ios,
            is_android,
            preferred_mime_type: self.preferred_mime_type(platform),
        };
        debug!(?profile, "Probed device profile");
        profile
    }

    /// First candidate the platform can encode, else the fallback
    pub fn preferred_mime_type(&self, platform: &dyn PlatformPort) -> String {
        self.candidates
            .iter()
            .find(|candidate| platform.can_encode(candidate))
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    // iPadOS reports a desktop Safari user agent; touch support gives it away
    fn is_ios(user_agent: &str, max_touch_points: u32) -> bool {
        IOS_MARKERS.iter().any(|marker| user_agent.contains(marker))
            || (user_agent.contains("Macintosh") && max_touch_points > 1)
    }
}
