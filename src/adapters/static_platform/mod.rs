// Static platform adapter - Device description taken from configuration

use crate::adapters::toml_config::PlatformConfig;
use crate::domain::model::ConnectionInfo;
use crate::ports::*;

/// Platform whose identity and capabilities are fixed up front
pub struct StaticPlatformAdapter {
    user_agent: String,
    max_touch_points: u32,
    encodable: Vec<String>,
    connection: Option<ConnectionInfo>,
}

impl StaticPlatformAdapter {
    /// `backend_formats` is what the media backend can actually encode; a
    /// configured format list narrows it further.
    pub fn new(config: &PlatformConfig, backend_formats: &[&str]) -> Self {
        let encodable = if config.encodable_mime_types.is_empty() {
            backend_formats.iter().map(|m| m.to_string()).collect()
        } else {
            config.encodable_mime_types.clone()
        };
        Self {
            user_agent: config.user_agent.clone(),
            max_touch_points: config.max_touch_points,
            encodable,
            connection: config.connection(),
        }
    }
}

impl PlatformPort for StaticPlatformAdapter {
    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }

    fn max_touch_points(&self) -> u32 {
        self.max_touch_points
    }

    fn can_encode(&self, mime_type: &str) -> bool {
        self.encodable
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(mime_type))
    }
}

impl NetworkPort for StaticPlatformAdapter {
    fn connection(&self) -> Option<ConnectionInfo> {
        self.connection.clone()
    }
}
