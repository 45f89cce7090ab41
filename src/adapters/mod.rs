// Adapters - External system implementations

pub mod http_backend;
pub mod static_platform;
pub mod toml_config;
pub mod tracing_log;
pub mod y4m_media;

// Re-export adapters
pub use http_backend::HttpBackendAdapter;
pub use static_platform::StaticPlatformAdapter;
pub use toml_config::{AppConfig, LoggingConfig, PlatformConfig, UploadConfig};
pub use tracing_log::{init_logging, TracingObserver};
pub use y4m_media::Y4mMediaAdapter;
