use std::sync::Arc;

use tracing::info;

use crate::adapters::y4m_media::SUPPORTED_MIME_TYPES;
use crate::adapters::{
    AppConfig, HttpBackendAdapter, StaticPlatformAdapter, TracingObserver, Y4mMediaAdapter,
};
use crate::app::{
    compress_interactor::CompressInteractor, trim_interactor::TrimInteractor,
    upload_interactor::UploadInteractor,
};
use crate::domain::errors::DomainError;
use crate::domain::model::DeviceProfile;
use crate::engine::CapabilityProber;
use crate::ports::{MediaPort, NetworkPort, ObserverPort, StatusPort, UploadPort};

pub trait AppContainer: Send + Sync {
    fn profile(&self) -> &DeviceProfile;
    fn trim_interactor(&self) -> Arc<TrimInteractor>;
    fn compress_interactor(&self) -> Arc<CompressInteractor>;
    fn upload_interactor(&self) -> Arc<UploadInteractor>;
}

pub struct DefaultAppContainer {
    profile: DeviceProfile,
    trim_interactor: Arc<TrimInteractor>,
    compress_interactor: Arc<CompressInteractor>,
    upload_interactor: Arc<UploadInteractor>,
}

impl DefaultAppContainer {
    /// Wire every adapter from `config`. The device is probed once here and
    /// the profile is shared by all interactors.
    pub fn new(config: &AppConfig) -> Result<Self, DomainError> {
        config.validate()?;

        let media_port = Arc::new(Y4mMediaAdapter::new());
        let platform = Arc::new(StaticPlatformAdapter::new(
            &config.platform,
            &SUPPORTED_MIME_TYPES,
        ));
        let observer = Arc::new(TracingObserver::new());
        let backend = Arc::new(HttpBackendAdapter::new(&config.upload)?);

        let prober = CapabilityProber::new(
            config.pipeline.mime_candidates.clone(),
            config.pipeline.fallback_mime_type.clone(),
        );
        let profile = prober.probe(&*platform);
        info!(
            mobile = profile.is_mobile,
            ios = profile.is_ios,
            android = profile.is_android,
            mime_type = %profile.preferred_mime_type,
            "Device profile ready"
        );

        let trim_interactor = Arc::new(TrimInteractor::new(
            Arc::clone(&media_port) as Arc<dyn MediaPort>,
            Arc::clone(&observer) as Arc<dyn ObserverPort>,
            config.pipeline.clone(),
            profile.clone(),
        ));

        let compress_interactor = Arc::new(CompressInteractor::new(
            Arc::clone(&media_port) as Arc<dyn MediaPort>,
            Arc::clone(&platform) as Arc<dyn NetworkPort>,
            Arc::clone(&observer) as Arc<dyn ObserverPort>,
            config.pipeline.clone(),
            profile.clone(),
        ));

        let upload_interactor = Arc::new(UploadInteractor::new(
            Arc::clone(&backend) as Arc<dyn UploadPort>,
            Arc::clone(&backend) as Arc<dyn StatusPort>,
        ));

        Ok(Self {
            profile,
            trim_interactor,
            compress_interactor,
            upload_interactor,
        })
    }
}

impl AppContainer for DefaultAppContainer {
    fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    fn trim_interactor(&self) -> Arc<TrimInteractor> {
        Arc::clone(&self.trim_interactor)
    }

    fn compress_interactor(&self) -> Arc<CompressInteractor> {
        Arc::clone(&self.compress_interactor)
    }

    fn upload_interactor(&self) -> Arc<UploadInteractor> {
        Arc::clone(&self.upload_interactor)
    }
}
