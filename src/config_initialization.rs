//! Configuration initialization and hierarchy management

use tracing::info;

use crate::adapters::AppConfig;
use crate::cli::Cli;
use crate::domain::errors::DomainError;
use crate::domain::model::QualityLevel;

/// Build the effective configuration following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration(cli: &Cli) -> Result<AppConfig, DomainError> {
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;

    let env_overrides = apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    let cli_overrides = apply_cli_overrides(&mut config, cli);
    config.validate()?;

    info!(env_overrides, cli_overrides, "Configuration initialized");
    Ok(config)
}

/// Apply `SWINGTRIM_*` variables read through `lookup`; returns how many applied
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<usize, DomainError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = 0;

    if let Some(level) = lookup("SWINGTRIM_LOG_LEVEL") {
        config.logging.level = level;
        applied += 1;
    }
    if let Some(json) = lookup("SWINGTRIM_LOG_JSON") {
        config.logging.json = parse_env("SWINGTRIM_LOG_JSON", &json)?;
        applied += 1;
    }
    if let Some(url) = lookup("SWINGTRIM_BACKEND_URL") {
        config.upload.base_url = url;
        applied += 1;
    }
    if let Some(user_agent) = lookup("SWINGTRIM_USER_AGENT") {
        config.platform.user_agent = user_agent;
        applied += 1;
    }
    if let Some(points) = lookup("SWINGTRIM_TOUCH_POINTS") {
        config.platform.max_touch_points = parse_env("SWINGTRIM_TOUCH_POINTS", &points)?;
        applied += 1;
    }
    if let Some(quality) = lookup("SWINGTRIM_TRIM_QUALITY") {
        config.pipeline.trim_quality = quality.parse::<QualityLevel>()?;
        applied += 1;
    }

    Ok(applied)
}

/// Apply global CLI flags; returns how many applied
pub fn apply_cli_overrides(config: &mut AppConfig, cli: &Cli) -> usize {
    let mut applied = 0;

    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
        applied += 1;
    }
    if cli.json_logs {
        config.logging.json = true;
        applied += 1;
    }
    if let Some(user_agent) = &cli.user_agent {
        config.platform.user_agent = user_agent.clone();
        applied += 1;
    }
    if let Some(points) = cli.touch_points {
        config.platform.max_touch_points = points;
        applied += 1;
    }
    if let Some(effective_type) = &cli.effective_type {
        config.platform.effective_type = Some(effective_type.clone());
        applied += 1;
    }
    if let Some(downlink) = cli.downlink {
        config.platform.downlink = Some(downlink);
        applied += 1;
    }
    if let Some(url) = &cli.backend_url {
        config.upload.base_url = url.clone();
        applied += 1;
    }

    applied
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, DomainError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| DomainError::Config(format!("Invalid value for {}: {}", key, value)))
}
