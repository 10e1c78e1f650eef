use std::path::PathBuf;

use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, EncounterConfig};

const CONFIG_PATH_ENV_VAR: &str = "CHRAUMA_CONFIG";
const SEED_ENV_VAR: &str = "CHRAUMA_SEED";
const DEMO_SECONDS_ENV_VAR: &str = "CHRAUMA_DEMO_SECONDS";
const REALTIME_ENV_VAR: &str = "CHRAUMA_REALTIME";
const SAVE_PATH_ENV_VAR: &str = "CHRAUMA_SAVE_PATH";

const DEFAULT_DEMO_SECONDS: f32 = 20.0;
const MAX_DEMO_SECONDS: f32 = 86_400.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DemoSettings {
    pub config: EncounterConfig,
    pub demo_seconds: f32,
    pub realtime: bool,
    pub save_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid {name}='{value}': expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

pub fn load_settings() -> Result<DemoSettings, BootstrapError> {
    settings_from_lookup(|name| std::env::var(name).ok())
}

/// Builds settings from an environment lookup so tests can supply their own variables.
pub fn settings_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<DemoSettings, BootstrapError> {
    let mut config = match non_empty(lookup(CONFIG_PATH_ENV_VAR)) {
        Some(path) => {
            let path = PathBuf::from(path);
            info!(path = %path.display(), "config_file_selected");
            EncounterConfig::load(&path)?
        }
        None => EncounterConfig::default(),
    };

    if let Some(raw) = non_empty(lookup(SEED_ENV_VAR)) {
        config.driver.rng_seed = raw.trim().parse().map_err(|_| BootstrapError::InvalidEnv {
            name: SEED_ENV_VAR,
            value: raw.clone(),
            expected: "unsigned 64-bit integer",
        })?;
    }

    let demo_seconds = match non_empty(lookup(DEMO_SECONDS_ENV_VAR)) {
        Some(raw) => match raw.trim().parse::<f32>() {
            Ok(seconds) if seconds > 0.0 && seconds <= MAX_DEMO_SECONDS => seconds,
            _ => {
                return Err(BootstrapError::InvalidEnv {
                    name: DEMO_SECONDS_ENV_VAR,
                    value: raw,
                    expected: "seconds in (0, 86400]",
                })
            }
        },
        None => DEFAULT_DEMO_SECONDS,
    };

    let realtime = match non_empty(lookup(REALTIME_ENV_VAR)) {
        Some(raw) => parse_flag(&raw).ok_or(BootstrapError::InvalidEnv {
            name: REALTIME_ENV_VAR,
            value: raw.clone(),
            expected: "one of 1/0/true/false",
        })?,
        None => false,
    };

    Ok(DemoSettings {
        config,
        demo_seconds,
        realtime,
        save_path: non_empty(lookup(SAVE_PATH_ENV_VAR)).map(PathBuf::from),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
