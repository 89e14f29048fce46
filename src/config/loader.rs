//! Configuration loading and saving utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::schema::Config;

/// Get the default configuration file path (`~/.dashbot/config.json`).
pub fn get_config_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".dashbot").join("config.json")
}

/// Load configuration from a file and overlay environment overrides.
///
/// If `config_path` is `None`, the default path (`~/.dashbot/config.json`) is
/// used.
pub fn load_config(config_path: Option<&Path>) -> Config {
    let mut config = load_config_file(config_path);
    apply_env_overrides(&mut config);
    config
}

/// Load configuration from a file, or return a default [`Config`] if the file
/// does not exist or cannot be parsed.
pub fn load_config_file(config_path: Option<&Path>) -> Config {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => get_config_path(),
    };

    let mut config = Config::default();
    if path.exists() {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Config>(&contents) {
                Ok(cfg) => config = cfg,
                Err(e) => {
                    warn!(
                        "Failed to parse config from {}: {}. Using default configuration.",
                        path.display(),
                        e
                    );
                }
            },
            Err(e) => {
                warn!(
                    "Failed to read config from {}: {}. Using default configuration.",
                    path.display(),
                    e
                );
            }
        }
    }

    config
}

/// Save configuration to a JSON file.
///
/// If `config_path` is `None`, the default path is used. Parent directories
/// are created if they don't exist.
pub fn save_config(config: &Config, config_path: Option<&Path>) {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => get_config_path(),
    };

    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    match serde_json::to_string_pretty(config) {
        Ok(json) => {
            if let Err(e) = fs::write(&path, json) {
                warn!("Failed to write config to {}: {}", path.display(), e);
            }
        }
        Err(e) => {
            warn!("Failed to serialize config: {}", e);
        }
    }
}

/// Overlay process environment variables onto a loaded config.
///
/// Mirrors the env surface the node server exposed, so deployments configured
/// purely through the environment keep working without a config file.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(key) = env::var("OPENAI_API_KEY") {
        config.provider.api_key = key;
    }
    if let Ok(model) = env::var("OPENAI_MODEL") {
        config.provider.model = model;
    }
    if let Ok(base) = env::var("OPENAI_API_BASE") {
        config.provider.api_base = Some(base);
    }
    if let Ok(flag) = env::var("USE_AZURE") {
        config.provider.use_azure = matches!(flag.as_str(), "1" | "true" | "TRUE" | "True");
    }
    if let Ok(endpoint) = env::var("AZURE_OPENAI_ENDPOINT") {
        config.provider.azure_endpoint = Some(endpoint);
    }
    if let Ok(deployment) = env::var("AZURE_OPENAI_DEPLOYMENT") {
        config.provider.azure_deployment = Some(deployment);
    }
    if let Ok(version) = env::var("AZURE_OPENAI_API_VERSION") {
        config.provider.api_version = version;
    }
    if let Ok(port) = env::var("PORT") {
        match port.parse() {
            Ok(port) => config.gateway.port = port,
            Err(_) => warn!("Ignoring unparseable PORT value: {}", port),
        }
    }
}
