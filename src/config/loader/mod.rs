use crate::config::Config;
use crate::utils::{ensure_dir, get_daily_start_home};
use anyhow::{Context, Result};
use fs2::FileExt;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variables that override config values after the file is read.
const ENV_BACKEND_URL: &str = "DAILY_START_BACKEND_URL";
const ENV_MESSAGES: &str = "DAILY_START_MESSAGES";
const ENV_STORAGE_DIR: &str = "DAILY_START_STORAGE_DIR";

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_daily_start_home()?.join("config.json"))
}

pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let default_path = get_config_path().unwrap_or_else(|_| PathBuf::from("config.json"));
    let path = config_path.unwrap_or(default_path.as_path());

    let mut config = if path.exists() {
        // Shared lock: concurrent readers allowed, blocks while a save holds the lock
        let file = fs::File::open(path)
            .with_context(|| format!("Failed to open config at {}", path.display()))?;
        file.lock_shared()
            .with_context(|| "Failed to acquire shared lock on config file")?;

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let data: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config JSON from {}", path.display()))?;

        serde_json::from_value(data).with_context(|| "Failed to deserialize config")?
    } else {
        debug!("no config at {}, using defaults", path.display());
        Config::default()
    };

    apply_env_overrides(&mut config);

    config
        .validate()
        .with_context(|| "Configuration validation failed")?;
    Ok(config)
}

/// Env values win over the file. A backend URL from the environment also
/// enables the backend, since setting it has no other purpose.
pub fn apply_env_overrides(config: &mut Config) {
    if let Ok(url) = std::env::var(ENV_BACKEND_URL)
        && !url.trim().is_empty()
    {
        config.sources.backend.base_url = url.trim().to_string();
        config.sources.backend.enabled = true;
    }
    if let Ok(messages) = std::env::var(ENV_MESSAGES)
        && !messages.trim().is_empty()
    {
        config.sources.messages_path = messages.trim().to_string();
    }
    if let Ok(dir) = std::env::var(ENV_STORAGE_DIR)
        && !dir.trim().is_empty()
    {
        config.storage.dir = Some(dir.trim().to_string());
    }
}

pub fn save_config(config: &Config, config_path: Option<&Path>) -> Result<()> {
    let default_path = get_config_path().unwrap_or_else(|_| PathBuf::from("config.json"));
    let path = config_path.unwrap_or(default_path.as_path());

    ensure_dir(path.parent().context("Config path has no parent")?)?;

    // atomic_write() renames over the target, which drops any flock held on
    // the old inode, so the exclusive lock lives on a sibling file.
    let lock_path = path.with_extension("json.lock");
    let lock_file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to create lock file at {}", lock_path.display()))?;
    lock_file
        .lock_exclusive()
        .with_context(|| "Failed to acquire exclusive lock on config lock file")?;

    let content = serde_json::to_string_pretty(config)?;
    crate::utils::atomic_write(path, &content)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}
