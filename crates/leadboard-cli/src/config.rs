// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use leadboard_app::{DEFAULT_BACKEND_URL, SortOrder};
use leadboard_client::ClientConfig;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_VERSION: i64 = 1;
const APP_NAME: &str = "leadboard";
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_LOG_LEVEL: &str = "info";

pub const CONFIG_PATH_ENV: &str = "LEADBOARD_CONFIG_PATH";
pub const BACKEND_URL_ENV: &str = "LEADBOARD_BACKEND_URL";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            backend: Backend::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Backend {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub sort: Option<String>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            sort: Some(SortOrder::default().as_str().to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put settings under [backend], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(timeout) = &self.backend.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "backend.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(base_url) = &self.backend.base_url
            && base_url.trim().is_empty()
        {
            bail!(
                "backend.base_url in {} is empty; remove it to fall back to {BACKEND_URL_ENV} or {DEFAULT_BACKEND_URL}",
                path.display()
            );
        }

        if let Some(sort) = &self.ui.sort
            && SortOrder::parse(sort).is_none()
        {
            bail!(
                "ui.sort in {} must be \"desc\" or \"asc\", got {sort:?}",
                path.display()
            );
        }

        Ok(())
    }

    /// Config value first, then the environment override, then the local
    /// default.
    pub fn backend_base_url(&self, env_override: Option<&str>) -> String {
        let configured = self
            .backend
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());
        let from_env = env_override
            .map(str::trim)
            .filter(|value| !value.is_empty());
        configured
            .or(from_env)
            .unwrap_or(DEFAULT_BACKEND_URL)
            .to_owned()
    }

    pub fn backend_timeout(&self) -> Result<Duration> {
        parse_duration(self.backend.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn client_config(&self, env_override: Option<&str>) -> Result<ClientConfig> {
        Ok(ClientConfig::new(self.backend_base_url(env_override))
            .with_timeout(self.backend_timeout()?))
    }

    pub fn sort_order(&self) -> SortOrder {
        self.ui
            .sort
            .as_deref()
            .and_then(SortOrder::parse)
            .unwrap_or_default()
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.log
            .file
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# leadboard config\n# Place this file at: {}\n\nversion = 1\n\n[backend]\n# Falls back to {BACKEND_URL_ENV}, then {DEFAULT_BACKEND_URL}\nbase_url = \"{DEFAULT_BACKEND_URL}\"\ntimeout = \"{DEFAULT_TIMEOUT}\"\n\n[ui]\n# \"desc\" shows the highest lead score first\nsort = \"desc\"\n\n[log]\nlevel = \"{DEFAULT_LOG_LEVEL}\"\n# The dashboard owns the terminal, so logs only go to a file.\n# file = \"/absolute/path/to/leadboard.log\"\n",
            path.display(),
        )
    }
}

/// Reads the backend URL override once; callers pass it down explicitly.
pub fn backend_url_from_env() -> Option<String> {
    env::var(BACKEND_URL_ENV).ok()
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}
