use std::fs;
use std::path::{Path, PathBuf};

use costscope_core::{DateRange, Platform};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const COSTSCOPE_DIR_NAME: &str = ".costscope";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_SERVICE_BASE_URL: &str = "http://127.0.0.1:5000/api";
pub const DEFAULT_CHART_WIDTH: u32 = 500;
pub const DEFAULT_CHART_HEIGHT: u32 = 400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CostscopeConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub chart: ChartConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub default_range: DateRange,
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_range: DateRange::default(),
            platforms: default_platforms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_chart_width")]
    pub width: u32,
    #[serde(default = "default_chart_height")]
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CHART_WIDTH,
            height: DEFAULT_CHART_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("failed to serialize config TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub fn costscope_dir(workspace_root: impl AsRef<Path>) -> PathBuf {
    workspace_root.as_ref().join(COSTSCOPE_DIR_NAME)
}

pub fn config_path(workspace_root: impl AsRef<Path>) -> PathBuf {
    costscope_dir(workspace_root).join(CONFIG_FILE_NAME)
}

pub fn load_workspace_config(
    workspace_root: impl AsRef<Path>,
) -> Result<CostscopeConfig, ConfigError> {
    let path = config_path(workspace_root);
    if !path.exists() {
        return Ok(CostscopeConfig::default());
    }

    let raw = fs::read_to_string(path)?;
    let parsed: CostscopeConfig = toml::from_str(&raw)?;
    Ok(normalize_config(parsed))
}

pub fn ensure_workspace_config(
    workspace_root: impl AsRef<Path>,
) -> Result<CostscopeConfig, ConfigError> {
    let workspace_root = workspace_root.as_ref();
    fs::create_dir_all(costscope_dir(workspace_root))?;

    let path = config_path(workspace_root);
    if path.exists() {
        return load_workspace_config(workspace_root);
    }

    let config = CostscopeConfig::default();
    let content = toml::to_string_pretty(&config)?;
    fs::write(path, content)?;

    Ok(config)
}

/// Non-fatal problems a caller may want to surface before running.
pub fn validate_config(config: &CostscopeConfig) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    for key in &config.view.platforms {
        if key.parse::<Platform>().is_err() {
            warnings.push(ConfigWarning {
                code: "unknown_platform",
                message: format!(
                    "[view].platforms contains '{key}', which the data service does not report"
                ),
            });
        }
    }

    if config.chart.width == 0 || config.chart.height == 0 {
        warnings.push(ConfigWarning {
            code: "empty_chart",
            message: format!(
                "[chart] dimensions {}x{} leave nothing to draw",
                config.chart.width, config.chart.height
            ),
        });
    }

    warnings
}

fn default_base_url() -> String {
    DEFAULT_SERVICE_BASE_URL.to_owned()
}

fn default_platforms() -> Vec<String> {
    Platform::ALL
        .iter()
        .map(|platform| platform.as_str().to_owned())
        .collect()
}

fn default_chart_width() -> u32 {
    DEFAULT_CHART_WIDTH
}

fn default_chart_height() -> u32 {
    DEFAULT_CHART_HEIGHT
}

fn normalize_platforms(input: Vec<String>) -> Vec<String> {
    let mut platforms = Vec::with_capacity(input.len());
    for raw in input {
        let key = raw.trim().to_ascii_lowercase();
        if !key.is_empty() && !platforms.contains(&key) {
            platforms.push(key);
        }
    }

    if platforms.is_empty() {
        default_platforms()
    } else {
        platforms
    }
}

fn normalize_config(mut config: CostscopeConfig) -> CostscopeConfig {
    let base_url = config.service.base_url.trim().trim_end_matches('/');
    if base_url.is_empty() {
        config.service.base_url = default_base_url();
    } else {
        config.service.base_url = base_url.to_owned();
    }

    config.view.platforms = normalize_platforms(std::mem::take(&mut config.view.platforms));

    config
}
