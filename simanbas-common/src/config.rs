use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_bar_width")]
    pub bar_width: usize, // width of text histogram bars
    #[serde(default = "default_truncate")]
    pub content_truncate: usize,
}

fn default_theme() -> String {
    "dark".into()
}
fn default_bar_width() -> usize {
    40
}
fn default_truncate() -> usize {
    90
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            bar_width: default_bar_width(),
            content_truncate: default_truncate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// signed so a bad value in the file is reported instead of failing to parse
    #[serde(default = "default_bins")]
    pub histogram_bins: i64,
    #[serde(default)]
    pub min_responses: Option<u32>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_bins() -> i64 {
    10
}
fn default_limit() -> u32 {
    1000
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            histogram_bins: default_bins(),
            min_responses: None,
            limit: default_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api/v1".into()
}
fn default_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_format() -> String {
    "json".into()
}
fn default_output_dir() -> String {
    ".".into()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    pub fn config_path() -> PathBuf {
        if let Ok(env_path) = std::env::var("SIMANBAS_CONFIG") {
            return PathBuf::from(env_path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("simanbas")
            .join("config.toml")
    }

    /// Missing file yields defaults. `$SIMANBAS_API_URL` wins over the file.
    pub fn load() -> crate::Result<Self> {
        let mut cfg = Self::load_from(&Self::config_path())?;
        if let Ok(url) = std::env::var("SIMANBAS_API_URL") {
            if !url.trim().is_empty() {
                cfg.api.base_url = url;
            }
        }
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::SimanbasError::Config(e.to_string()))
    }

    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::SimanbasError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
