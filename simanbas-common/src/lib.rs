pub mod config;
pub mod models;
pub use config::{AnalysisConfig, ApiConfig, Config, DisplayConfig, ExportConfig};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimanbasError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SimanbasError>;
