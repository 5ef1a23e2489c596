use crate::error::{NoticeError, Result};
use crate::message::DEFAULT_MESSAGE_TEMPLATE;
use crate::settlement::SettlementRules;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub paths: PathsConfig,
    pub settlement: SettlementRules,
    pub message: MessageConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub roster_csv: PathBuf,
    pub catalog_csv: PathBuf,
    pub output_dir: PathBuf,
    pub audit_db: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            roster_csv: PathBuf::from("data/motoristas.csv"),
            catalog_csv: PathBuf::from("data/tipos_multa.csv"),
            output_dir: PathBuf::from("output"),
            audit_db: PathBuf::from("output/logs_multas.db"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MessageConfig {
    pub template: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_MESSAGE_TEMPLATE.to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            NoticeError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&content).map_err(|e| e.in_file(path))
    }

    /// Load `path` if it exists, otherwise fall back to the built-in defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| NoticeError::Configuration(e.to_string()))
    }
}
