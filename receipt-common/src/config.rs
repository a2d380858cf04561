//! Configuration loading and resolution
//!
//! Every setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`RECEIPT_*`)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error: a warning is logged and the
//! compiled defaults apply.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "RECEIPT_CONFIG";

pub const ENV_BIND_ADDR: &str = "RECEIPT_BIND_ADDR";
pub const ENV_DATABASE_PATH: &str = "RECEIPT_DATABASE_PATH";
pub const ENV_PRIVATE_KEY_PATH: &str = "RECEIPT_PRIVATE_KEY_PATH";
pub const ENV_PUBLIC_KEY_PATH: &str = "RECEIPT_PUBLIC_KEY_PATH";
pub const ENV_OCR_URL: &str = "RECEIPT_OCR_URL";
pub const ENV_OCR_SECRET: &str = "RECEIPT_OCR_SECRET";
pub const ENV_LOG_LEVEL: &str = "RECEIPT_LOG_LEVEL";

/// Compiled defaults
pub struct CompiledDefaults;

impl CompiledDefaults {
    pub const BIND_ADDR: &'static str = "0.0.0.0:5000";
    pub const PUBLIC_KEY_PATH: &'static str = "keys/verify.pem";
    pub const OCR_VERSION: &'static str = "V2";
    pub const OCR_LANG: &'static str = "ko";
    pub const IMAGE_FORMAT: &'static str = "png";
    pub const FAN_OUT_DEADLINE_SECS: u64 = 30;
    pub const STORAGE_TIMEOUT_SECS: u64 = 5;
    pub const LOG_LEVEL: &'static str = "info";

    /// `<data_local_dir>/receipt/receipt.db`, or `./receipt_data/receipt.db`
    pub fn database_path() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("receipt"))
            .unwrap_or_else(|| PathBuf::from("./receipt_data"))
            .join("receipt.db")
    }
}

// ========================================
// TOML file schema
// ========================================

/// On-disk configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub keys: KeySection,
    pub ocr: OcrSection,
    pub storage: StorageSection,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind_addr: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeySection {
    /// Only needed by processes that issue tokens
    pub private_key_path: Option<PathBuf>,
    pub public_key_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSection {
    pub url: Option<String>,
    pub secret_key: Option<String>,
    pub version: Option<String>,
    pub lang: Option<String>,
    pub default_format: Option<String>,
    pub deadline_secs: Option<u64>,
    /// Fail normalization on unparsable numbers instead of storing zero
    pub strict_numbers: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Locate the config file to load.
///
/// An explicitly named file (flag or `RECEIPT_CONFIG`) must exist. The
/// platform default (`<config_dir>/receipt/config.toml`) is optional.
pub fn locate_config_file(cli_path: Option<&Path>) -> Result<Option<PathBuf>> {
    let explicit = cli_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path));
    }

    Ok(dirs::config_dir()
        .map(|d| d.join("receipt").join("config.toml"))
        .filter(|p| p.exists()))
}

// ========================================
// Resolved configuration
// ========================================

/// Command-line overrides (highest priority)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub private_key_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// OCR provider settings
#[derive(Debug, Clone, PartialEq)]
pub struct OcrSettings {
    pub url: Option<String>,
    pub secret_key: Option<String>,
    pub version: String,
    pub lang: String,
    pub default_format: String,
    pub deadline: Duration,
    pub strict_numbers: bool,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub database_path: PathBuf,
    pub private_key_path: Option<PathBuf>,
    pub public_key_path: PathBuf,
    pub ocr: OcrSettings,
    pub storage_timeout: Duration,
    pub log_level: String,
}

impl ServiceConfig {
    /// Locate and read the config file, then resolve every setting
    pub fn resolve(overrides: &CliOverrides) -> Result<Self> {
        let toml = match locate_config_file(overrides.config_path.as_deref())? {
            Some(path) => {
                info!("Loading config file: {}", path.display());
                load_toml_config(&path)?
            }
            None => {
                warn!("No config file found, using environment and compiled defaults");
                TomlConfig::default()
            }
        };

        Ok(Self::from_sources(overrides, &toml))
    }

    /// Resolve settings from already-loaded sources
    pub fn from_sources(overrides: &CliOverrides, toml: &TomlConfig) -> Self {
        let bind_addr = overrides
            .bind_addr
            .clone()
            .or_else(|| env_value(ENV_BIND_ADDR))
            .or_else(|| toml.server.bind_addr.clone())
            .unwrap_or_else(|| CompiledDefaults::BIND_ADDR.to_string());

        let database_path = env_value(ENV_DATABASE_PATH)
            .or_else(|| toml.database.path.clone())
            .unwrap_or_else(CompiledDefaults::database_path);

        let private_key_path = overrides
            .private_key_path
            .clone()
            .or_else(|| env_value(ENV_PRIVATE_KEY_PATH))
            .or_else(|| toml.keys.private_key_path.clone());

        let public_key_path = env_value(ENV_PUBLIC_KEY_PATH)
            .or_else(|| toml.keys.public_key_path.clone())
            .unwrap_or_else(|| PathBuf::from(CompiledDefaults::PUBLIC_KEY_PATH));

        let ocr = OcrSettings {
            url: env_value(ENV_OCR_URL).or_else(|| toml.ocr.url.clone()),
            secret_key: env_value(ENV_OCR_SECRET).or_else(|| toml.ocr.secret_key.clone()),
            version: toml
                .ocr
                .version
                .clone()
                .unwrap_or_else(|| CompiledDefaults::OCR_VERSION.to_string()),
            lang: toml
                .ocr
                .lang
                .clone()
                .unwrap_or_else(|| CompiledDefaults::OCR_LANG.to_string()),
            default_format: toml
                .ocr
                .default_format
                .clone()
                .unwrap_or_else(|| CompiledDefaults::IMAGE_FORMAT.to_string()),
            deadline: Duration::from_secs(
                toml.ocr
                    .deadline_secs
                    .unwrap_or(CompiledDefaults::FAN_OUT_DEADLINE_SECS),
            ),
            strict_numbers: toml.ocr.strict_numbers.unwrap_or(false),
        };

        let storage_timeout = Duration::from_secs(
            toml.storage
                .timeout_secs
                .unwrap_or(CompiledDefaults::STORAGE_TIMEOUT_SECS),
        );

        let log_level = overrides
            .log_level
            .clone()
            .or_else(|| env_value(ENV_LOG_LEVEL))
            .or_else(|| toml.logging.level.clone())
            .unwrap_or_else(|| CompiledDefaults::LOG_LEVEL.to_string());

        Self {
            bind_addr,
            database_path,
            private_key_path,
            public_key_path,
            ocr,
            storage_timeout,
            log_level,
        }
    }

    /// OCR endpoint URL and secret; both are required to run the ingest service
    pub fn ocr_endpoint(&self) -> Result<(String, String)> {
        match (&self.ocr.url, &self.ocr.secret_key) {
            (Some(url), Some(secret)) if !url.trim().is_empty() && !secret.trim().is_empty() => {
                Ok((url.clone(), secret.clone()))
            }
            _ => Err(Error::Config(format!(
                "OCR endpoint not configured. Set {} and {} or the [ocr] url/secret_key TOML keys",
                ENV_OCR_URL, ENV_OCR_SECRET
            ))),
        }
    }
}

/// Read and parse an environment variable; unset, empty or unparsable
/// values count as absent.
fn env_value<T: FromStr>(key: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).ok()?;
    if raw.trim().is_empty() {
        return None;
    }
    raw.parse()
        .map_err(|e| warn!("Invalid {} value: {}", key, e))
        .ok()
}
