//! Service configuration loading and resolution
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument or environment variable (both arrive via clap)
//! 2. TOML config file
//! 3. Compiled default
//!
//! A missing default config file is not an error; the service starts with
//! compiled defaults. An explicitly requested config file must exist.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 3000;

/// Host serving the embedded folder view
pub const DEFAULT_DRIVE_HOST: &str = "drive.google.com";

/// Host serving direct file downloads
pub const DEFAULT_DOWNLOAD_HOST: &str = "drive.usercontent.google.com";

/// Local file the song catalog is read from
pub const DEFAULT_CATALOG_FILE: &str = "converts.json";

/// Remote document used to bootstrap the catalog file on first run
pub const DEFAULT_CATALOG_URL: &str =
    "https://github.com/trustytrojan/adx-convert-db/raw/refs/heads/main/songs.json";

/// Contents of an optional `config.toml`
///
/// All keys are optional; absent keys fall through to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub catalog_path: Option<PathBuf>,
    pub catalog_url: Option<String>,
    pub drive_host: Option<String>,
    pub download_host: Option<String>,
}

impl TomlConfig {
    /// Read and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Values supplied on the command line or through environment variables
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub catalog_path: Option<PathBuf>,
    pub catalog_url: Option<String>,
    pub drive_host: Option<String>,
    pub download_host: Option<String>,
    /// Explicit config file location
    pub config_file: Option<PathBuf>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub port: u16,
    pub catalog_path: PathBuf,
    pub catalog_url: String,
    pub drive_host: String,
    pub download_host: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            catalog_path: PathBuf::from(DEFAULT_CATALOG_FILE),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            drive_host: DEFAULT_DRIVE_HOST.to_string(),
            download_host: DEFAULT_DOWNLOAD_HOST.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Resolve configuration from overrides, the config file, and defaults
    ///
    /// The config file is `overrides.config_file` when given, otherwise the
    /// platform default location (see [`default_config_path`]) if it exists.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let file = match &overrides.config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                info!("Loading config file {}", path.display());
                TomlConfig::load(path)?
            }
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => {
                    info!("Loading config file {}", path.display());
                    TomlConfig::load(&path)?
                }
                None => {
                    debug!("No config file found, using compiled defaults");
                    TomlConfig::default()
                }
            },
        };

        Self::merge(overrides, file)
    }

    /// Layer overrides over file values over compiled defaults, then validate
    pub fn merge(overrides: ConfigOverrides, file: TomlConfig) -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            port: overrides.port.or(file.port).unwrap_or(defaults.port),
            catalog_path: overrides
                .catalog_path
                .or(file.catalog_path)
                .unwrap_or(defaults.catalog_path),
            catalog_url: overrides
                .catalog_url
                .or(file.catalog_url)
                .unwrap_or(defaults.catalog_url),
            drive_host: overrides
                .drive_host
                .or(file.drive_host)
                .unwrap_or(defaults.drive_host),
            download_host: overrides
                .download_host
                .or(file.download_host)
                .unwrap_or(defaults.download_host),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (key, host) in [
            ("drive_host", &self.drive_host),
            ("download_host", &self.download_host),
        ] {
            if host.is_empty() {
                return Err(Error::Config(format!("{} must not be empty", key)));
            }
            if host.contains("://") || host.contains('/') {
                return Err(Error::Config(format!(
                    "{} must be a bare host name, got {:?}",
                    key, host
                )));
            }
        }

        if !self.catalog_url.starts_with("http://") && !self.catalog_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "catalog_url must be an http(s) URL, got {:?}",
                self.catalog_url
            )));
        }

        Ok(())
    }
}

/// Platform config file location: `<config dir>/adx/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("adx").join("config.toml"))
}
