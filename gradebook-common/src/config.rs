//! Configuration loading and root folder resolution
//!
//! Bootstrap settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! Command-line and environment values for everything except the root folder
//! are collected by the binaries (clap `env`) and handed in as [`ConfigOverrides`].

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "GRADEBOOK_ROOT_FOLDER";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Database file name inside the root folder
pub const DATABASE_FILENAME: &str = "gradebook.db";

/// Export directory name inside the root folder
pub const EXPORTS_DIRNAME: &str = "exports";

/// Bootstrap configuration loaded from TOML file
///
/// Every key is optional; missing keys fall through to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database and exports
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Explicit SQLite database path (overrides `<root>/gradebook.db`)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Explicit export directory (overrides `<root>/exports`)
    #[serde(default)]
    pub export_dir: Option<PathBuf>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[server]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// `[logging]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,
}

impl TomlConfig {
    /// Load and parse a TOML config file
    ///
    /// Used for files named explicitly by the operator, so a missing or
    /// malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Invalid config file {}: {}", path.display(), e))
        })
    }

    /// Load the per-user default config file if there is one
    ///
    /// A missing default file is normal; a malformed one is logged and ignored.
    pub fn load_default() -> Option<Self> {
        let path = default_config_path()?;
        if !path.exists() {
            debug!("No config file at {}", path.display());
            return None;
        }

        match Self::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Ignoring config file: {}", e);
                None
            }
        }
    }
}

/// Default configuration file path for the platform
///
/// `~/.config/gradebook/config.toml` on Linux, the platform equivalent elsewhere.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gradebook").join("config.toml"))
}

/// OS-dependent default root folder path
pub fn get_default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("gradebook"))
        .unwrap_or_else(|| PathBuf::from("./gradebook_data"))
}

/// Resolve the root folder following the priority order above
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml: Option<&TomlConfig>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(root_folder) = toml.and_then(|t| t.root_folder.as_ref()) {
        return root_folder.clone();
    }

    // Priority 4: OS-dependent compiled default
    get_default_root_folder()
}

/// Values supplied on the command line or through environment variables
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_folder: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub export_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl ServiceConfig {
    /// Merge overrides, TOML values and compiled defaults
    pub fn resolve(overrides: ConfigOverrides, toml: Option<&TomlConfig>) -> Self {
        let root_folder = resolve_root_folder(overrides.root_folder.as_deref(), toml);
        let initializer = RootFolderInitializer::new(root_folder.clone());

        let database_path = overrides
            .database_path
            .or_else(|| toml.and_then(|t| t.database_path.clone()))
            .unwrap_or_else(|| initializer.database_path());

        let export_dir = overrides
            .export_dir
            .or_else(|| toml.and_then(|t| t.export_dir.clone()))
            .unwrap_or_else(|| initializer.export_dir());

        let host = overrides
            .host
            .or_else(|| toml.and_then(|t| t.server.host.clone()))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = overrides
            .port
            .or_else(|| toml.and_then(|t| t.server.port))
            .unwrap_or(DEFAULT_PORT);

        let log_level = overrides
            .log_level
            .or_else(|| toml.and_then(|t| t.logging.level.clone()))
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Self {
            root_folder,
            database_path,
            export_dir,
            host,
            port,
            log_level,
        }
    }

    /// Socket address string for the HTTP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Creates the root folder and derives the paths that live inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder (and parents) if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILENAME)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.root_folder.join(EXPORTS_DIRNAME)
    }
}
