// equipment-ledger-config/src/config.rs
// ============================================================================
// Module: Equipment Ledger Configuration
// Description: Configuration loading and validation for Equipment Ledger.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: equipment-ledger-core, equipment-ledger-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section is optional and defaults to a local, loopback-only server
//! with an in-memory store. Invalid values fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use equipment_ledger_core::PipelineConfig;
use equipment_ledger_core::ReportFormat;
use equipment_ledger_core::RetentionPolicy;
use equipment_ledger_store_sqlite::SqliteStoreConfig;
use equipment_ledger_store_sqlite::SqliteStoreMode;
use equipment_ledger_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "equipment-ledger.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "EQUIPMENT_LEDGER_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default bind address.
pub(crate) const DEFAULT_BIND: &str = "127.0.0.1:8000";
/// Default maximum request body size (10 MiB).
pub(crate) const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
/// Upper bound for the request body size (256 MiB).
pub(crate) const MAX_BODY_BYTES_LIMIT: usize = 256 * 1024 * 1024;
/// Default busy timeout for the `SQLite` store (ms).
pub(crate) const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default retained batch count.
pub(crate) const DEFAULT_MAX_BATCHES: u64 = 5;
/// Upper bound for the retained batch count.
pub(crate) const MAX_MAX_BATCHES: u64 = 1_000;
/// Default decimal places in report rows.
pub(crate) const DEFAULT_DECIMAL_PLACES: usize = 2;
/// Upper bound for report decimal places.
pub(crate) const MAX_DECIMAL_PLACES: usize = 10;
/// Default placeholder for absent report cells.
pub(crate) const DEFAULT_MISSING_PLACEHOLDER: &str = "N/A";
/// Upper bound for the placeholder length in characters.
pub(crate) const MAX_PLACEHOLDER_LENGTH: usize = 32;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Equipment Ledger configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EquipmentLedgerConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Batch store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Batch retention configuration.
    #[serde(default)]
    pub retention: RetentionConfig,
    /// Report formatting configuration.
    #[serde(default)]
    pub report: ReportConfig,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Resolved path the configuration was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl EquipmentLedgerConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit path, then the `EQUIPMENT_LEDGER_CONFIG`
    /// environment variable, then `equipment-ledger.toml` in the working
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        let mut config = Self::from_toml_bytes(&bytes)?;
        config.source_path = Some(resolved);
        Ok(config)
    }

    /// Parses and validates configuration from TOML bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bytes are too large, not UTF-8, not
    /// valid TOML, or fail validation.
    pub fn from_toml_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.store.validate()?;
        self.retention.validate()?;
        self.report.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Returns the pipeline configuration derived from this config.
    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            retention: RetentionPolicy::new(self.retention.max_batches),
            report_format: ReportFormat {
                decimal_places: self.report.decimal_places,
                missing_placeholder: self.report.missing_placeholder.clone(),
            },
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_body_bytes must not exceed {MAX_BODY_BYTES_LIMIT}"
            )));
        }
        Ok(())
    }

    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the address is empty or malformed.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let bind = self.bind.trim();
        if bind.is_empty() {
            return Err(ConfigError::Invalid("server.bind must be non-empty".to_string()));
        }
        bind.parse().map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))
    }
}

/// Batch store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Use the in-memory store.
    #[default]
    Memory,
    /// Use the `SQLite`-backed durable store.
    Sqlite,
}

/// Batch store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory store must not set path".to_string(),
                    ));
                }
                Ok(())
            }
            StoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite store requires path".to_string())
                })?;
                validate_store_path(path)
            }
        }
    }

    /// Returns the `SQLite` store configuration for the sqlite backend.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        match self.store_type {
            StoreType::Memory => None,
            StoreType::Sqlite => self.path.as_ref().map(|path| SqliteStoreConfig {
                path: path.clone(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
            }),
        }
    }
}

/// Batch retention configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Maximum number of retained batches.
    #[serde(default = "default_max_batches")]
    pub max_batches: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_batches: default_max_batches(),
        }
    }
}

impl RetentionConfig {
    /// Validates retention configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batches == 0 || self.max_batches > MAX_MAX_BATCHES {
            return Err(ConfigError::Invalid(format!(
                "retention.max_batches must be between 1 and {MAX_MAX_BATCHES}"
            )));
        }
        Ok(())
    }
}

/// Report formatting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Decimal places for numeric report cells.
    #[serde(default = "default_decimal_places")]
    pub decimal_places: usize,
    /// Placeholder text for absent report cells.
    #[serde(default = "default_missing_placeholder")]
    pub missing_placeholder: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            decimal_places: default_decimal_places(),
            missing_placeholder: default_missing_placeholder(),
        }
    }
}

impl ReportConfig {
    /// Validates report configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.decimal_places > MAX_DECIMAL_PLACES {
            return Err(ConfigError::Invalid(format!(
                "report.decimal_places must not exceed {MAX_DECIMAL_PLACES}"
            )));
        }
        if self.missing_placeholder.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "report.missing_placeholder must be non-empty".to_string(),
            ));
        }
        if self.missing_placeholder.chars().count() > MAX_PLACEHOLDER_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "report.missing_placeholder exceeds {MAX_PLACEHOLDER_LENGTH} characters"
            )));
        }
        Ok(())
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("audit.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates the sqlite store path.
fn validate_store_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("store.path must be non-empty".to_string()));
    }
    validate_path_string("store.path", &path.to_string_lossy())
}

/// Default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Default maximum request body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default `SQLite` busy timeout.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

/// Default retained batch count.
const fn default_max_batches() -> u64 {
    DEFAULT_MAX_BATCHES
}

/// Default report decimal places.
const fn default_decimal_places() -> usize {
    DEFAULT_DECIMAL_PLACES
}

/// Default report placeholder.
fn default_missing_placeholder() -> String {
    DEFAULT_MISSING_PLACEHOLDER.to_string()
}

/// Audit logging is on unless disabled.
const fn default_audit_enabled() -> bool {
    true
}
