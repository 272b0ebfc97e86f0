//! Configuration module
//!
//! TOML-based configuration with serde defaults and environment overrides
//! for deployment-sensitive values.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// WebSocket endpoint settings
    #[serde(default)]
    pub server: ServerConfig,

    /// OCPP behaviour knobs
    #[serde(default)]
    pub ocpp: OcppConfig,

    /// Schema file tree
    #[serde(default)]
    pub schemas: SchemaConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Charge station authentication at the WebSocket upgrade
    #[serde(default)]
    pub ws_auth: WsAuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// OCPP WebSocket bind host
    #[serde(default = "default_host")]
    pub ws_host: String,

    /// OCPP WebSocket port
    #[serde(default = "default_ws_port")]
    pub ws_port: u16,

    /// Graceful shutdown timeout (seconds)
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcppConfig {
    /// Heartbeat interval handed to charge stations in the BootNotification
    /// response (seconds)
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: u64,

    /// How long a CS-originated call may stay unanswered (seconds)
    #[serde(default = "default_pending_call_timeout")]
    pub pending_call_timeout: u64,
}

impl OcppConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval)
    }

    pub fn pending_call_timeout(&self) -> Duration {
        Duration::from_secs(self.pending_call_timeout)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Directory holding the JSON schema tree (ocpp16/, ocpp201/, has2be/)
    #[serde(default = "default_schema_root")]
    pub root: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" (human-readable) or "json" (structured)
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WsAuthMode {
    /// No WS authentication (dev mode)
    None,
    /// HTTP Basic Auth: username is the charge station id, password digest
    /// `base64(sha256(secret))` must match the stored value
    Basic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsAuthConfig {
    #[serde(default = "default_ws_auth_mode")]
    pub mode: WsAuthMode,
}

// ── Default value helpers ──────────────────────────────────────

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_ws_port() -> u16 {
    9310
}
fn default_shutdown_timeout() -> u64 {
    30
}
fn default_heartbeat_interval() -> u64 {
    300
}
fn default_pending_call_timeout() -> u64 {
    30
}
fn default_schema_root() -> String {
    "./schemas".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_ws_auth_mode() -> WsAuthMode {
    WsAuthMode::Basic
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            ocpp: OcppConfig::default(),
            schemas: SchemaConfig::default(),
            logging: LoggingConfig::default(),
            ws_auth: WsAuthConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ws_host: default_host(),
            ws_port: default_ws_port(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

impl Default for OcppConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: default_heartbeat_interval(),
            pending_call_timeout: default_pending_call_timeout(),
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            root: default_schema_root(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for WsAuthConfig {
    fn default() -> Self {
        Self {
            mode: default_ws_auth_mode(),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.ws_host, self.ws_port)
    }
}

// ── File I/O ───────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from a TOML file; a missing file means defaults.
    /// Environment variables override TOML values.
    pub fn load(path: &Path) -> Result<Self, String> {
        let mut cfg = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            toml::from_str(&content)
                .map_err(|e| format!("invalid TOML in {}: {e}", path.display()))?
        } else {
            AppConfig::default()
        };

        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Supported variables: `CSMS_WS_PORT`, `CSMS_SCHEMA_ROOT`,
    /// `CSMS_LOG_LEVEL`, `CSMS_LOG_FORMAT`, `CSMS_WS_AUTH`.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CSMS_WS_PORT") {
            if let Ok(port) = v.parse::<u16>() {
                self.server.ws_port = port;
            }
        }
        if let Ok(v) = std::env::var("CSMS_SCHEMA_ROOT") {
            self.schemas.root = v;
        }
        if let Ok(v) = std::env::var("CSMS_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("CSMS_LOG_FORMAT") {
            self.logging.format = v;
        }
        if let Ok(v) = std::env::var("CSMS_WS_AUTH") {
            match v.to_lowercase().as_str() {
                "none" => self.ws_auth.mode = WsAuthMode::None,
                "basic" => self.ws_auth.mode = WsAuthMode::Basic,
                _ => {}
            }
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if self.ocpp.heartbeat_interval < 10 {
            errors.push(format!(
                "heartbeat interval ({}) must be at least 10 seconds",
                self.ocpp.heartbeat_interval
            ));
        }

        if self.ocpp.pending_call_timeout < 1 {
            errors.push("pending call timeout must be at least 1 second".to_string());
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "invalid log level '{}', valid: {:?}",
                self.logging.level, valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            errors.push(format!(
                "invalid log format '{}', valid: {:?}",
                self.logging.format, valid_formats
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            ))
        }
    }
}
