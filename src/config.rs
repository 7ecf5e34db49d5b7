//! Client configuration via `fluentdb.toml`
//!
//! Holds the logging filter, the warning preference and the stored session
//! definitions. A default file is written on first use; edit it to add
//! sessions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use fluentdb_core::{Error, Result};

use crate::registry::ConnectionData;

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "fluentdb.toml";

/// One stored session: either a full `uri` or its parts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl SessionConfig {
    /// Connection data of this entry. `uri` wins over the individual parts.
    pub fn connection_data(&self, name: &str) -> Result<ConnectionData> {
        if let Some(uri) = &self.uri {
            return uri
                .parse()
                .map_err(|e| Error::config(format!("Session '{}': {}", name, e)));
        }
        let host = self.host.clone().ok_or_else(|| {
            Error::config(format!("Session '{}' needs either 'uri' or 'host'", name))
        })?;
        Ok(ConnectionData {
            user: self.user.clone(),
            password: None,
            host,
            port: self.port,
            schema: self.schema.clone(),
        })
    }
}

/// Client configuration loaded from `fluentdb.toml`.
///
/// # Example
///
/// ```toml
/// log_filter = "warn"
/// fetch_warnings = false
/// default_session = "local"
///
/// [sessions.local]
/// uri = "root@localhost:33060/test"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// `tracing` filter directive, overridden by `FLUENTDB_LOG`.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Report collaborator warnings with each result.
    #[serde(default)]
    pub fetch_warnings: bool,
    /// Session opened by `connect_default`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_session: Option<String>,
    #[serde(default)]
    pub sessions: BTreeMap<String, SessionConfig>,
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            fetch_warnings: false,
            default_session: None,
            sessions: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# fluentdb client configuration
#
# Log filter, same syntax as RUST_LOG. FLUENTDB_LOG overrides it.
log_filter = "warn"

# Report warnings (division by zero, truncation) with each result.
fetch_warnings = false

# Session opened by connect_default.
# default_session = "local"

# Stored sessions, by name. Give either a uri or its parts.
# [sessions.local]
# uri = "root@localhost:33060/test"
#
# [sessions.data]
# host = "localhost"
# port = 33060
# user = "root"
# schema = "test"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be read or parsed, or if
    /// `default_session` names no stored session.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: ClientConfig = toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        if let Some(name) = &config.default_session {
            if !config.sessions.contains_key(name) {
                return Err(Error::config(format!(
                    "default_session '{}' is not defined under [sessions]",
                    name
                )));
            }
        }
        Ok(config)
    }

    /// Load `path`, or the defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
