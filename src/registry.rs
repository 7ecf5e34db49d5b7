//! Stored sessions: named connection data and the helpers that open them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use fluentdb_core::{Error, Result, Session};
use fluentdb_memory::MemorySession;
use fluentdb_statement::NodeSession;

use crate::config::ClientConfig;

/// Where and as whom to connect.
///
/// Parsed from `[scheme://][user[:password]@]host[:port][/schema]`. The
/// password is never displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionData {
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: String,
    pub port: Option<u16>,
    pub schema: Option<String>,
}

impl ConnectionData {
    /// Data for `host` with nothing else set.
    pub fn host(host: impl Into<String>) -> Self {
        Self {
            user: None,
            password: None,
            host: host.into(),
            port: None,
            schema: None,
        }
    }
}

impl FromStr for ConnectionData {
    type Err = String;

    fn from_str(uri: &str) -> std::result::Result<Self, String> {
        let rest = uri.split_once("://").map_or(uri, |(_, rest)| rest);
        let (credentials, rest) = match rest.rsplit_once('@') {
            Some((c, r)) => (Some(c), r),
            None => (None, rest),
        };
        let (user, password) = match credentials {
            None => (None, None),
            Some(c) => match c.split_once(':') {
                Some((u, p)) => (Some(u.to_string()), Some(p.to_string())),
                None => (Some(c.to_string()), None),
            },
        };
        if user.as_deref() == Some("") {
            return Err(format!("Invalid URI '{}': empty user", uri));
        }

        let (address, schema) = match rest.split_once('/') {
            Some((a, s)) if !s.is_empty() => (a, Some(s.to_string())),
            Some((a, _)) => (a, None),
            None => (rest, None),
        };
        let (host, port) = match address.rsplit_once(':') {
            Some((h, p)) => {
                let port = p
                    .parse::<u16>()
                    .map_err(|_| format!("Invalid URI '{}': bad port '{}'", uri, p))?;
                (h, Some(port))
            }
            None => (address, None),
        };
        if host.is_empty() {
            return Err(format!("Invalid URI '{}': missing host", uri));
        }
        Ok(ConnectionData {
            user,
            password,
            host: host.to_string(),
            port,
            schema,
        })
    }
}

impl fmt::Display for ConnectionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{}@", user)?;
        }
        write!(f, "{}", self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        if let Some(schema) = &self.schema {
            write!(f, "/{}", schema)?;
        }
        Ok(())
    }
}

/// Named connection data.
#[derive(Debug, Clone, Default)]
pub struct StoredSessions {
    sessions: BTreeMap<String, ConnectionData>,
    fetch_warnings: bool,
}

fn check_name(function: &str, name: &str) -> Result<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::invalid_argument(
            function,
            format!("The session name '{}' is not a valid identifier", name),
        ));
    }
    Ok(())
}

impl StoredSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every session of `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut registry = Self {
            fetch_warnings: config.fetch_warnings,
            ..Self::default()
        };
        for (name, entry) in &config.sessions {
            registry.add(name, entry.connection_data(name)?)?;
        }
        Ok(registry)
    }

    /// Store `data` under a new name.
    pub fn add(&mut self, name: &str, data: ConnectionData) -> Result<()> {
        check_name("StoredSessions.add", name)?;
        if self.sessions.contains_key(name) {
            return Err(Error::invalid_argument(
                "StoredSessions.add",
                format!("The name '{}' already exists", name),
            ));
        }
        tracing::debug!(target: "fluentdb::registry", name, uri = %data, "Session stored");
        self.sessions.insert(name.to_string(), data);
        Ok(())
    }

    /// Replace the data stored under an existing name.
    pub fn update(&mut self, name: &str, data: ConnectionData) -> Result<()> {
        let slot = self
            .sessions
            .get_mut(name)
            .ok_or_else(|| unknown("StoredSessions.update", name))?;
        *slot = data;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<ConnectionData> {
        let data = self
            .sessions
            .remove(name)
            .ok_or_else(|| unknown("StoredSessions.remove", name))?;
        tracing::debug!(target: "fluentdb::registry", name, "Session removed");
        Ok(data)
    }

    pub fn get(&self, name: &str) -> Result<&ConnectionData> {
        self.sessions
            .get(name)
            .ok_or_else(|| unknown("StoredSessions.get", name))
    }

    /// Stored names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }

    /// Open the stored session `name` in memory.
    pub fn connect(&self, name: &str) -> Result<NodeSession> {
        let data = self.get(name)?;
        let session = connect_memory(data);
        session.set_fetch_warnings(self.fetch_warnings);
        Ok(session)
    }
}

fn unknown(function: &str, name: &str) -> Error {
    Error::invalid_argument(function, format!("The name '{}' does not exist", name))
}

/// Open an in-memory session described by `data`. Its schema, when given,
/// is created and selected.
pub fn connect_memory(data: &ConnectionData) -> NodeSession {
    let session = MemorySession::with_uri(data.to_string(), data.schema.clone());
    tracing::debug!(target: "fluentdb::registry", uri = %data, "Opening memory session");
    NodeSession::new(Arc::new(session) as Arc<dyn Session>)
}

/// Open the configured default session.
pub fn connect_default(config: &ClientConfig) -> Result<NodeSession> {
    let name = config
        .default_session
        .as_deref()
        .ok_or_else(|| Error::config("No default_session configured"))?;
    StoredSessions::from_config(config)?.connect(name)
}
