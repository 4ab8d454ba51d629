//! Router, directory and network configuration

use crate::error::{Result, RoutingError};
use crate::types::{NodeId, UserId};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Sender-side and relay-side routing parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Number of relays in every circuit
    pub circuit_length: usize,
    /// Upper bound on one outbound hop call, in seconds
    pub hop_timeout_secs: u64,
}

impl RouterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_circuit_length(mut self, length: usize) -> Self {
        self.circuit_length = length;
        self
    }

    pub fn with_hop_timeout(mut self, secs: u64) -> Self {
        self.hop_timeout_secs = secs;
        self
    }

    pub fn hop_timeout(&self) -> Duration {
        Duration::from_secs(self.hop_timeout_secs)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            circuit_length: 3,
            hop_timeout_secs: 30,
        }
    }
}

/// Directory service parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Store relay private keys at registration. Test and debug deployments only.
    pub key_escrow: bool,
}

impl DirectoryConfig {
    pub fn with_key_escrow(mut self, enabled: bool) -> Self {
        self.key_escrow = enabled;
        self
    }
}

/// Address layout of a locally launched network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub host: String,
    pub registry_port: u16,
    /// Relay `n` listens on `base_relay_port + n`
    pub base_relay_port: u16,
    /// User `n` listens on `base_user_port + n`
    pub base_user_port: u16,
    /// Relays started by the launcher
    pub relays: usize,
    /// User endpoints started by the launcher
    pub users: usize,
}

impl NetworkConfig {
    pub fn with_ports(mut self, registry: u16, base_relay: u16, base_user: u16) -> Self {
        self.registry_port = registry;
        self.base_relay_port = base_relay;
        self.base_user_port = base_user;
        self
    }

    pub fn with_population(mut self, relays: usize, users: usize) -> Self {
        self.relays = relays;
        self.users = users;
        self
    }

    pub fn registry_url(&self) -> String {
        format!("http://{}:{}", self.host, self.registry_port)
    }

    pub fn relay_port(&self, node: NodeId) -> Result<u16> {
        offset_port(self.base_relay_port, node.0, "relay")
    }

    pub fn user_port(&self, user: UserId) -> Result<u16> {
        offset_port(self.base_user_port, user.0, "user")
    }

    pub fn relay_url(&self, node: NodeId) -> Result<String> {
        Ok(format!("http://{}:{}", self.host, self.relay_port(node)?))
    }

    pub fn user_url(&self, user: UserId) -> Result<String> {
        Ok(format!("http://{}:{}", self.host, self.user_port(user)?))
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            registry_port: 8080,
            base_relay_port: 4000,
            base_user_port: 3000,
            relays: 10,
            users: 2,
        }
    }
}

fn offset_port(base: u16, offset: u32, what: &str) -> Result<u16> {
    u32::from(base)
        .checked_add(offset)
        .and_then(|port| u16::try_from(port).ok())
        .ok_or_else(|| {
            RoutingError::InvalidConfig(format!("{what} {offset} does not fit above port {base}"))
        })
}

/// Complete configuration of an onionnet deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnionNetConfig {
    pub router: RouterConfig,
    pub directory: DirectoryConfig,
    pub network: NetworkConfig,
}

impl OnionNetConfig {
    /// Parses a TOML document; missing sections fall back to defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RoutingError::InvalidConfig(format!("Failed to parse TOML: {e}")))
    }

    /// Reads a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            RoutingError::InvalidConfig(format!(
                "Failed to read config file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Applies `ONIONNET_*` environment overrides on top of the loaded values.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("ONIONNET_CIRCUIT_LENGTH") {
            self.router.circuit_length = parse_var("ONIONNET_CIRCUIT_LENGTH", &val)?;
        }
        if let Some(val) = lookup("ONIONNET_HOP_TIMEOUT_SECS") {
            self.router.hop_timeout_secs = parse_var("ONIONNET_HOP_TIMEOUT_SECS", &val)?;
        }
        if let Some(val) = lookup("ONIONNET_KEY_ESCROW") {
            self.directory.key_escrow = parse_var("ONIONNET_KEY_ESCROW", &val)?;
        }
        if let Some(val) = lookup("ONIONNET_HOST") {
            self.network.host = val;
        }
        if let Some(val) = lookup("ONIONNET_REGISTRY_PORT") {
            self.network.registry_port = parse_var("ONIONNET_REGISTRY_PORT", &val)?;
        }
        if let Some(val) = lookup("ONIONNET_BASE_RELAY_PORT") {
            self.network.base_relay_port = parse_var("ONIONNET_BASE_RELAY_PORT", &val)?;
        }
        if let Some(val) = lookup("ONIONNET_BASE_USER_PORT") {
            self.network.base_user_port = parse_var("ONIONNET_BASE_USER_PORT", &val)?;
        }
        if let Some(val) = lookup("ONIONNET_RELAYS") {
            self.network.relays = parse_var("ONIONNET_RELAYS", &val)?;
        }
        if let Some(val) = lookup("ONIONNET_USERS") {
            self.network.users = parse_var("ONIONNET_USERS", &val)?;
        }
        Ok(())
    }

    /// Rejects configurations that cannot produce a working network.
    pub fn validate(&self) -> Result<()> {
        if self.router.circuit_length == 0 {
            return Err(RoutingError::InvalidConfig(
                "circuit_length must be at least 1".to_string(),
            ));
        }
        if self.router.hop_timeout_secs == 0 {
            return Err(RoutingError::InvalidConfig(
                "hop_timeout_secs must be positive".to_string(),
            ));
        }

        let net = &self.network;
        let relays = port_range(net.base_relay_port, net.relays, "relay")?;
        let users = port_range(net.base_user_port, net.users, "user")?;
        let registry = (u32::from(net.registry_port), u32::from(net.registry_port) + 1);

        for (a, b, what) in [
            (relays, users, "relay and user"),
            (relays, registry, "relay and registry"),
            (users, registry, "user and registry"),
        ] {
            if a.0 < b.1 && b.0 < a.1 {
                return Err(RoutingError::InvalidConfig(format!(
                    "{what} port ranges overlap"
                )));
            }
        }
        Ok(())
    }
}

fn port_range(base: u16, count: usize, what: &str) -> Result<(u32, u32)> {
    let start = u32::from(base);
    let end = u32::try_from(count)
        .ok()
        .and_then(|count| start.checked_add(count))
        .filter(|end| *end <= u32::from(u16::MAX) + 1)
        .ok_or_else(|| {
            RoutingError::InvalidConfig(format!("{count} {what}s do not fit above port {base}"))
        })?;
    Ok((start, end))
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| RoutingError::InvalidConfig(format!("{key}={value}: {e}")))
}
