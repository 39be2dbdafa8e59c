//! Server configuration from environment and command line.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{Result, ServerError};

/// Default listen address for the dashboard.
pub const DEFAULT_API_ADDR: &str = "0.0.0.0:3000";

/// Configuration for the dashboard server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisConfig {
    /// HTTP listen address
    pub api_addr: SocketAddr,

    /// JSON telemetry document to serve; empty store when unset
    pub telemetry_path: Option<PathBuf>,
}

impl Default for VisConfig {
    fn default() -> Self {
        Self {
            api_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            telemetry_path: None,
        }
    }
}

impl VisConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_addr = lookup("CERTMON_API_ADDR")
            .unwrap_or_else(|| DEFAULT_API_ADDR.to_string());
        let api_addr = api_addr
            .parse()
            .map_err(|_| ServerError::Config(format!("invalid CERTMON_API_ADDR: {api_addr}")))?;

        let telemetry_path = lookup("CERTMON_TELEMETRY")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            api_addr,
            telemetry_path,
        })
    }

    /// Apply positional arguments: `[telemetry.json] [port]`.
    pub fn with_args<I, S>(mut self, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = args.into_iter();
        if let Some(path) = args.next() {
            self.telemetry_path = Some(PathBuf::from(path.as_ref()));
        }
        if let Some(port) = args.next() {
            let port = port.as_ref();
            let port: u16 = port
                .parse()
                .map_err(|_| ServerError::Config(format!("invalid port: {port}")))?;
            self.api_addr.set_port(port);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = VisConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, VisConfig::default());
    }

    #[test]
    fn env_overrides_defaults() {
        let config = VisConfig::from_lookup(lookup(&[
            ("CERTMON_API_ADDR", "127.0.0.1:8088"),
            ("CERTMON_TELEMETRY", "/var/lib/certmon/telemetry.json"),
        ]))
        .unwrap();
        assert_eq!(config.api_addr.port(), 8088);
        assert_eq!(
            config.telemetry_path,
            Some(PathBuf::from("/var/lib/certmon/telemetry.json"))
        );
    }

    #[test]
    fn bad_address_is_config_error() {
        let err = VisConfig::from_lookup(lookup(&[("CERTMON_API_ADDR", "nowhere")])).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn args_override_path_and_port() {
        let config = VisConfig::default().with_args(["t.json", "4000"]).unwrap();
        assert_eq!(config.telemetry_path, Some(PathBuf::from("t.json")));
        assert_eq!(config.api_addr.port(), 4000);

        assert!(VisConfig::default().with_args(["t.json", "port"]).is_err());
    }
}
