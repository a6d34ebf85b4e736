use std::net::SocketAddr;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("LEAGUE_BIND_ADDR is not a socket address: {0}")]
    BindAddr(String),
}

/// Process configuration read from the environment.
/// JWT settings are read by `session::TokenConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueConfig {
    pub bind_addr: SocketAddr,
    /// In-memory store when unset
    pub database_url: Option<String>,
    /// Account promoted to ADMIN at startup
    pub bootstrap_admin_email: Option<String>,
}

impl LeagueConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_addr = lookup("LEAGUE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| ConfigError::BindAddr(raw_addr.clone()))?;
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            bind_addr,
            database_url: non_empty("DATABASE_URL"),
            bootstrap_admin_email: non_empty("LEAGUE_BOOTSTRAP_ADMIN_EMAIL"),
        })
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
    fn defaults_to_in_memory_on_port_3000() {
        let config = LeagueConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.port(), 3000);
        assert!(config.database_url.is_none());
        assert!(config.bootstrap_admin_email.is_none());
    }

    #[test]
    fn reads_overrides_and_ignores_blank_values() {
        let config = LeagueConfig::from_lookup(lookup(&[
            ("LEAGUE_BIND_ADDR", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://league@localhost/league"),
            ("LEAGUE_BOOTSTRAP_ADMIN_EMAIL", "  "),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://league@localhost/league")
        );
        assert!(config.bootstrap_admin_email.is_none());
    }

    #[test]
    fn rejects_bad_bind_addr() {
        let err = LeagueConfig::from_lookup(lookup(&[("LEAGUE_BIND_ADDR", "nowhere")]));
        assert!(matches!(err, Err(ConfigError::BindAddr(_))));
    }
}
