//! Connection configuration and endpoint parsing

use crate::error::{RedisError, RedisResult};
use crate::secret::Secret;
use std::fmt;
use std::time::Duration;

/// Port used when the connection string does not specify one
pub const DEFAULT_PORT: u16 = 6379;

/// Network endpoint of a Redis-compatible server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Host name or address
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl Endpoint {
    /// Create an endpoint from host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Configuration for a protocol connection
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Connection string of the form `scheme://[user@]host[:port]`,
    /// e.g. `"redis://localhost:6379"` or `"redis://secret@redis.internal"`
    pub connection_string: String,

    /// Optional password for authentication; takes precedence over the
    /// connection string's user-info component
    pub password: Option<Secret>,

    /// Timeout for establishing the TCP connection
    pub connect_timeout: Duration,

    /// TCP keepalive period, if enabled
    pub tcp_keepalive: Option<Duration>,

    /// Disable Nagle's algorithm on the connection
    pub tcp_nodelay: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connection_string: "redis://localhost:6379".to_string(),
            password: None,
            connect_timeout: Duration::from_secs(5),
            tcp_keepalive: Some(Duration::from_secs(60)),
            tcp_nodelay: true,
        }
    }
}

impl ConnectionConfig {
    /// Create a new configuration with the given connection string
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            ..Default::default()
        }
    }

    /// Set the password for authentication
    pub fn with_password(mut self, password: impl Into<Secret>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set or disable TCP keepalive
    pub fn with_tcp_keepalive(mut self, keepalive: Option<Duration>) -> Self {
        self.tcp_keepalive = keepalive;
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn with_tcp_nodelay(mut self, nodelay: bool) -> Self {
        self.tcp_nodelay = nodelay;
        self
    }

    /// Parse the endpoint from the connection string
    ///
    /// The port defaults to 6379 when not given.
    pub fn endpoint(&self) -> RedisResult<Endpoint> {
        let authority = authority(self.connection_string.trim());
        let hostport = match authority.split_once('@') {
            Some((_, hostport)) => hostport,
            None => authority,
        };

        let (host, port) = match hostport.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    RedisError::Config(format!(
                        "invalid port in {:?}",
                        self.connection_string
                    ))
                })?;
                (host, port)
            }
            None => (hostport, DEFAULT_PORT),
        };

        if host.is_empty() {
            return Err(RedisError::Config(format!(
                "missing host in {:?}",
                self.connection_string
            )));
        }

        Ok(Endpoint::new(host, port))
    }

    /// The credential to authenticate with, if any
    ///
    /// An explicitly configured password wins; otherwise the connection
    /// string's user-info component is used.
    pub fn authentication(&self) -> Option<Secret> {
        if self.password.is_some() {
            return self.password.clone();
        }

        let authority = authority(self.connection_string.trim());
        match authority.split_once('@') {
            Some((user, _)) if !user.is_empty() => Some(Secret::from(user)),
            _ => None,
        }
    }
}

impl From<&str> for ConnectionConfig {
    fn from(connection_string: &str) -> Self {
        Self::new(connection_string)
    }
}

impl From<String> for ConnectionConfig {
    fn from(connection_string: String) -> Self {
        Self::new(connection_string)
    }
}

/// The `[user@]host[:port]` part of a connection string, scheme and any
/// trailing path stripped
fn authority(connection_string: &str) -> &str {
    let rest = match connection_string.find("://") {
        Some(position) => &connection_string[position + 3..],
        None => connection_string,
    };
    match rest.find('/') {
        Some(position) => &rest[..position],
        None => rest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_default_port() {
        let config = ConnectionConfig::new("redis://localhost");
        assert_eq!(config.endpoint().unwrap(), Endpoint::new("localhost", 6379));
    }

    #[test]
    fn test_endpoint_with_port() {
        let config = ConnectionConfig::new("redis://example.org:16379");
        assert_eq!(
            config.endpoint().unwrap(),
            Endpoint::new("example.org", 16379)
        );
    }

    #[test]
    fn test_endpoint_strips_user_info() {
        let config = ConnectionConfig::new("redis://secret@localhost:6380");
        assert_eq!(config.endpoint().unwrap(), Endpoint::new("localhost", 6380));
    }

    #[test]
    fn test_endpoint_without_scheme() {
        let config = ConnectionConfig::new("localhost:6379");
        assert_eq!(config.endpoint().unwrap(), Endpoint::new("localhost", 6379));
    }

    #[test]
    fn test_invalid_port() {
        let config = ConnectionConfig::new("redis://localhost:not-a-port");
        assert!(matches!(config.endpoint(), Err(RedisError::Config(_))));
    }

    #[test]
    fn test_missing_host() {
        let config = ConnectionConfig::new("redis://");
        assert!(matches!(config.endpoint(), Err(RedisError::Config(_))));
    }

    #[test]
    fn test_no_authentication() {
        let config = ConnectionConfig::new("redis://localhost");
        assert!(config.authentication().is_none());
    }

    #[test]
    fn test_authentication_from_user_info() {
        let config = ConnectionConfig::new("redis://secret@localhost");
        assert_eq!(config.authentication().unwrap().reveal(), b"secret");
    }

    #[test]
    fn test_explicit_password_wins() {
        let config = ConnectionConfig::new("redis://ignored@localhost").with_password("explicit");
        assert_eq!(config.authentication().unwrap().reveal(), b"explicit");
    }

    #[test]
    fn test_builder() {
        let config = ConnectionConfig::new("redis://localhost")
            .with_connect_timeout(Duration::from_secs(1))
            .with_tcp_keepalive(None)
            .with_tcp_nodelay(false);

        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert_eq!(config.tcp_keepalive, None);
        assert!(!config.tcp_nodelay);
    }

    #[test]
    fn test_endpoint_display() {
        assert_eq!(Endpoint::new("localhost", 6379).to_string(), "localhost:6379");
    }
}
