// Listener configuration for a listener-backed server.

use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::error::ServerError;

const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_READ_HEADER_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(90);
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(90);

/// Bind, TLS and connection settings of one server.
///
/// A zero duration disables the corresponding limit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerConfig {
    /// `host:port`; a bare `:port` binds every interface.
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConfig>,

    /// Longest wait for each chunk of a request body.
    #[serde(default = "default_read_timeout", with = "humantime_serde")]
    pub read_timeout: Duration,
    /// Longest wait for the request head; the connection is dropped past it.
    #[serde(default = "default_read_header_timeout", with = "humantime_serde")]
    pub read_header_timeout: Duration,
    /// Handlers slower than this are answered with `408 Request Timeout`.
    #[serde(default = "default_write_timeout", with = "humantime_serde")]
    pub write_timeout: Duration,
    /// Zero turns HTTP/1 keep-alive off.
    #[serde(default = "default_idle_timeout", with = "humantime_serde")]
    pub idle_timeout: Duration,
    /// HTTP/1 read buffer limit, floored at 8 KiB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_header_bytes: Option<usize>,
    /// TCP keep-alive idle time of accepted connections.
    #[serde(default = "default_keep_alive", with = "humantime_serde")]
    pub keep_alive: Duration,
}

fn default_read_timeout() -> Duration {
    DEFAULT_READ_TIMEOUT
}

fn default_read_header_timeout() -> Duration {
    DEFAULT_READ_HEADER_TIMEOUT
}

fn default_write_timeout() -> Duration {
    DEFAULT_WRITE_TIMEOUT
}

fn default_idle_timeout() -> Duration {
    DEFAULT_IDLE_TIMEOUT
}

fn default_keep_alive() -> Duration {
    DEFAULT_KEEP_ALIVE
}

/// PEM encoded certificate chain and private key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TlsConfig {
    #[serde(rename = "cert_file")]
    pub cert_file: PathBuf,
    #[serde(rename = "key_file")]
    pub key_file: PathBuf,
}

impl ServerConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            tls: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
            read_header_timeout: DEFAULT_READ_HEADER_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_header_bytes: None,
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }

    pub fn with_tls(mut self, cert_file: impl Into<PathBuf>, key_file: impl Into<PathBuf>) -> Self {
        self.tls = Some(TlsConfig {
            cert_file: cert_file.into(),
            key_file: key_file.into(),
        });
        self
    }

    /// Checks the address shape and the presence of TLS material.
    pub fn validate(&self) -> Result<(), ServerError> {
        let Some((_, port)) = self.address.rsplit_once(':') else {
            return Err(self.invalid("missing port"));
        };
        if port.parse::<u16>().is_err() {
            return Err(self.invalid("port is not a number"));
        }

        if let Some(tls) = &self.tls {
            for path in [&tls.cert_file, &tls.key_file] {
                if !path.exists() {
                    return Err(ServerError::Tls(Arc::new(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("file not found: {}", path.display()),
                    ))));
                }
            }
        }

        Ok(())
    }

    /// Resolves the configured address to the socket address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let address = if self.address.starts_with(':') {
            format!("0.0.0.0{}", self.address)
        } else {
            self.address.clone()
        };

        address
            .to_socket_addrs()
            .map_err(|e| self.invalid(&e.to_string()))?
            .next()
            .ok_or_else(|| self.invalid("address resolved to nothing"))
    }

    fn invalid(&self, reason: &str) -> ServerError {
        ServerError::InvalidAddress {
            address: self.address.clone(),
            reason: reason.to_string(),
        }
    }
}
