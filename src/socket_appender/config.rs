//! Configuration consumed by the socket appender lifecycle.
//!
//! [`SocketAppenderConfig`] holds the raw options as a user supplied them.
//! Values stay signed so out-of-range input (a negative queue size, a zero
//! port) survives until [`FemtoSocketAppender::start`] validates it and
//! reports every problem at once. Validation produces a [`ResolvedTarget`]
//! with the host looked up exactly once.
//!
//! [`FemtoSocketAppender::start`]: crate::FemtoAppender::start

use std::{
    io,
    net::{SocketAddr, ToSocketAddrs},
    time::Duration,
};

use thiserror::Error;

use crate::appender::AppenderError;

/// Default port of a remote log collector.
pub const DEFAULT_PORT: i64 = 4560;
/// Default delay between failed connection attempts (30 seconds).
pub const DEFAULT_RECONNECTION_DELAY_MS: i64 = 30_000;
/// Default queue size; zero makes delivery a synchronous hand-off.
pub const DEFAULT_QUEUE_SIZE: i64 = 0;
/// Default time allowed for a new connection to accept the encoder header.
pub const DEFAULT_ACCEPT_CONNECTION_TIMEOUT_MS: i64 = 5_000;
/// Largest accepted queue size. The queue allocates every slot up front.
pub const MAX_QUEUE_SIZE: i64 = 1 << 20;

/// Configuration problems detected when starting an appender.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no encoder set for the appender")]
    MissingEncoder,
    #[error("no remote host was configured for the appender")]
    MissingHost,
    #[error("port must be between 1 and 65535, got {0}")]
    InvalidPort(i64),
    #[error("queue size must be non-negative, got {0}")]
    NegativeQueueSize(i64),
    #[error("queue size must be at most {max}, got {size}")]
    QueueTooLarge { size: i64, max: i64 },
    #[error("{field} must be non-negative, got {value}")]
    NegativeDelay { field: &'static str, value: i64 },
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
    #[error("unknown configuration key {0:?}")]
    UnknownKey(String),
    #[error("invalid configuration file: {0}")]
    Ini(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Options recognised by the socket appender.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SocketAppenderConfig {
    pub remote_host: Option<String>,
    pub port: i64,
    /// Milliseconds between connection attempts; zero retries immediately.
    pub reconnection_delay_ms: i64,
    /// Events buffered while the connection is busy or down.
    pub queue_size: i64,
    /// Milliseconds a fresh connection may take to accept the encoder
    /// header; zero waits indefinitely.
    pub accept_connection_timeout_ms: i64,
}

impl Default for SocketAppenderConfig {
    fn default() -> Self {
        Self {
            remote_host: None,
            port: DEFAULT_PORT,
            reconnection_delay_ms: DEFAULT_RECONNECTION_DELAY_MS,
            queue_size: DEFAULT_QUEUE_SIZE,
            accept_connection_timeout_ms: DEFAULT_ACCEPT_CONNECTION_TIMEOUT_MS,
        }
    }
}

impl SocketAppenderConfig {
    /// Configuration targeting `host:port` with default tuning.
    pub fn new(host: impl Into<String>, port: i64) -> Self {
        Self {
            remote_host: Some(host.into()),
            port,
            ..Self::default()
        }
    }

    /// Collect every configuration problem. An empty result means the
    /// configuration is usable.
    pub fn validate(&self, has_encoder: bool) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if !has_encoder {
            errors.push(ConfigError::MissingEncoder);
        }
        if !(1..=i64::from(u16::MAX)).contains(&self.port) {
            errors.push(ConfigError::InvalidPort(self.port));
        }
        if self
            .remote_host
            .as_deref()
            .is_none_or(|host| host.trim().is_empty())
        {
            errors.push(ConfigError::MissingHost);
        }
        if self.queue_size < 0 {
            errors.push(ConfigError::NegativeQueueSize(self.queue_size));
        } else if self.queue_size > MAX_QUEUE_SIZE {
            errors.push(ConfigError::QueueTooLarge {
                size: self.queue_size,
                max: MAX_QUEUE_SIZE,
            });
        }
        if self.reconnection_delay_ms < 0 {
            errors.push(ConfigError::NegativeDelay {
                field: "reconnection_delay_ms",
                value: self.reconnection_delay_ms,
            });
        }
        if self.accept_connection_timeout_ms < 0 {
            errors.push(ConfigError::NegativeDelay {
                field: "accept_connection_timeout_ms",
                value: self.accept_connection_timeout_ms,
            });
        }
        errors
    }

    /// Validate and resolve the remote host once.
    pub fn resolve(&self, has_encoder: bool) -> Result<ResolvedTarget, AppenderError> {
        let errors = self.validate(has_encoder);
        if !errors.is_empty() {
            return Err(AppenderError::InvalidConfig(errors));
        }
        // Host presence and port range were checked by `validate`.
        let host = self.remote_host.clone().unwrap_or_default();
        let port = u16::try_from(self.port).unwrap_or_default();
        let address = lookup(&host, port).map_err(|source| AppenderError::UnknownHost {
            host: host.clone(),
            source,
        })?;
        Ok(ResolvedTarget {
            peer_id: format!("remote peer {host}:{port}: "),
            host,
            port,
            address,
            reconnection_delay: millis(self.reconnection_delay_ms),
            queue_capacity: usize::try_from(self.queue_size).unwrap_or_default(),
            accept_timeout: Some(millis(self.accept_connection_timeout_ms))
                .filter(|timeout| !timeout.is_zero()),
        })
    }
}

fn millis(value: i64) -> Duration {
    Duration::from_millis(u64::try_from(value).unwrap_or_default())
}

fn lookup(host: &str, port: u16) -> io::Result<SocketAddr> {
    (host, port).to_socket_addrs()?.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no addresses found for {host}"),
        )
    })
}

/// Validated configuration with the remote address resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub host: String,
    pub port: u16,
    pub address: SocketAddr,
    pub reconnection_delay: Duration,
    pub queue_capacity: usize,
    /// `None` waits indefinitely.
    pub accept_timeout: Option<Duration>,
    /// Prefix for diagnostics, e.g. `"remote peer localhost:4560: "`.
    pub peer_id: String,
}
