//! Tunable settings for a transport and its blocking façade.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default operation timeout for the blocking façade.
const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);
/// Default read buffer capacity in bytes.
const DEFAULT_READ_BUFFER_CAPACITY: usize = 8192;
/// Default depth of the outbound write queue.
const DEFAULT_WRITE_QUEUE_DEPTH: usize = 64;

/// A setting the builder refused to accept, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigError {
    setting: &'static str,
    reason: &'static str,
}

impl ConfigError {
    fn rejected(setting: &'static str, reason: &'static str) -> Self {
        Self { setting, reason }
    }

    /// Returns the name of the rejected setting.
    pub fn setting(&self) -> &str {
        self.setting
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid setting `{}`: {}", self.setting, self.reason)
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for a client transport.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    address: SocketAddr,
    connect_timeout: Duration,
    operation_timeout: Duration,
    no_delay: bool,
    read_buffer_capacity: usize,
    write_queue_depth: usize,
}

impl ClientConfig {
    /// Creates a builder with the target peer address.
    pub fn builder(address: SocketAddr) -> ClientConfigBuilder {
        ClientConfigBuilder::new(address)
    }

    /// Returns the peer address.
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Returns the connection timeout duration.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the operation timeout applied by the blocking façade.
    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    /// Returns whether TCP_NODELAY is set on the connection.
    pub fn no_delay(&self) -> bool {
        self.no_delay
    }

    /// Returns the initial read buffer capacity in bytes.
    pub fn read_buffer_capacity(&self) -> usize {
        self.read_buffer_capacity
    }

    /// Returns the depth of the outbound write queue.
    pub fn write_queue_depth(&self) -> usize {
        self.write_queue_depth
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    address: SocketAddr,
    connect_timeout: Duration,
    operation_timeout: Duration,
    no_delay: bool,
    read_buffer_capacity: usize,
    write_queue_depth: usize,
}

impl ClientConfigBuilder {
    /// Creates a new builder targeting the given peer address.
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            no_delay: true,
            read_buffer_capacity: DEFAULT_READ_BUFFER_CAPACITY,
            write_queue_depth: DEFAULT_WRITE_QUEUE_DEPTH,
        }
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the operation timeout applied by the blocking façade.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Sets whether TCP_NODELAY is enabled.
    pub fn no_delay(mut self, no_delay: bool) -> Self {
        self.no_delay = no_delay;
        self
    }

    /// Sets the initial read buffer capacity in bytes.
    pub fn read_buffer_capacity(mut self, capacity: usize) -> Self {
        self.read_buffer_capacity = capacity;
        self
    }

    /// Sets the depth of the outbound write queue.
    pub fn write_queue_depth(mut self, depth: usize) -> Self {
        self.write_queue_depth = depth;
        self
    }

    /// Validates the configuration and builds a [`ClientConfig`].
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::rejected("connect_timeout", "must be non-zero"));
        }
        if self.operation_timeout.is_zero() {
            return Err(ConfigError::rejected("operation_timeout", "must be non-zero"));
        }
        if self.read_buffer_capacity == 0 {
            return Err(ConfigError::rejected(
                "read_buffer_capacity",
                "must be non-zero",
            ));
        }
        if self.write_queue_depth == 0 {
            return Err(ConfigError::rejected("write_queue_depth", "must be non-zero"));
        }

        Ok(ClientConfig {
            address: self.address,
            connect_timeout: self.connect_timeout,
            operation_timeout: self.operation_timeout,
            no_delay: self.no_delay,
            read_buffer_capacity: self.read_buffer_capacity,
            write_queue_depth: self.write_queue_depth,
        })
    }
}
