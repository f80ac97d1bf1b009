//! Channel configuration.

use std::time::Duration;

use url::Url;

use crate::error::ChannelError;

/// Time to wait for an acknowledgment before reporting `TimedOut`.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// First reconnect delay after a transport loss.
pub const DEFAULT_RECONNECT_INITIAL: Duration = Duration::from_secs(1);

/// Upper bound on the reconnect delay.
pub const DEFAULT_RECONNECT_MAX: Duration = Duration::from_secs(5);

/// Time allowed from opening the transport to the namespace CONNECT reply.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default Socket.IO mount path on the signaling server.
pub const DEFAULT_PATH: &str = "/bridge";

/// Signaling server location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// `ws`, `wss`, `http` or `https`. HTTP schemes map to their WebSocket
    /// counterparts.
    pub scheme: String,
    /// Host with optional port.
    pub host: String,
    /// Socket.IO mount path.
    pub path: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self { scheme: "wss".to_string(), host: "localhost".to_string(), path: DEFAULT_PATH.to_string() }
    }
}

impl Endpoint {
    /// Endpoint on `host` with default scheme and path.
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into(), ..Self::default() }
    }

    /// Engine.IO WebSocket URL:
    /// `<scheme>://<host><path>/?EIO=4&transport=websocket`.
    ///
    /// # Errors
    ///
    /// - `ChannelError::InvalidEndpoint` for an unknown scheme, empty host
    ///   or unparseable result
    pub fn url(&self) -> Result<Url, ChannelError> {
        let scheme = match self.scheme.to_ascii_lowercase().as_str() {
            "ws" | "http" => "ws",
            "wss" | "https" => "wss",
            other => return Err(ChannelError::InvalidEndpoint(format!("unsupported scheme {other}"))),
        };

        if self.host.is_empty() {
            return Err(ChannelError::InvalidEndpoint("empty host".to_string()));
        }

        let path = self.path.trim_end_matches('/');
        let path = if path.is_empty() || path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        let mut url = Url::parse(&format!("{scheme}://{}{path}/", self.host))?;
        url.query_pairs_mut().append_pair("EIO", "4").append_pair("transport", "websocket");
        Ok(url)
    }
}

/// Configuration for [`crate::EventChannel`].
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Server location.
    pub endpoint: Endpoint,
    /// Acknowledgment deadline for `send_with_ack`.
    pub ack_timeout: Duration,
    /// First reconnect delay.
    pub reconnect_initial: Duration,
    /// Reconnect delay cap.
    pub reconnect_max: Duration,
    /// Handshake deadline.
    pub connect_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            reconnect_initial: DEFAULT_RECONNECT_INITIAL,
            reconnect_max: DEFAULT_RECONNECT_MAX,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ChannelConfig {
    /// Delay before reconnect attempt number `attempt` (1-based):
    /// `min(initial * 2^(attempt - 1), max)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.reconnect_initial.saturating_mul(1 << exponent).min(self.reconnect_max)
    }
}

/// Identity presented to the signaling server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// User id.
    pub user_id: String,
    /// Auth token.
    pub token: String,
}

impl Credentials {
    /// Build credentials.
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), token: token.into() }
    }

    /// Both fields are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.user_id.is_empty() && !self.token.is_empty()
    }
}
