//! Command-line arguments.

use std::time::Duration;

use clap::Parser;
use pairline_client::{ChannelConfig, ClientConfig, Credentials, Endpoint};
use pairline_core::config::DEFAULT_PATH;

/// Pairline matching probe
#[derive(Parser, Debug, Clone)]
#[command(name = "pairline-probe")]
#[command(about = "Drive a Pairline matching client from the command line")]
#[command(version)]
pub struct ProbeArgs {
    /// Signaling server host, with optional port
    #[arg(long, default_value = "localhost:3000")]
    pub host: String,

    /// URL scheme: ws, wss, http or https
    #[arg(long, default_value = "wss")]
    pub scheme: String,

    /// Socket.IO path on the server
    #[arg(long, default_value = DEFAULT_PATH)]
    pub path: String,

    /// User id to authenticate as
    #[arg(short, long, env = "PAIRLINE_USER")]
    pub user: String,

    /// Auth token for the user
    #[arg(short, long, env = "PAIRLINE_TOKEN")]
    pub token: String,

    /// Media server URL handed to the media session
    #[arg(long, default_value = "")]
    pub media_url: String,

    /// Join calls with the microphone muted
    #[arg(long)]
    pub no_microphone: bool,

    /// Seconds to wait for a request acknowledgment
    #[arg(long, default_value = "5")]
    pub ack_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl ProbeArgs {
    /// Client configuration for these arguments.
    pub fn client_config(&self) -> ClientConfig {
        let endpoint =
            Endpoint { scheme: self.scheme.clone(), host: self.host.clone(), path: self.path.clone() };
        ClientConfig {
            channel: ChannelConfig {
                endpoint,
                ack_timeout: Duration::from_secs(self.ack_timeout),
                ..ChannelConfig::default()
            },
            media_url: self.media_url.clone(),
            enable_microphone: !self.no_microphone,
            ..ClientConfig::default()
        }
    }

    /// Credentials for these arguments.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.user.clone(), self.token.clone())
    }
}
