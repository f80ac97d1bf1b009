//! Client configuration.

use pairline_core::ChannelConfig;

/// Call length reported in `joinedVideo`, in seconds.
pub const DEFAULT_MEET_TIME_SECS: u64 = 180;

/// Configuration for [`crate::Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Signaling channel settings.
    pub channel: ChannelConfig,
    /// Media server URL handed to the media session on connect.
    pub media_url: String,
    /// Call length reported to the server when video is joined.
    pub meet_time_secs: u64,
    /// Publish the microphone when the media session connects.
    pub enable_microphone: bool,
    /// Play the waiting loop while searching.
    pub waiting_sound: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::default(),
            media_url: String::new(),
            meet_time_secs: DEFAULT_MEET_TIME_SECS,
            enable_microphone: true,
            waiting_sound: true,
        }
    }
}
