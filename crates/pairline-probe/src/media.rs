//! Loopback media session.
//!
//! The probe has no SFU client. It accepts every connect that carries a media
//! URL and token and reports the same state sequence a real session would,
//! so the signaling side of a call can be exercised end to end.

use pairline_app::MediaError;
use pairline_client::MediaState;
use tracing::info;

/// Media session that connects instantly.
#[derive(Debug, Default)]
pub struct LoopbackMedia {
    state: MediaState,
    camera: bool,
}

impl LoopbackMedia {
    /// Disconnected session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Join a room. Returns the states to report.
    pub fn connect(
        &mut self,
        url: &str,
        token: &str,
        enable_microphone: bool,
    ) -> Result<Vec<MediaState>, MediaError> {
        if url.is_empty() {
            return Err(MediaError::Connect("no media url configured".into()));
        }
        if token.is_empty() {
            return Err(MediaError::Connect("empty access token".into()));
        }

        info!(%url, microphone = enable_microphone, "loopback media connected");
        self.state = MediaState::Connected;
        Ok(vec![MediaState::Connecting, MediaState::Connected])
    }

    /// Leave the room.
    pub fn disconnect(&mut self) -> Vec<MediaState> {
        self.camera = false;
        if self.state == MediaState::Disconnected {
            return Vec::new();
        }
        info!("loopback media disconnected");
        self.state = MediaState::Disconnected;
        vec![MediaState::Disconnecting, MediaState::Disconnected]
    }

    /// Turn the camera on. Only valid in a room.
    pub fn enable_camera(&mut self) -> Result<(), MediaError> {
        if self.state != MediaState::Connected {
            return Err(MediaError::Camera("not in a room".into()));
        }
        self.camera = true;
        Ok(())
    }

    /// Current state.
    pub fn state(&self) -> MediaState {
        self.state
    }

    /// Camera is publishing.
    pub fn camera(&self) -> bool {
        self.camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_needs_url_and_token() {
        let mut media = LoopbackMedia::new();
        assert!(matches!(media.connect("", "t", true), Err(MediaError::Connect(_))));
        assert!(matches!(media.connect("wss://m", "", true), Err(MediaError::Connect(_))));
        assert_eq!(media.state(), MediaState::Disconnected);
    }

    #[test]
    fn camera_follows_the_room() {
        let mut media = LoopbackMedia::new();
        assert!(media.enable_camera().is_err());

        media.connect("wss://m", "t", true).unwrap();
        media.enable_camera().unwrap();
        assert!(media.camera());

        assert_eq!(media.disconnect(), vec![MediaState::Disconnecting, MediaState::Disconnected]);
        assert!(!media.camera());
        assert!(media.disconnect().is_empty());
    }
}
