//! Fake media session.
//!
//! Stands in for the SFU client. Connects succeed and report `Connected`
//! unless a test scripts a refusal, holds the connect open, or drops the
//! link. Every state it reports is returned to the caller so the driver can
//! feed it back to the client as an event.

use pairline_app::MediaError;
use pairline_client::MediaState;

/// Scriptable media session.
#[derive(Debug, Clone)]
pub struct SimMedia {
    state: MediaState,
    refuse_next: u32,
    camera_broken: bool,
    hold_connect: bool,
    connects: u32,
    disconnects: u32,
    last_token: Option<String>,
    microphone: bool,
}

impl Default for SimMedia {
    fn default() -> Self {
        Self::new()
    }
}

impl SimMedia {
    /// Session that connects immediately.
    pub fn new() -> Self {
        Self {
            state: MediaState::Disconnected,
            refuse_next: 0,
            camera_broken: false,
            hold_connect: false,
            connects: 0,
            disconnects: 0,
            last_token: None,
            microphone: false,
        }
    }

    /// Refuse the next `count` connect attempts.
    pub fn refuse_connects(&mut self, count: u32) {
        self.refuse_next = count;
    }

    /// Make the camera fail to start.
    pub fn break_camera(&mut self) {
        self.camera_broken = true;
    }

    /// Leave connects in `Connecting` until [`SimMedia::complete_connect`].
    pub fn hold_connects(&mut self, hold: bool) {
        self.hold_connect = hold;
    }

    /// Connect to a room. Returns the states to report.
    pub fn connect(
        &mut self,
        token: &str,
        enable_microphone: bool,
    ) -> Result<Vec<MediaState>, MediaError> {
        self.connects += 1;
        self.last_token = Some(token.to_string());
        self.microphone = enable_microphone;

        if self.refuse_next > 0 {
            self.refuse_next -= 1;
            self.state = MediaState::Disconnected;
            return Err(MediaError::Connect("room refused the participant".into()));
        }

        self.state = MediaState::Connecting;
        if self.hold_connect {
            return Ok(vec![MediaState::Connecting]);
        }
        self.state = MediaState::Connected;
        Ok(vec![MediaState::Connecting, MediaState::Connected])
    }

    /// Finish a held connect.
    pub fn complete_connect(&mut self) -> Vec<MediaState> {
        if self.state != MediaState::Connecting {
            return Vec::new();
        }
        self.state = MediaState::Connected;
        vec![MediaState::Connected]
    }

    /// Leave the room.
    pub fn disconnect(&mut self) -> Vec<MediaState> {
        self.disconnects += 1;
        if self.state == MediaState::Disconnected {
            return Vec::new();
        }
        self.state = MediaState::Disconnected;
        vec![MediaState::Disconnecting, MediaState::Disconnected]
    }

    /// Network blip: the session starts reconnecting.
    pub fn blip(&mut self) -> Vec<MediaState> {
        if self.state != MediaState::Connected {
            return Vec::new();
        }
        self.state = MediaState::Reconnecting;
        vec![MediaState::Reconnecting]
    }

    /// Recover from a blip.
    pub fn recover(&mut self) -> Vec<MediaState> {
        if self.state != MediaState::Reconnecting {
            return Vec::new();
        }
        self.state = MediaState::Connected;
        vec![MediaState::Connected]
    }

    /// The link is gone for good.
    pub fn lose(&mut self) -> Vec<MediaState> {
        if self.state == MediaState::Disconnected {
            return Vec::new();
        }
        self.state = MediaState::Disconnected;
        vec![MediaState::Disconnected]
    }

    /// Start the local camera.
    pub fn enable_camera(&mut self) -> Result<(), MediaError> {
        if self.camera_broken {
            return Err(MediaError::Camera("no camera permission".into()));
        }
        Ok(())
    }

    /// Current session state.
    pub fn state(&self) -> MediaState {
        self.state
    }

    /// Connect attempts so far.
    pub fn connects(&self) -> u32 {
        self.connects
    }

    /// Disconnect calls so far.
    pub fn disconnects(&self) -> u32 {
        self.disconnects
    }

    /// Token used by the last connect.
    pub fn last_token(&self) -> Option<&str> {
        self.last_token.as_deref()
    }

    /// Whether the last connect asked for the microphone.
    pub fn microphone(&self) -> bool {
        self.microphone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refusal_is_counted_down() {
        let mut media = SimMedia::new();
        media.refuse_connects(1);

        assert!(media.connect("t", true).is_err());
        assert_eq!(media.connect("t", true).ok(), Some(vec![
            MediaState::Connecting,
            MediaState::Connected
        ]));
        assert_eq!(media.connects(), 2);
    }

    #[test]
    fn held_connect_completes_once() {
        let mut media = SimMedia::new();
        media.hold_connects(true);

        assert_eq!(media.connect("t", false).ok(), Some(vec![MediaState::Connecting]));
        assert_eq!(media.complete_connect(), vec![MediaState::Connected]);
        assert!(media.complete_connect().is_empty());
    }

    #[test]
    fn disconnect_when_idle_reports_nothing() {
        let mut media = SimMedia::new();
        assert!(media.disconnect().is_empty());
        assert_eq!(media.disconnects(), 1);
    }
}
