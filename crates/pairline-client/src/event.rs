//! Client events and actions.

use pairline_core::SessionState;

/// Matching context.
///
/// Only one kind is active at a time. Inbound match events are routed to the
/// active kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// Random global matching.
    Global,
    /// Matching through a direct invite.
    Invite,
    /// Matching inside a scheduled event.
    Event,
}

/// Media session connection state as observed from the outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MediaState {
    /// No session.
    #[default]
    Disconnected,
    /// Connect in progress.
    Connecting,
    /// Session up.
    Connected,
    /// Session recovering from a network change.
    Reconnecting,
    /// Close in progress.
    Disconnecting,
}

/// Top-level UI section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    /// The matching screen.
    #[default]
    Matching,
    /// Any other screen.
    Other,
}

/// Severity of a user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    /// Informational.
    Info,
    /// Something good happened.
    Success,
    /// Recoverable problem.
    Warning,
    /// Failure.
    Error,
}

/// User-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Headline.
    pub title: String,
    /// Optional detail line.
    pub message: Option<String>,
    /// Severity.
    pub level: NotificationLevel,
    /// The user can retry the failed operation (see `ClientEvent::RetryMedia`).
    pub retryable: bool,
}

impl Notification {
    /// Notification without detail.
    pub fn new(level: NotificationLevel, title: impl Into<String>) -> Self {
        Self { title: title.into(), message: None, level, retryable: false }
    }

    /// Attach a detail line.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Mark as retryable.
    #[must_use]
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

/// Acknowledged request awaiting completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `skipCall`.
    Skip,
    /// `changeUserOnline`.
    ChangeOnline {
        /// Requested online flag.
        online: bool,
        /// Requested busy flag.
        busy: bool,
    },
    /// `connectUserRequest`.
    ConnectUser {
        /// Target user.
        user_id: String,
    },
    /// `cancelConnectUserRequest`.
    CancelConnectUser {
        /// Target user.
        user_id: String,
    },
    /// `removeUserRequest`.
    RemoveUser {
        /// Target user.
        user_id: String,
    },
}

/// Events the caller feeds into the client.
///
/// Generic over `I` (Instant type) to support both production
/// (`std::time::Instant`) and simulated clocks.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent<I = std::time::Instant> {
    /// Open the signaling channel.
    Start,
    /// Signaling transport opened.
    TransportOpened,
    /// Text frame received on the signaling transport.
    TransportText(String),
    /// Signaling transport closed or failed.
    TransportClosed {
        /// Why the transport closed.
        reason: String,
    },
    /// Time tick for timeouts and reconnects.
    Tick {
        /// Current time from the environment.
        now: I,
    },

    /// User wants to start matching.
    StartMatching,
    /// User skipped the current pairing.
    Skip,
    /// User ended the call.
    EndCall {
        /// State to settle in once teardown starts.
        target: SessionState,
        /// Mirror the call-intent change to the server.
        notify: bool,
    },
    /// Ask for more call time.
    ExtendTimer {
        /// Seconds to add.
        seconds: u32,
    },
    /// Switch matching context.
    ChangeKind(CallKind),

    /// Send a connect request.
    ConnectUser {
        /// Target user.
        user_id: String,
    },
    /// Withdraw a connect request.
    CancelConnectUser {
        /// Target user.
        user_id: String,
    },
    /// Remove a connection.
    RemoveUser {
        /// Target user.
        user_id: String,
    },
    /// Announce presence.
    ChangeOnlineStatus {
        /// Online flag.
        online: bool,
        /// Busy flag.
        busy: bool,
    },

    /// Media session reported a new connection state.
    MediaStateChanged(MediaState),
    /// Media session connect failed.
    MediaConnectFailed {
        /// Error description.
        reason: String,
    },
    /// Enabling the camera failed. The call continues.
    CameraFailed {
        /// Error description.
        reason: String,
    },
    /// User asked to retry a failed media connect.
    RetryMedia,

    /// UI switched tabs.
    TabChanged(Tab),
    /// Push notification or deep link asks to join matching.
    CallRequested,
    /// Authentication was lost.
    AuthLost,
    /// Tear everything down.
    Shutdown,
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAction {
    /// Open the signaling WebSocket.
    OpenTransport {
        /// Engine.IO URL.
        url: String,
    },
    /// Send a text frame on the signaling WebSocket.
    Transmit(String),
    /// Close the signaling WebSocket.
    CloseTransport,

    /// Connect the media session. Report the result with
    /// `MediaStateChanged` or `MediaConnectFailed`.
    ConnectMedia {
        /// Media server URL.
        url: String,
        /// Access token.
        token: String,
        /// Publish microphone on connect.
        enable_microphone: bool,
    },
    /// Disconnect the media session.
    DisconnectMedia,
    /// Enable the local camera. Report failure with `CameraFailed`.
    EnableCamera,

    /// Show a notification.
    Notify(Notification),
    /// Dismiss the current notification.
    DismissNotification,
    /// Play the waiting loop.
    PlayWaitingAudio,
    /// Stop any ambient audio.
    StopAudio,

    /// Session state changed.
    StateChanged {
        /// Previous state.
        from: SessionState,
        /// New state.
        to: SessionState,
    },
    /// A connect request became mutual.
    FriendAdded {
        /// New friend.
        user_id: String,
    },
    /// An acknowledged request finished.
    RequestCompleted {
        /// The request.
        request: Request,
        /// Whether the server confirmed it. `false` covers timeouts and
        /// malformed acks.
        success: bool,
    },
    /// Signaling channel availability changed.
    ChannelStatus {
        /// Channel is connected.
        connected: bool,
    },
}
