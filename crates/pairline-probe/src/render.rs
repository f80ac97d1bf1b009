//! Text rendering of the view for the log.

use std::fmt::Write;

use pairline_app::ViewState;
use pairline_client::{Notification, NotificationLevel};

/// One-line summary of the session.
pub fn status_line(view: &ViewState) -> String {
    let mut line = format!(
        "state={} channel={} media={:?}",
        view.state,
        if view.channel_connected { "up" } else { "down" },
        view.media
    );

    let room = if view.room_id.is_empty() { "-" } else { view.room_id.as_str() };
    let peers = if view.peers.is_empty() {
        "-".to_string()
    } else {
        view.peers.iter().map(|p| p.id.as_str()).collect::<Vec<_>>().join(",")
    };
    let _ = write!(line, " room={room} peers={peers}");

    if view.timer_value < 0 {
        line.push_str(" timer=-");
    } else {
        let _ = write!(line, " timer={}", view.timer_value);
        if view.timer_extended {
            line.push('+');
        }
    }

    let _ = write!(
        line,
        " online={} busy={} friends={} requests={}/{}",
        view.online_count,
        view.busy_count,
        view.friends.len(),
        view.incoming_requests.len(),
        view.outgoing_requests.len()
    );
    line
}

/// One notification as a log line.
pub fn notification_line(notification: &Notification) -> String {
    let level = match notification.level {
        NotificationLevel::Info => "info",
        NotificationLevel::Success => "ok",
        NotificationLevel::Warning => "warn",
        NotificationLevel::Error => "error",
    };

    let mut line = format!("[{level}] {}", notification.title);
    if let Some(message) = &notification.message {
        let _ = write!(line, ": {message}");
    }
    if notification.retryable {
        line.push_str(" (type 'retry')");
    }
    line
}

#[cfg(test)]
mod tests {
    use pairline_client::{MediaState, SessionState};
    use pairline_proto::Profile;

    use super::*;

    #[test]
    fn idle_status() {
        insta::assert_snapshot!(
            status_line(&ViewState::default()),
            @"state=idle channel=down media=Disconnected room=- peers=- timer=- online=0 busy=0 friends=0 requests=0/0"
        );
    }

    #[test]
    fn call_status() {
        let view = ViewState {
            state: SessionState::Connected,
            channel_connected: true,
            media: MediaState::Connected,
            room_id: "r1".into(),
            peers: vec![Profile::with_id("p1"), Profile::with_id("p2")],
            timer_value: 95,
            timer_extended: true,
            online_count: 3,
            friends: vec!["p1".into()],
            ..ViewState::default()
        };
        insta::assert_snapshot!(
            status_line(&view),
            @"state=connected channel=up media=Connected room=r1 peers=p1,p2 timer=95+ online=3 busy=0 friends=1 requests=0/0"
        );
    }

    #[test]
    fn retryable_notification() {
        let notification = Notification::new(NotificationLevel::Warning, "Unfortunately that didn't work")
            .with_message("refused")
            .retryable();
        insta::assert_snapshot!(
            notification_line(&notification),
            @"[warn] Unfortunately that didn't work: refused (type 'retry')"
        );
    }
}
