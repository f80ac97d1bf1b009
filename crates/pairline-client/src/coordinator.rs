//! Match coordinator.
//!
//! Owns the session machine and per-call data. Local operations and inbound
//! events never touch the channel directly: they push [`Effect`]s that the
//! client executes in order on the same control context.

use pairline_core::{AckError, Credentials, SessionMachine, SessionState, Transition, Trigger};
use pairline_proto::{
    AckPayload, AckReply, ChangeShouldCall, ChangeUserOnline, ConnectedUser, ExtendTimer, Inbound,
    JoinedVideo, Outbound, RoomCreated, RoomInfo, StartMatching, UserTarget,
};
use tracing::{debug, info, warn};

use crate::{
    error::ClientError,
    event::{CallKind, ClientAction, Notification, NotificationLevel, Request},
    presence::PresenceTracker,
    session_data::SessionData,
};

/// Work produced by the coordinator and the media bridge.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Effect {
    /// The session machine moved.
    Transition(Transition),
    /// Fire-and-forget server event.
    Emit(Outbound),
    /// Server event awaiting an ack.
    Request(Outbound, Request),
    /// Action for the caller.
    Action(ClientAction),
}

/// Drives one user's call lifecycle.
#[derive(Debug, Clone)]
pub struct MatchCoordinator {
    machine: SessionMachine,
    data: SessionData,
    should_call: bool,
    kind: Option<CallKind>,
    presence: PresenceTracker,
    skip_in_flight: bool,
    credentials: Option<Credentials>,
}

impl MatchCoordinator {
    /// Coordinator in `Idle` with no active kind.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            machine: SessionMachine::new(),
            data: SessionData::default(),
            should_call: false,
            kind: None,
            presence: PresenceTracker::new(),
            skip_in_flight: false,
            credentials: Some(credentials).filter(Credentials::is_complete),
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    /// Current call data.
    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Whether the user still wants to be in a call.
    pub fn should_call(&self) -> bool {
        self.should_call
    }

    /// Active matching kind.
    pub fn kind(&self) -> Option<CallKind> {
        self.kind
    }

    /// Presence and connect requests.
    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// A `skipCall` is awaiting its ack.
    pub fn skip_in_flight(&self) -> bool {
        self.skip_in_flight
    }

    /// Credentials used for matching and presence.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub(crate) fn transition(
        &mut self,
        to: SessionState,
        trigger: Trigger,
        out: &mut Vec<Effect>,
    ) -> bool {
        match self.machine.transition(to, trigger) {
            Ok(Some(transition)) => {
                out.push(Effect::Transition(transition));
                true
            },
            Ok(None) => false,
            Err(err) => {
                warn!(%err, "transition rejected");
                false
            },
        }
    }

    pub(crate) fn set_should_call(&mut self, value: bool, notify: bool, out: &mut Vec<Effect>) {
        if self.should_call == value {
            return;
        }

        debug!(should_call = value, notify, "call intent changed");
        self.should_call = value;
        if notify {
            out.push(Effect::Emit(Outbound::ChangeShouldCall(ChangeShouldCall { should_call: value })));
        }
    }

    fn start_request(&self) -> Result<StartMatching, ClientError> {
        let credentials = self.credentials.as_ref().ok_or(ClientError::MissingCredentials)?;
        Ok(StartMatching { id: credentials.user_id.clone(), token: credentials.token.clone() })
    }

    /// Join the matching queue. No-op unless `Idle`.
    pub(crate) fn start_matching(&mut self, out: &mut Vec<Effect>) -> Result<(), ClientError> {
        let state = self.state();
        if state != SessionState::Idle {
            debug!(%state, "start ignored");
            return Ok(());
        }

        let kind = *self.kind.get_or_insert(CallKind::Global);
        if kind != CallKind::Global {
            return Err(ClientError::UnsupportedKind(kind));
        }

        let request = self.start_request()?;
        info!("start matching");
        self.set_should_call(true, true, out);
        out.push(Effect::Emit(Outbound::StartMatching(request)));
        self.transition(SessionState::Searching, Trigger::LocalStart, out);
        Ok(())
    }

    /// Ask the server for a fresh match after a re-queue.
    pub(crate) fn restart_matching(&mut self, out: &mut Vec<Effect>) {
        match self.start_request() {
            Ok(request) => {
                info!("re-queueing");
                out.push(Effect::Emit(Outbound::StartMatching(request)));
            },
            Err(err) => warn!(%err, "re-queue skipped"),
        }
    }

    /// Leave the current pairing but stay queued.
    ///
    /// Only one `skipCall` is in flight at a time; repeats are ignored until
    /// its ack resolves.
    pub(crate) fn skip(&mut self, out: &mut Vec<Effect>) {
        let state = self.state();
        if self.skip_in_flight || matches!(state, SessionState::Idle | SessionState::Disconnecting) {
            debug!(%state, in_flight = self.skip_in_flight, "skip ignored");
            return;
        }

        info!(%state, room_id = %self.data.room_id, "skip");
        self.skip_in_flight = true;
        out.push(Effect::Request(Outbound::SkipCall, Request::Skip));
        self.data.reset();
        out.push(Effect::Action(ClientAction::DisconnectMedia));
        out.push(Effect::Action(ClientAction::DismissNotification));

        if matches!(state, SessionState::Connecting | SessionState::Connected) {
            self.transition(SessionState::Disconnecting, Trigger::LocalTeardown, out);
        }
    }

    /// End the call and settle in `target` (`Idle` or `Disconnecting`).
    ///
    /// With `Disconnecting` the media bridge finishes the teardown once the
    /// media session reports closed.
    pub(crate) fn end_call(&mut self, target: SessionState, notify: bool, out: &mut Vec<Effect>) {
        let state = self.state();
        if state == SessionState::Idle && !self.should_call {
            debug!("nothing to end");
            return;
        }
        if !matches!(target, SessionState::Idle | SessionState::Disconnecting) {
            warn!(%target, "unsupported end target");
            return;
        }

        info!(%state, %target, "end call");
        out.push(Effect::Emit(Outbound::End));
        self.set_should_call(false, notify, out);
        self.data.reset();
        out.push(Effect::Action(ClientAction::DisconnectMedia));

        if target == SessionState::Idle {
            self.transition(SessionState::Idle, Trigger::Forced, out);
        } else if state.is_active() {
            self.transition(SessionState::Disconnecting, Trigger::LocalTeardown, out);
        }
    }

    /// Switch the active kind, ending any call in progress.
    pub(crate) fn change_kind(&mut self, kind: CallKind, out: &mut Vec<Effect>) {
        if self.kind == Some(kind) {
            return;
        }

        self.end_call(SessionState::Idle, false, out);
        info!(?kind, previous = ?self.kind, "matching kind changed");
        self.kind = Some(kind);
        self.transition(SessionState::Idle, Trigger::Forced, out);
    }

    /// Drop to `Idle` without telling the server anything.
    pub(crate) fn force_idle(&mut self, out: &mut Vec<Effect>) {
        self.set_should_call(false, false, out);
        self.data.reset();
        self.skip_in_flight = false;
        self.transition(SessionState::Idle, Trigger::Forced, out);
    }

    /// The match data could not be used to join media.
    pub(crate) fn invalid_match(&mut self, out: &mut Vec<Effect>) {
        self.data.reset();
        self.transition(SessionState::Searching, Trigger::MatchInvalid, out);
    }

    /// Media went away under an active call.
    pub(crate) fn media_lost(&mut self, out: &mut Vec<Effect>) {
        self.data.reset();
        self.transition(SessionState::Disconnecting, Trigger::MediaLost, out);
    }

    pub(crate) fn joined_video(&mut self, meet_time: u64, out: &mut Vec<Effect>) {
        out.push(Effect::Emit(Outbound::JoinedVideo(JoinedVideo {
            room_id: self.data.room_id.clone(),
            meet_time,
        })));
    }

    pub(crate) fn extend_timer(&mut self, seconds: u32, out: &mut Vec<Effect>) {
        if self.data.room_id.is_empty() {
            debug!("extend ignored without room");
            return;
        }
        out.push(Effect::Emit(Outbound::ExtendTimer(ExtendTimer {
            room_id: self.data.room_id.clone(),
            seconds,
        })));
    }

    /// Announce presence. The ack carries the authoritative roster.
    pub(crate) fn change_online(
        &mut self,
        online: bool,
        busy: bool,
        out: &mut Vec<Effect>,
    ) -> Result<(), ClientError> {
        let credentials = self.credentials.as_ref().ok_or(ClientError::MissingCredentials)?;
        let event = Outbound::ChangeUserOnline(ChangeUserOnline {
            id: credentials.user_id.clone(),
            token: credentials.token.clone(),
            is_online: online,
            is_busy: busy,
        });

        self.presence.set_announced(online, busy);
        out.push(Effect::Request(event, Request::ChangeOnline { online, busy }));
        Ok(())
    }

    /// Re-send the last announced presence after a reconnect.
    pub(crate) fn announce(&mut self, out: &mut Vec<Effect>) {
        if let Some((online, busy)) = self.presence.announced()
            && let Err(err) = self.change_online(online, busy, out)
        {
            warn!(%err, "presence not re-announced");
        }
    }

    pub(crate) fn connect_user(&mut self, user_id: String, out: &mut Vec<Effect>) {
        let event = Outbound::ConnectUserRequest(UserTarget { to: user_id.clone() });
        out.push(Effect::Request(event, Request::ConnectUser { user_id }));
    }

    pub(crate) fn cancel_connect_user(&mut self, user_id: String, out: &mut Vec<Effect>) {
        let event = Outbound::CancelConnectUserRequest(UserTarget { to: user_id.clone() });
        out.push(Effect::Request(event, Request::CancelConnectUser { user_id }));
    }

    pub(crate) fn remove_user(&mut self, user_id: String, out: &mut Vec<Effect>) {
        let event = Outbound::RemoveUserRequest(UserTarget { to: user_id.clone() });
        out.push(Effect::Request(event, Request::RemoveUser { user_id }));
    }

    /// Apply a server push.
    pub(crate) fn on_inbound(&mut self, event: Inbound, out: &mut Vec<Effect>) {
        if is_match_event(&event) && self.kind != Some(CallKind::Global) {
            debug!(event = %event.name(), kind = ?self.kind, "match event for inactive kind dropped");
            return;
        }

        match event {
            Inbound::ShowNotification(notification) => {
                let title = notification.headline().unwrap_or("Notification").to_string();
                notify(out, Notification::new(NotificationLevel::Info, title));
            },
            Inbound::Error(error) => {
                warn!(text = %error.text, "server error");
                let mut notification = Notification::new(NotificationLevel::Error, error.text);
                notification.message = error.description;
                notify(out, notification);
            },
            Inbound::RoomCreated(room) => self.on_room_created(room),
            Inbound::PartnerInfo(info) => self.on_peer_info(info),
            Inbound::PartnerLeft { partner_id } => self.on_peer_left(&partner_id, out),
            Inbound::PartnerJoinedVideo { user_id } => self.on_peer_joined_video(user_id),
            Inbound::End => self.finish_call("server ended call", out),
            Inbound::TimerUpdate { timer_value } => self.on_timer_update(timer_value),
            Inbound::TimerExtended { timer_value } => {
                self.data.timer_value = timer_value;
                self.data.timer_extended = true;
            },
            Inbound::TimerEnded => self.finish_call("timer expired", out),
            Inbound::UserOnlineChanged(update) => self.presence.apply(update),
            Inbound::ConnectedUser(request) => self.on_connect_request(request, out),
            Inbound::RemovedUser { from } => {
                debug!(%from, "connection removed by peer");
                self.presence.requests_mut().removed_by_peer(&from);
            },
        }
    }

    fn on_room_created(&mut self, room: RoomCreated) {
        if self.state() == SessionState::Searching && self.data.room_id.is_empty() {
            debug!(room_id = %room.room_id, users = room.users.len(), "room created");
            self.data.room_id = room.room_id;
        }
    }

    fn on_peer_info(&mut self, info: RoomInfo) {
        let state = self.state();
        if state == SessionState::Idle {
            debug!(room_id = %info.room_id, "peer info while idle ignored");
            return;
        }

        let friends = info.my_profile.friends.clone();
        if !self.data.apply_room_info(info) {
            debug!(room_id = %self.data.room_id, "duplicate peer set ignored");
            return;
        }

        let merged = self.presence.requests_mut().merge_friends(&friends);
        info!(
            room_id = %self.data.room_id,
            peers = self.data.peers.len(),
            friends_merged = merged,
            %state,
            "match delivered"
        );
    }

    fn on_peer_left(&mut self, peer_id: &str, out: &mut Vec<Effect>) {
        if !self.data.remove_peer(peer_id) {
            debug!(peer_id, "unknown peer left");
            return;
        }

        info!(peer_id, remaining = self.data.peers.len(), "peer left");
        if self.data.peers.is_empty() {
            self.finish_call("last peer left", out);
        }
    }

    fn on_peer_joined_video(&mut self, user_id: String) {
        debug!(%user_id, "peer joined video");
        self.data.joined_video_peer_ids.insert(user_id);
    }

    fn on_timer_update(&mut self, timer_value: i64) {
        self.data.timer_value = timer_value;
    }

    /// Call ended without a local request.
    fn finish_call(&mut self, reason: &str, out: &mut Vec<Effect>) {
        let state = self.state();
        info!(%state, reason, "call finished");
        self.data.reset();

        if matches!(state, SessionState::Connecting | SessionState::Connected) {
            out.push(Effect::Action(ClientAction::DisconnectMedia));
            self.transition(SessionState::Disconnecting, Trigger::RemoteEnd, out);
        }
    }

    fn on_connect_request(&mut self, request: ConnectedUser, out: &mut Vec<Effect>) {
        let book = self.presence.requests_mut();
        if request.cancel {
            debug!(from = %request.from, "connect request withdrawn");
            book.peer_cancelled(&request.from);
            return;
        }

        if book.peer_requested(&request.from, request.is_friends) {
            friend_added(request.from, out);
        } else {
            debug!(from = %request.from, "connect request received");
        }
    }

    /// Resolve an acknowledged request.
    ///
    /// Timeouts, transport failures and malformed acks all count as failure
    /// and leave local state unchanged.
    pub(crate) fn on_ack(
        &mut self,
        request: Request,
        outcome: Result<AckPayload, AckError>,
        out: &mut Vec<Effect>,
    ) {
        let reply = outcome.as_ref().map(AckPayload::reply).unwrap_or_default();

        let success = match &request {
            Request::ChangeOnline { .. } => {
                match outcome.as_ref().ok().and_then(AckPayload::roster) {
                    Some(roster) => {
                        self.presence.apply_roster(roster);
                        true
                    },
                    None => false,
                }
            },
            _ => reply.succeeded(),
        };

        match &request {
            Request::Skip => self.skip_in_flight = false,
            Request::ConnectUser { user_id } if success => self.on_connect_acked(user_id, &reply, out),
            Request::CancelConnectUser { user_id } if success => {
                self.presence.requests_mut().cancelled(user_id);
            },
            Request::RemoveUser { user_id } if success => {
                self.presence.requests_mut().removed(user_id);
            },
            _ => {},
        }

        match &outcome {
            Err(err) => warn!(?request, %err, "request failed"),
            Ok(_) if !success => warn!(?request, "request not confirmed"),
            Ok(_) => debug!(?request, "request confirmed"),
        }
        out.push(Effect::Action(ClientAction::RequestCompleted { request, success }));
    }

    fn on_connect_acked(&mut self, user_id: &str, reply: &AckReply, out: &mut Vec<Effect>) {
        let book = self.presence.requests_mut();
        let mutual = if reply.is_friends() { book.confirm(user_id) } else { book.record_sent(user_id) };
        if mutual {
            friend_added(user_id.to_string(), out);
        }
    }
}

fn is_match_event(event: &Inbound) -> bool {
    matches!(
        event,
        Inbound::RoomCreated(_)
            | Inbound::PartnerInfo(_)
            | Inbound::PartnerLeft { .. }
            | Inbound::PartnerJoinedVideo { .. }
            | Inbound::End
            | Inbound::TimerUpdate { .. }
            | Inbound::TimerExtended { .. }
            | Inbound::TimerEnded
    )
}

fn notify(out: &mut Vec<Effect>, notification: Notification) {
    out.push(Effect::Action(ClientAction::Notify(notification)));
}

fn friend_added(user_id: String, out: &mut Vec<Effect>) {
    info!(%user_id, "connection is mutual");
    notify(out, Notification::new(NotificationLevel::Success, "New connection"));
    out.push(Effect::Action(ClientAction::FriendAdded { user_id }));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pairline_proto::Profile;
    use serde_json::json;

    use super::*;

    fn coordinator() -> MatchCoordinator {
        MatchCoordinator::new(Credentials::new("me", "secret"))
    }

    fn searching() -> MatchCoordinator {
        let mut coordinator = coordinator();
        coordinator.start_matching(&mut Vec::new()).unwrap();
        coordinator
    }

    fn room(room_id: &str, peers: &[&str]) -> Inbound {
        Inbound::PartnerInfo(RoomInfo {
            room_id: room_id.into(),
            my_profile: Profile::with_id("me"),
            partners: peers.iter().map(|p| Profile::with_id(*p)).collect(),
            media_token: "media".into(),
            event_id: None,
        })
    }

    fn emitted(effects: &[Effect]) -> Vec<&Outbound> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Emit(event) | Effect::Request(event, _) => Some(event),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn start_emits_intent_and_queue_request() {
        let mut coordinator = coordinator();
        let mut out = Vec::new();
        coordinator.start_matching(&mut out).unwrap();

        assert_eq!(emitted(&out), vec![
            &Outbound::ChangeShouldCall(ChangeShouldCall { should_call: true }),
            &Outbound::StartMatching(StartMatching { id: "me".into(), token: "secret".into() }),
        ]);
        assert_eq!(coordinator.state(), SessionState::Searching);
        assert_eq!(coordinator.kind(), Some(CallKind::Global));
    }

    #[test]
    fn start_is_noop_unless_idle() {
        let mut coordinator = searching();
        let mut out = Vec::new();
        coordinator.start_matching(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn start_requires_credentials() {
        let mut coordinator = MatchCoordinator::new(Credentials::default());
        let mut out = Vec::new();
        assert_eq!(coordinator.start_matching(&mut out), Err(ClientError::MissingCredentials));
        assert!(out.is_empty());
        assert_eq!(coordinator.state(), SessionState::Idle);
    }

    #[test]
    fn unsupported_kind_is_rejected() {
        let mut coordinator = coordinator();
        coordinator.change_kind(CallKind::Invite, &mut Vec::new());
        let result = coordinator.start_matching(&mut Vec::new());
        assert_eq!(result, Err(ClientError::UnsupportedKind(CallKind::Invite)));
    }

    #[test]
    fn duplicate_peer_info_mutates_once() {
        let mut coordinator = searching();
        let mut out = Vec::new();
        coordinator.on_inbound(room("r1", &["p1"]), &mut out);
        let after_first = coordinator.data().clone();

        coordinator.on_inbound(room("r2", &["p1"]), &mut out);
        assert_eq!(coordinator.data(), &after_first);
        assert!(out.is_empty());
    }

    #[test]
    fn peer_info_while_idle_is_ignored() {
        let mut coordinator = coordinator();
        coordinator.kind = Some(CallKind::Global);
        coordinator.on_inbound(room("r1", &["p1"]), &mut Vec::new());
        assert!(coordinator.data().is_empty());
    }

    #[test]
    fn friends_from_room_info_are_merged() {
        let mut coordinator = searching();
        let mut info = RoomInfo { room_id: "r1".into(), ..RoomInfo::default() };
        info.my_profile.friends = vec!["f1".into(), "f1".into()];
        info.partners = vec![Profile::with_id("p1")];

        coordinator.on_inbound(Inbound::PartnerInfo(info), &mut Vec::new());
        assert_eq!(coordinator.presence().requests().confirmed.len(), 1);
    }

    #[test]
    fn last_peer_leaving_resets_data() {
        let mut coordinator = searching();
        let mut out = Vec::new();
        coordinator.on_inbound(room("r1", &["p1", "p2"]), &mut out);
        coordinator.transition(SessionState::Connecting, Trigger::MatchDelivered, &mut out);

        coordinator.on_inbound(Inbound::PartnerLeft { partner_id: "p1".into() }, &mut out);
        assert_eq!(coordinator.data().peers.len(), 1);

        coordinator.on_inbound(Inbound::PartnerLeft { partner_id: "p2".into() }, &mut out);
        assert!(coordinator.data().is_empty());
        assert_eq!(coordinator.state(), SessionState::Disconnecting);
        assert!(out.contains(&Effect::Action(ClientAction::DisconnectMedia)));
    }

    #[test]
    fn second_skip_waits_for_first_ack() {
        let mut coordinator = searching();
        let mut out = Vec::new();
        coordinator.skip(&mut out);
        coordinator.skip(&mut out);

        let skips = emitted(&out).into_iter().filter(|e| **e == Outbound::SkipCall).count();
        assert_eq!(skips, 1);

        coordinator.on_ack(Request::Skip, Err(AckError::TimedOut), &mut out);
        assert!(!coordinator.skip_in_flight());
    }

    #[test]
    fn end_call_from_searching_goes_idle() {
        let mut coordinator = searching();
        let mut out = Vec::new();
        coordinator.end_call(SessionState::Idle, true, &mut out);

        assert_eq!(coordinator.state(), SessionState::Idle);
        assert!(!coordinator.should_call());
        assert_eq!(emitted(&out), vec![
            &Outbound::End,
            &Outbound::ChangeShouldCall(ChangeShouldCall { should_call: false }),
        ]);
    }

    #[test]
    fn timers_update_session_data() {
        let mut coordinator = searching();
        let mut out = Vec::new();
        coordinator.on_inbound(Inbound::TimerUpdate { timer_value: 42 }, &mut out);
        assert_eq!(coordinator.data().timer_value, 42);

        coordinator.on_inbound(Inbound::TimerExtended { timer_value: 100 }, &mut out);
        assert!(coordinator.data().timer_extended);

        coordinator.on_inbound(Inbound::TimerEnded, &mut out);
        assert!(coordinator.data().is_empty());
    }

    #[test]
    fn extend_timer_requires_room() {
        let mut coordinator = searching();
        let mut out = Vec::new();
        coordinator.extend_timer(60, &mut out);
        assert!(out.is_empty());

        coordinator.on_inbound(room("r1", &["p1"]), &mut out);
        coordinator.extend_timer(60, &mut out);
        assert_eq!(emitted(&out), vec![&Outbound::ExtendTimer(ExtendTimer {
            room_id: "r1".into(),
            seconds: 60
        })]);
    }

    #[test]
    fn connect_ack_with_friendship_confirms_once() {
        let mut coordinator = coordinator();
        let mut out = Vec::new();
        let ack = AckPayload::new(vec![json!({"completionStatus": true, "data": {"isFriends": true}})]);

        coordinator.on_ack(Request::ConnectUser { user_id: "p1".into() }, Ok(ack.clone()), &mut out);
        coordinator.on_ack(Request::ConnectUser { user_id: "p1".into() }, Ok(ack), &mut out);

        let added = out
            .iter()
            .filter(|e| matches!(e, Effect::Action(ClientAction::FriendAdded { .. })))
            .count();
        assert_eq!(added, 1);
        assert!(coordinator.presence().requests().confirmed.contains("p1"));
    }

    #[test]
    fn malformed_ack_status_is_failure() {
        let mut coordinator = coordinator();
        let mut out = Vec::new();
        let ack = AckPayload::new(vec![json!({"completionStatus": "yes"})]);

        coordinator.on_ack(Request::ConnectUser { user_id: "p1".into() }, Ok(ack), &mut out);
        assert!(coordinator.presence().requests().sent_by_me.is_empty());
        assert_eq!(out, vec![Effect::Action(ClientAction::RequestCompleted {
            request: Request::ConnectUser { user_id: "p1".into() },
            success: false,
        })]);
    }

    #[test]
    fn match_events_for_inactive_kind_are_dropped() {
        let mut coordinator = coordinator();
        coordinator.change_kind(CallKind::Event, &mut Vec::new());
        coordinator.on_inbound(Inbound::TimerUpdate { timer_value: 5 }, &mut Vec::new());
        assert_eq!(coordinator.data().timer_value, crate::session_data::TIMER_UNSET);
    }
}
