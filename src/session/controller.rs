//! Session controller: the room lifecycle state machine.
//!
//! One spawned task owns all session state. Caller commands, transport
//! events, and the reconnect timer all arrive as channel messages consumed
//! by a single select loop, so handling is discrete and non-overlapping and
//! nothing needs a lock. Transport events are tagged with their connection
//! epoch; anything from a superseded connection is discarded.

use roomwire_proto::RoomId;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::log::ChatLog;
use super::{Command, SessionEvent, SessionState};
use crate::config::Config;
use crate::error::SessionError;
use crate::policy::{MessagePolicy, Rejection, default_blocked_terms};
use crate::reconnect::ReconnectPolicy;
use crate::roster::Roster;
use crate::transport::{self, CLOSE_NORMAL, TransportEvent, TransportHandle};

pub(crate) struct Controller {
    participant: String,
    room: RoomId,
    url: String,
    heartbeat: Duration,
    policy: MessagePolicy,
    reconnect: ReconnectPolicy,
    roster: Roster,
    log: ChatLog,
    state: SessionState,
    epoch: u64,
    /// False once the caller has left; nothing may reconnect after that.
    active: bool,
    transport: Option<TransportHandle>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    transport_tx: mpsc::UnboundedSender<(u64, TransportEvent)>,
    transport_rx: mpsc::UnboundedReceiver<(u64, TransportEvent)>,
    due_tx: mpsc::UnboundedSender<u64>,
    due_rx: mpsc::UnboundedReceiver<u64>,
}

impl Controller {
    pub(crate) fn new(
        config: Config,
        participant: &str,
        room: RoomId,
        event_tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let url = room.url(config.server.tls, &config.server.effective_host());
        let mut terms: Vec<String> =
            default_blocked_terms().iter().map(|t| t.to_string()).collect();
        terms.extend(config.filter.extra_terms.iter().cloned());
        let policy = MessagePolicy::new(terms, config.session.max_message_len);

        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (due_tx, due_rx) = mpsc::unbounded_channel();
        Self {
            participant: participant.to_string(),
            room,
            url,
            heartbeat: config.session.heartbeat(),
            policy,
            reconnect: ReconnectPolicy::new(config.session.reconnect_delay()),
            roster: Roster::new(),
            log: ChatLog::default(),
            state: SessionState::Disconnected,
            epoch: 0,
            active: true,
            transport: None,
            event_tx,
            transport_tx,
            transport_rx,
            due_tx,
            due_rx,
        }
    }

    pub(crate) async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<Command>) {
        self.open_connection();
        while self.active {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Send(text)) => self.handle_send(&text),
                    Some(Command::Reconnect) => self.manual_reconnect(),
                    // A dropped handle is a leave.
                    Some(Command::Leave) | None => self.teardown(),
                },
                Some((epoch, event)) = self.transport_rx.recv() => {
                    if epoch != self.epoch {
                        debug!(epoch, current = self.epoch, "discarding stale transport event");
                        continue;
                    }
                    self.handle_transport_event(event);
                },
                Some(epoch) = self.due_rx.recv() => self.reconnect_due(epoch),
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    fn emit_roster(&self) {
        self.emit(SessionEvent::RosterChanged(self.roster.names().to_vec()));
    }

    fn set_state(&mut self, next: SessionState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "state change");
            self.state = next;
            self.emit(SessionEvent::StateChanged(next));
        }
    }

    /// Open a fresh transport connection under a new epoch.
    fn open_connection(&mut self) {
        self.epoch += 1;
        info!(room = %self.room, epoch = self.epoch, "connecting");
        self.set_state(SessionState::Connecting);
        let handle = transport::open(
            self.url.clone(),
            self.participant.clone(),
            self.heartbeat,
            self.epoch,
            self.transport_tx.clone(),
        );
        self.transport = Some(handle);
    }

    fn handle_send(&mut self, text: &str) {
        if self.state != SessionState::Ready {
            debug!(state = %self.state, "dropping send before room is ready");
            return;
        }
        match self.policy.validate(text) {
            Ok(clean) => {
                if let Some(transport) = &self.transport {
                    transport.send(&clean);
                }
            }
            // A blank send is a no-op, not a user mistake.
            Err(Rejection::Empty) => debug!("dropping empty send"),
            Err(rejection) => {
                let error = SessionError::from(rejection);
                debug!(code = error.error_code(), "send rejected");
                self.emit(SessionEvent::Error(error));
            }
        }
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        // Everything that arrives before the ready marker is backlog replay.
        let backlog = self.state != SessionState::Ready;
        match event {
            TransportEvent::Opened => {
                self.set_state(SessionState::AwaitingReady);
            }
            TransportEvent::Chat { from, text } => {
                let is_own = from == self.participant;
                let entry = self.log.push_message(&from, &text, is_own, backlog);
                self.emit(SessionEvent::Entry(entry));
            }
            TransportEvent::Joined { name } => {
                if !backlog {
                    let text = if name == self.participant {
                        "You joined the room".to_string()
                    } else {
                        format!("{name} joined the room")
                    };
                    let entry = self.log.push_system(&text, false);
                    self.emit(SessionEvent::Entry(entry));
                }
                if self.roster.add(&name) {
                    self.emit_roster();
                }
            }
            TransportEvent::Quit { name } => {
                let text = if name == self.participant {
                    "You left the room".to_string()
                } else {
                    format!("{name} left the room")
                };
                let entry = self.log.push_system(&text, backlog);
                self.emit(SessionEvent::Entry(entry));
                if self.roster.remove(&name) {
                    self.emit_roster();
                }
            }
            TransportEvent::Ready => {
                self.set_state(SessionState::Ready);
                if self.roster.add(&self.participant) {
                    self.emit_roster();
                }
            }
            TransportEvent::ServerError { message } => {
                warn!(error = %message, "server error");
                self.emit(SessionEvent::Error(SessionError::Protocol { message }));
            }
            TransportEvent::TransportError { message } => {
                self.emit(SessionEvent::Error(SessionError::Transport { message }));
            }
            TransportEvent::Closed { code, reason, clean } => {
                self.handle_closed(code, &reason, clean);
            }
        }
    }

    fn handle_closed(&mut self, code: u16, reason: &str, clean: bool) {
        info!(code, reason = %reason, clean, "connection closed");
        self.transport = None;
        if !self.roster.is_empty() {
            self.roster.clear();
            self.emit_roster();
        }
        self.set_state(SessionState::Disconnected);
        if !clean && self.active {
            self.reconnect.schedule(self.epoch, self.due_tx.clone());
        }
    }

    /// The automatic reconnect timer fired.
    fn reconnect_due(&mut self, epoch: u64) {
        if !self.active || epoch != self.epoch {
            debug!(epoch, current = self.epoch, "ignoring stale reconnect");
            return;
        }
        info!(epoch, "automatic reconnect");
        self.log.clear();
        if !self.roster.is_empty() {
            self.roster.clear();
            self.emit_roster();
        }
        self.open_connection();
    }

    fn manual_reconnect(&mut self) {
        info!("manual reconnect");
        self.reconnect.cancel();
        if let Some(transport) = self.transport.take() {
            transport.close(CLOSE_NORMAL, "Manual reconnect");
        }
        self.log.clear();
        if !self.roster.is_empty() {
            self.roster.clear();
            self.emit_roster();
        }
        self.open_connection();
    }

    /// Leave the room. After this returns no further state mutation occurs.
    fn teardown(&mut self) {
        info!("leaving room");
        self.active = false;
        self.reconnect.cancel();
        if let Some(transport) = self.transport.take() {
            transport.close(CLOSE_NORMAL, "Left the room");
        }
        if !self.roster.is_empty() {
            self.roster.clear();
            self.emit_roster();
        }
        self.set_state(SessionState::Disconnected);
    }
}
