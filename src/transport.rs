//! Transport connection: owns one WebSocket and its heartbeat.
//!
//! Each connection is a spawned task bound to a connection epoch. The task
//! performs the async connect, identifies the participant, then runs a
//! single select loop over inbound frames, outbound requests, and the
//! heartbeat timer. Raw payloads are decoded here, once; the session
//! controller only ever sees typed [`TransportEvent`]s. Payloads that fail
//! to decode are logged and dropped, and never change session state.
//!
//! The heartbeat timer is owned by the task, so it is released on every
//! exit path, including forced teardown.

use futures_util::{SinkExt, StreamExt};
use roomwire_proto::{ClientFrame, ServerFrame};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, info, warn};

/// Close code for an intentional, non-retryable shutdown.
pub const CLOSE_NORMAL: u16 = 1000;

/// Close code reported when the transport fails without a close frame.
const CLOSE_ABNORMAL: u16 = 1006;

/// Typed protocol events, emitted in the order the network delivered them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The socket is open and the identify frame has been sent.
    Opened,
    /// A chat broadcast.
    Chat {
        /// Sender display name.
        from: String,
        /// Message text.
        text: String,
    },
    /// A participant joined.
    Joined {
        /// Participant display name.
        name: String,
    },
    /// A participant left.
    Quit {
        /// Participant display name.
        name: String,
    },
    /// Server-reported error; connection state is unchanged.
    ServerError {
        /// Error text.
        message: String,
    },
    /// End of backlog replay.
    Ready,
    /// The connection is gone. Always the final event of an epoch.
    Closed {
        /// Close code (1000 = intentional).
        code: u16,
        /// Close reason, possibly empty.
        reason: String,
        /// Whether the close was an orderly code-1000 shutdown.
        clean: bool,
    },
    /// A socket-level failure; followed by an unclean `Closed`.
    TransportError {
        /// Underlying error text.
        message: String,
    },
}

/// Outbound requests accepted by the connection task.
#[derive(Debug)]
enum Outbound {
    Chat(String),
    Close { code: u16, reason: String },
}

/// Handle to a live connection task.
#[derive(Debug)]
pub struct TransportHandle {
    epoch: u64,
    out_tx: mpsc::UnboundedSender<Outbound>,
}

impl TransportHandle {
    /// Best-effort chat send; silently inert once the connection is gone.
    pub fn send(&self, text: &str) {
        let _ = self.out_tx.send(Outbound::Chat(text.to_string()));
    }

    /// Request an orderly shutdown.
    pub fn close(&self, code: u16, reason: &str) {
        let _ = self.out_tx.send(Outbound::Close { code, reason: reason.to_string() });
    }

    /// The connection epoch this handle is bound to.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Open a connection under `epoch`.
///
/// Events arrive on `events` as `(epoch, event)` pairs so the receiver can
/// discard anything from a superseded connection. The final event of every
/// connection is `Closed`.
pub fn open(
    url: String,
    participant: String,
    heartbeat: Duration,
    epoch: u64,
    events: mpsc::UnboundedSender<(u64, TransportEvent)>,
) -> TransportHandle {
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    tokio::spawn(run(url, participant, heartbeat, epoch, events, out_rx));
    TransportHandle { epoch, out_tx }
}

async fn run(
    url: String,
    participant: String,
    heartbeat: Duration,
    epoch: u64,
    events: mpsc::UnboundedSender<(u64, TransportEvent)>,
    mut out_rx: mpsc::UnboundedReceiver<Outbound>,
) {
    let emit = |event: TransportEvent| {
        let _ = events.send((epoch, event));
    };

    info!(url = %url, epoch, "opening room connection");
    let (stream, _) = match connect_async(url.as_str()).await {
        Ok(ok) => ok,
        Err(e) => {
            warn!(error = %e, epoch, "connect failed");
            emit(TransportEvent::TransportError { message: e.to_string() });
            emit(TransportEvent::Closed {
                code: CLOSE_ABNORMAL,
                reason: String::new(),
                clean: false,
            });
            return;
        }
    };
    emit(TransportEvent::Opened);

    let (mut sink, mut source) = stream.split();

    // Identify immediately; the server answers with the backlog replay and
    // a ready marker.
    let identify = ClientFrame::Identify { name: participant };
    if let Err(e) = sink.send(WsMessage::Text(identify.encode())).await {
        warn!(error = %e, "failed to send identify frame");
        emit(TransportEvent::TransportError { message: e.to_string() });
        emit(TransportEvent::Closed { code: CLOSE_ABNORMAL, reason: String::new(), clean: false });
        return;
    }

    let mut heartbeat_timer = tokio::time::interval(heartbeat);
    // First tick fires immediately, we don't want that
    heartbeat_timer.tick().await;

    let closed = loop {
        tokio::select! {
            _ = heartbeat_timer.tick() => {
                if let Err(e) = sink.send(WsMessage::Text(ClientFrame::Ping.encode())).await {
                    warn!(error = %e, "heartbeat send failed");
                    emit(TransportEvent::TransportError { message: e.to_string() });
                    break TransportEvent::Closed {
                        code: CLOSE_ABNORMAL,
                        reason: String::new(),
                        clean: false,
                    };
                }
            }

            out = out_rx.recv() => match out {
                Some(Outbound::Chat(text)) => {
                    let frame = ClientFrame::Chat { message: text };
                    if let Err(e) = sink.send(WsMessage::Text(frame.encode())).await {
                        warn!(error = %e, "chat send failed");
                        emit(TransportEvent::TransportError { message: e.to_string() });
                        break TransportEvent::Closed {
                            code: CLOSE_ABNORMAL,
                            reason: String::new(),
                            clean: false,
                        };
                    }
                }
                Some(Outbound::Close { code, reason }) => {
                    debug!(code, reason = %reason, "closing connection");
                    let frame = CloseFrame { code: CloseCode::from(code), reason: reason.clone().into() };
                    let _ = sink.send(WsMessage::Close(Some(frame))).await;
                    break TransportEvent::Closed { code, reason, clean: code == CLOSE_NORMAL };
                }
                // All handles dropped: tear the socket down quietly.
                None => {
                    let frame = CloseFrame { code: CloseCode::Normal, reason: "session ended".into() };
                    let _ = sink.send(WsMessage::Close(Some(frame))).await;
                    break TransportEvent::Closed {
                        code: CLOSE_NORMAL,
                        reason: String::new(),
                        clean: true,
                    };
                }
            },

            inbound = source.next() => match inbound {
                Some(Ok(WsMessage::Text(raw))) => match ServerFrame::decode(&raw) {
                    Ok(frame) => emit(event_for(frame)),
                    Err(e) => warn!(error = %e, raw = %raw, "dropping malformed frame"),
                },
                Some(Ok(WsMessage::Close(frame))) => {
                    let (code, reason) = match frame {
                        Some(f) => (u16::from(f.code), f.reason.to_string()),
                        None => (CLOSE_ABNORMAL, String::new()),
                    };
                    info!(code, reason = %reason, "server closed connection");
                    break TransportEvent::Closed { code, reason, clean: code == CLOSE_NORMAL };
                }
                Some(Ok(WsMessage::Binary(_))) => {
                    warn!("dropping unexpected binary frame");
                }
                // Ping/pong control frames are answered by the protocol layer.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "read error");
                    emit(TransportEvent::TransportError { message: e.to_string() });
                    break TransportEvent::Closed {
                        code: CLOSE_ABNORMAL,
                        reason: String::new(),
                        clean: false,
                    };
                }
                None => {
                    info!("connection ended without close frame");
                    break TransportEvent::Closed {
                        code: CLOSE_ABNORMAL,
                        reason: String::new(),
                        clean: false,
                    };
                }
            },
        }
    };
    emit(closed);
}

fn event_for(frame: ServerFrame) -> TransportEvent {
    match frame {
        ServerFrame::Chat { name, message } => TransportEvent::Chat { from: name, text: message },
        ServerFrame::Joined { name } => TransportEvent::Joined { name },
        ServerFrame::Quit { name } => TransportEvent::Quit { name },
        ServerFrame::Error { message } => TransportEvent::ServerError { message },
        ServerFrame::Ready => TransportEvent::Ready,
    }
}
