//! Integration test common infrastructure.
//!
//! Provides an in-process room server speaking the wire protocol, plus
//! helpers for asserting on session event flows.

// Not every test binary uses every helper.
#![allow(dead_code)]

use roomwire::{Config, SessionEvent, SessionState};
use serde_json::Value;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

const WAIT: Duration = Duration::from_secs(5);

/// A listening room server that hands accepted connections to the test.
pub struct TestServer {
    addr: String,
    conn_rx: mpsc::UnboundedReceiver<ServerConn>,
}

/// One accepted client connection, driven directly by the test.
pub struct ServerConn {
    ws: WebSocketStream<TcpStream>,
}

impl TestServer {
    /// Bind on an ephemeral port and start accepting.
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let addr = listener.local_addr().expect("local addr").to_string();
        let (conn_tx, conn_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let conn_tx = conn_tx.clone();
                tokio::spawn(async move {
                    if let Ok(ws) = accept_async(stream).await {
                        let _ = conn_tx.send(ServerConn { ws });
                    }
                });
            }
        });
        Self { addr, conn_rx }
    }

    /// Host:port the server listens on.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Session config pointed at this server.
    pub fn config(&self, reconnect_delay_ms: u64) -> Config {
        let mut config = Config::default();
        config.server.host = self.addr.clone();
        config.session.reconnect_delay_ms = reconnect_delay_ms;
        config
    }

    /// Wait for the next client connection.
    pub async fn accept(&mut self) -> ServerConn {
        timeout(WAIT, self.conn_rx.recv())
            .await
            .expect("timed out waiting for a connection")
            .expect("listener task gone")
    }

    /// Assert no new connection arrives within `window`.
    pub async fn expect_no_connection(&mut self, window: Duration) {
        if timeout(window, self.conn_rx.recv()).await.is_ok() {
            panic!("unexpected connection");
        }
    }
}

impl ServerConn {
    /// Read text frames until the identify frame arrives; returns the name.
    pub async fn expect_identify(&mut self) -> String {
        let value = self.recv_json().await;
        value
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_else(|| panic!("expected identify frame, got {value}"))
            .to_string()
    }

    /// Next inbound text frame as JSON, skipping control frames.
    pub async fn recv_json(&mut self) -> Value {
        use futures_util::StreamExt;
        loop {
            let msg = timeout(WAIT, self.ws.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("connection ended")
                .expect("read error");
            match msg {
                Message::Text(raw) => return serde_json::from_str(&raw).expect("json frame"),
                Message::Close(_) => panic!("connection closed while waiting for a frame"),
                _ => continue,
            }
        }
    }

    /// Next text frame within `window`, or `None` if the window elapses.
    pub async fn try_recv_json(&mut self, window: Duration) -> Option<Value> {
        use futures_util::StreamExt;
        let deadline = tokio::time::Instant::now() + window;
        loop {
            let msg = match timeout_at_deadline(deadline, self.ws.next()).await? {
                Some(Ok(msg)) => msg,
                _ => return None,
            };
            match msg {
                Message::Text(raw) => {
                    return Some(serde_json::from_str(&raw).expect("json frame"));
                }
                Message::Close(_) => return None,
                _ => continue,
            }
        }
    }

    /// Send one JSON frame to the client.
    pub async fn send_json(&mut self, value: Value) {
        use futures_util::SinkExt;
        self.ws.send(Message::Text(value.to_string())).await.expect("send frame");
    }

    /// Send a raw text payload (possibly malformed on purpose).
    pub async fn send_raw(&mut self, raw: &str) {
        use futures_util::SinkExt;
        self.ws.send(Message::Text(raw.to_string())).await.expect("send raw");
    }

    /// Close without a close handshake; the client sees an unclean end.
    pub fn drop_unclean(self) {
        drop(self.ws);
    }

    /// Orderly close with code 1000.
    pub async fn close_clean(mut self) {
        use futures_util::SinkExt;
        let frame = CloseFrame { code: CloseCode::Normal, reason: "done".into() };
        let _ = self.ws.send(Message::Close(Some(frame))).await;
    }

    /// Wait for the client to initiate a close; returns its code.
    pub async fn expect_close(&mut self) -> Option<u16> {
        use futures_util::StreamExt;
        loop {
            let msg = timeout(WAIT, self.ws.next())
                .await
                .expect("timed out waiting for close");
            match msg {
                Some(Ok(Message::Close(frame))) => return frame.map(|f| u16::from(f.code)),
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => return None,
            }
        }
    }
}

async fn timeout_at_deadline<F: std::future::Future>(
    deadline: tokio::time::Instant,
    future: F,
) -> Option<F::Output> {
    tokio::time::timeout_at(deadline, future).await.ok()
}

/// Wait for the next session event.
pub async fn next_event(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> SessionEvent {
    timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for a session event")
        .expect("session ended")
}

/// Consume events until the given state is announced, returning everything
/// seen on the way (the state change included).
pub async fn wait_for_state(
    events: &mut mpsc::UnboundedReceiver<SessionEvent>,
    state: SessionState,
) -> Vec<SessionEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        let done = matches!(&event, SessionEvent::StateChanged(s) if *s == state);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

/// Consume events until an `Entry` arrives, returning it.
pub async fn next_entry(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> roomwire::ChatEntry {
    loop {
        if let SessionEvent::Entry(entry) = next_event(events).await {
            return entry;
        }
    }
}

/// Consume events until an `Error` arrives, returning it.
pub async fn next_error(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> roomwire::SessionError {
    loop {
        if let SessionEvent::Error(error) = next_event(events).await {
            return error;
        }
    }
}
