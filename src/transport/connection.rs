//! Socket.IO connection and event loop.
//!
//! This module owns the one websocket connection to the Socket.IO server,
//! including the Engine.IO handshake, heartbeat, reconnection and event
//! routing to subscribers.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that handles:
//!
//! - Dialing and handshaking (bounded by the connect timeout)
//! - Incoming frames from the server (events, pings, disconnects)
//! - Outgoing emits from the bridge, buffered while not open
//! - Heartbeat deadline and client pings (Engine.IO 3)
//! - Reconnection with exponential backoff
//!
//! Transport failures are not hidden: they are delivered to subscribers as
//! `connect_error`, `error` and `disconnect` events.
//!
//! # Error Payloads
//!
//! | Event | Cause | Payload |
//! |-------|-------|---------|
//! | `connect_error` | Dial or handshake failure | Error message string |
//! | `connect_error` | Namespace refused (modern) | Server `message` string |
//! | `error` | Namespace refused (legacy) | Server data, unchanged |
//! | `disconnect` | Session ended | Reason string |
//!
//! Failures that cannot be retried (see [`Error::is_recoverable`]) close the
//! channel after their `connect_error`.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, Instant, interval_at, sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use crate::config::{ChannelOptions, TransportVariant};
use crate::error::{Error, Result};
use crate::protocol::{EnginePacket, Handshake, ROOT_NAMESPACE, SocketPacket};

use super::channel::{Channel, ChannelState, EventHandler};
use super::endpoint::Endpoint;

// ============================================================================
// Constants
// ============================================================================

/// Local event delivered once the namespace is connected.
const CONNECT_EVENT: &str = "connect";

/// Local event delivered when a dial or handshake fails.
const CONNECT_ERROR_EVENT: &str = "connect_error";

/// Local event delivered when an open session ends.
const DISCONNECT_EVENT: &str = "disconnect";

/// Lower bound for the client ping period.
const MIN_PING_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// Types
// ============================================================================

/// Map of event names to handlers.
type SubscriberMap = FxHashMap<String, EventHandler>;

/// Websocket stream to the server, plain or TLS.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of the websocket.
type WsWrite = SplitSink<WsStream, Message>;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Emit an event.
    Emit { event: String, payload: Value },
    /// Disconnect and stop.
    Shutdown,
}

// ============================================================================
// SessionEnd
// ============================================================================

/// Why an open session stopped.
#[derive(Debug)]
enum SessionEnd {
    /// Local shutdown; never reconnect.
    Shutdown,
    /// Server disconnected the namespace; never reconnect.
    ServerDisconnect,
    /// Transport lost; reconnect if allowed.
    Lost(&'static str),
}

// ============================================================================
// Connection
// ============================================================================

/// Socket.IO connection to the game server.
///
/// Cloning yields another handle to the same connection and event loop.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync`. Handlers run on the event loop task, one
/// at a time, in delivery order.
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Subscribers (shared with event loop).
    subscribers: Arc<Mutex<SubscriberMap>>,
    /// Lifecycle published by the event loop.
    state_rx: watch::Receiver<ChannelState>,
    /// Transport variant.
    variant: TransportVariant,
}

impl Clone for Connection {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            subscribers: Arc::clone(&self.subscribers),
            state_rx: self.state_rx.clone(),
            variant: self.variant,
        }
    }
}

impl Connection {
    /// Starts connecting and returns immediately.
    ///
    /// Spawns the event loop task; must be called inside a tokio runtime.
    /// Emits issued before the connection opens are buffered.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if the configured server is not a valid URL
    /// - [`Error::Config`] if the URL cannot be turned into a websocket URL
    pub fn open(options: ChannelOptions) -> Result<Self> {
        let endpoint = Endpoint::resolve(&options)?;
        Ok(Self::spawn(endpoint, options))
    }

    /// Spawns the event loop dialing `endpoint`.
    fn spawn(endpoint: Endpoint, options: ChannelOptions) -> Self {
        let variant = options.variant;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);
        let subscribers = Arc::new(Mutex::new(SubscriberMap::default()));

        info!(
            url = %endpoint.url(),
            namespace = endpoint.namespace(),
            ?variant,
            "Opening channel"
        );

        let event_loop = EventLoop {
            endpoint,
            options,
            command_rx,
            subscribers: Arc::clone(&subscribers),
            state_tx,
            pending: VecDeque::new(),
        };
        tokio::spawn(event_loop.run());

        Self {
            command_tx,
            subscribers,
            state_rx,
            variant,
        }
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ChannelState {
        *self.state_rx.borrow()
    }

    /// Resolves once the channel is closed for good.
    pub async fn closed(&self) {
        let mut state_rx = self.state_rx.clone();
        let _ = state_rx
            .wait_for(|state| *state == ChannelState::Closed)
            .await;
    }

    /// Disconnects the namespace and stops the event loop.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }
}

impl Channel for Connection {
    fn send(&self, event: &str, payload: Value) -> Result<()> {
        if self.variant.is_reserved(event) {
            return match self.variant {
                TransportVariant::Modern => Err(Error::reserved_event(event)),
                TransportVariant::Legacy => {
                    debug!(event, "Reserved event delivered locally");
                    dispatch(&self.subscribers, event, payload);
                    Ok(())
                }
            };
        }

        self.command_tx
            .send(ConnectionCommand::Emit {
                event: event.to_string(),
                payload,
            })
            .map_err(|_| Error::ConnectionClosed)
    }

    fn subscribe(&self, event: &str, handler: EventHandler) {
        let previous = self.subscribers.lock().insert(event.to_string(), handler);
        if previous.is_some() {
            debug!(event, "Replaced event handler");
        }
    }
}

/// Text delivered as `connect_error` when the server refuses the namespace.
///
/// Hosts read `connect_error` as a message string, so the refusal data is
/// reduced to its `message` member, or to its JSON text.
fn refusal_message(data: Value) -> Value {
    match data {
        Value::String(message) => Value::String(message),
        Value::Null => Value::from("connection refused"),
        Value::Object(fields) => match fields.get("message").and_then(Value::as_str) {
            Some(message) => Value::from(message),
            None => Value::from(Value::Object(fields).to_string()),
        },
        other => Value::from(other.to_string()),
    }
}

/// Runs the handler registered for `event`, if any.
fn dispatch(subscribers: &Mutex<SubscriberMap>, event: &str, payload: Value) {
    let subscribers = subscribers.lock();
    match subscribers.get(event) {
        Some(handler) => {
            trace!(event, "Dispatching event");
            handler(payload);
        }
        None => trace!(event, "No subscriber for event"),
    }
}

// ============================================================================
// EventLoop
// ============================================================================

/// State owned by the event loop task.
struct EventLoop {
    endpoint: Endpoint,
    options: ChannelOptions,
    command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
    subscribers: Arc<Mutex<SubscriberMap>>,
    state_tx: watch::Sender<ChannelState>,
    /// Emits waiting for the connection to open.
    pending: VecDeque<(String, Value)>,
}

impl EventLoop {
    /// Connects, runs sessions and reconnects until told to stop.
    async fn run(mut self) {
        let mut failures: u32 = 0;

        loop {
            self.state_tx.send_replace(ChannelState::Connecting);

            let Some(result) = self.connect().await else {
                debug!("Shutdown while connecting");
                break;
            };

            match result {
                Ok((ws, handshake)) => {
                    failures = 0;
                    info!(sid = %handshake.sid, "Channel open");
                    self.state_tx.send_replace(ChannelState::Open);
                    self.dispatch(CONNECT_EVENT, Value::Null);

                    match self.run_session(ws, &handshake).await {
                        SessionEnd::Shutdown => break,
                        SessionEnd::ServerDisconnect => {
                            info!("Server disconnected the namespace");
                            self.dispatch(DISCONNECT_EVENT, Value::from("io server disconnect"));
                            break;
                        }
                        SessionEnd::Lost(reason) => {
                            warn!(reason, "Channel lost");
                            self.dispatch(DISCONNECT_EVENT, Value::from(reason));
                        }
                    }
                }

                Err(Error::ConnectRefused { data }) => {
                    warn!(%data, "Server refused the namespace connection");
                    let payload = match self.options.variant {
                        TransportVariant::Legacy => data,
                        TransportVariant::Modern => refusal_message(data),
                    };
                    self.dispatch(self.options.variant.error_event(), payload);
                    break;
                }

                Err(e) => {
                    failures = failures.saturating_add(1);
                    warn!(error = %e, failures, "Connection attempt failed");
                    self.dispatch(CONNECT_ERROR_EVENT, Value::from(e.to_string()));
                    if !e.is_recoverable() {
                        break;
                    }
                }
            }

            if !self.options.may_reconnect(failures) {
                debug!(failures, "Not reconnecting");
                break;
            }

            let delay = self.options.reconnect_delay(failures.saturating_sub(1));
            debug!(delay_ms = delay.as_millis() as u64, "Reconnecting");
            if !self.wait(delay).await {
                break;
            }
        }

        self.state_tx.send_replace(ChannelState::Closed);
        if !self.pending.is_empty() {
            debug!(count = self.pending.len(), "Dropped unsent emits");
        }
        debug!("Event loop terminated");
    }

    /// Dials and handshakes while buffering emits.
    ///
    /// Returns `None` if shutdown was requested meanwhile.
    async fn connect(&mut self) -> Option<Result<(WsStream, Handshake)>> {
        let connect_timeout = self.options.connect_timeout;
        let handshake = timeout(
            connect_timeout,
            establish(&self.endpoint, self.options.variant),
        );
        tokio::pin!(handshake);

        loop {
            tokio::select! {
                result = &mut handshake => {
                    return Some(result.unwrap_or_else(|_| {
                        Err(Error::connection_timeout(
                            connect_timeout.as_millis() as u64,
                        ))
                    }));
                }

                command = self.command_rx.recv() => match command {
                    Some(ConnectionCommand::Emit { event, payload }) => {
                        trace!(event = %event, "Buffered emit until open");
                        self.pending.push_back((event, payload));
                    }
                    Some(ConnectionCommand::Shutdown) | None => return None,
                }
            }
        }
    }

    /// Sleeps before reconnecting while buffering emits.
    ///
    /// Returns `false` if shutdown was requested meanwhile.
    async fn wait(&mut self, delay: Duration) -> bool {
        let pause = sleep(delay);
        tokio::pin!(pause);

        loop {
            tokio::select! {
                () = &mut pause => return true,

                command = self.command_rx.recv() => match command {
                    Some(ConnectionCommand::Emit { event, payload }) => {
                        self.pending.push_back((event, payload));
                    }
                    Some(ConnectionCommand::Shutdown) | None => return false,
                }
            }
        }
    }

    /// Runs one open session until it ends.
    async fn run_session(&mut self, ws: WsStream, handshake: &Handshake) -> SessionEnd {
        let variant = self.options.variant;
        let namespace = self.endpoint.namespace().to_string();
        let (mut ws_write, mut ws_read) = ws.split();

        // Flush emits buffered while connecting
        while let Some((event, payload)) = self.pending.pop_front() {
            let sent = write_event(&mut ws_write, &namespace, event, payload);
            if let Err(e) = sent.await {
                warn!(error = %e, "Failed to flush buffered emit");
                return SessionEnd::Lost("transport error");
            }
        }

        let ping_period = handshake.ping_interval().max(MIN_PING_INTERVAL);
        let mut heartbeat = interval_at(Instant::now() + ping_period, ping_period);
        let deadline = sleep(handshake.heartbeat_deadline());
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                // Incoming frames from the server
                message = ws_read.next() => {
                    deadline
                        .as_mut()
                        .reset(Instant::now() + handshake.heartbeat_deadline());

                    match message {
                        Some(Ok(Message::Text(text))) => {
                            match self.handle_frame(&text, &namespace) {
                                FrameAction::Continue => {}
                                FrameAction::Reply(frame) => {
                                    if let Err(e) = send_frame(&mut ws_write, frame).await {
                                        warn!(error = %e, "Failed to send reply");
                                        return SessionEnd::Lost("transport error");
                                    }
                                }
                                FrameAction::End(end) => return end,
                            }
                        }

                        Some(Ok(Message::Close(_))) | None => {
                            debug!("WebSocket closed by remote");
                            return SessionEnd::Lost("transport close");
                        }

                        Some(Err(e)) => {
                            warn!(error = %e, "WebSocket error");
                            return SessionEnd::Lost("transport error");
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Emits from the bridge
                command = self.command_rx.recv() => match command {
                    Some(ConnectionCommand::Emit { event, payload }) => {
                        let sent = write_event(&mut ws_write, &namespace, event, payload);
                        if let Err(e) = sent.await {
                            warn!(error = %e, "Failed to emit");
                            return SessionEnd::Lost("transport error");
                        }
                    }

                    Some(ConnectionCommand::Shutdown) | None => {
                        debug!("Shutdown command received");
                        close_session(&mut ws_write, &namespace).await;
                        return SessionEnd::Shutdown;
                    }
                },

                // Engine.IO 3 clients drive the heartbeat
                _ = heartbeat.tick(), if variant.client_pings() => {
                    trace!("Sending ping");
                    let ping = EnginePacket::Ping(String::new()).encode();
                    if let Err(e) = send_frame(&mut ws_write, ping).await {
                        warn!(error = %e, "Failed to send ping");
                        return SessionEnd::Lost("transport error");
                    }
                }

                () = &mut deadline => {
                    return SessionEnd::Lost("ping timeout");
                }
            }
        }
    }

    /// Decides what to do with one text frame from the server.
    fn handle_frame(&self, text: &str, namespace: &str) -> FrameAction {
        let packet = match EnginePacket::decode(text) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(error = %e, text = %text, "Failed to parse engine.io frame");
                return FrameAction::Continue;
            }
        };

        let payload = match packet {
            EnginePacket::Ping(probe) => {
                trace!("Answering ping");
                return FrameAction::Reply(EnginePacket::Pong(probe).encode());
            }
            EnginePacket::Close => return FrameAction::End(SessionEnd::Lost("transport close")),
            EnginePacket::Message(payload) => payload,
            _ => return FrameAction::Continue,
        };

        let packet = match SocketPacket::decode(&payload) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(error = %e, "Skipping socket.io packet");
                return FrameAction::Continue;
            }
        };

        if packet.nsp() != namespace {
            trace!(nsp = packet.nsp(), "Packet for another namespace");
            return FrameAction::Continue;
        }

        match packet {
            SocketPacket::Event { name, args, .. } => {
                let payload = args.into_iter().next().unwrap_or(Value::Null);
                self.dispatch(&name, payload);
            }
            SocketPacket::Disconnect { .. } => {
                return FrameAction::End(SessionEnd::ServerDisconnect);
            }
            SocketPacket::Error { data, .. } => {
                self.dispatch(
                    self.options.variant.error_event(),
                    data.unwrap_or(Value::Null),
                );
            }
            SocketPacket::Connect { .. } | SocketPacket::Ack { .. } => {}
        }

        FrameAction::Continue
    }

    /// Runs the handler registered for `event`, if any.
    fn dispatch(&self, event: &str, payload: Value) {
        dispatch(&self.subscribers, event, payload);
    }
}

/// Outcome of handling one frame.
enum FrameAction {
    Continue,
    Reply(String),
    End(SessionEnd),
}

// ============================================================================
// Wire Helpers
// ============================================================================

/// Dials the server and completes the Engine.IO and Socket.IO handshakes.
async fn establish(
    endpoint: &Endpoint,
    variant: TransportVariant,
) -> Result<(WsStream, Handshake)> {
    let (mut ws, _response) = connect_async(endpoint.url().as_str())
        .await
        .map_err(|e| Error::connection(format!("{}: {e}", endpoint.url())))?;

    let EnginePacket::Open(handshake) = next_engine_packet(&mut ws).await? else {
        return Err(Error::protocol("expected engine.io open packet"));
    };
    debug!(
        sid = %handshake.sid,
        ping_interval = handshake.ping_interval,
        ping_timeout = handshake.ping_timeout,
        "Engine.IO session opened"
    );

    let namespace = endpoint.namespace();
    if variant.connects_root_explicitly() || namespace != ROOT_NAMESPACE {
        let frame = EnginePacket::Message(SocketPacket::connect(namespace).encode()?).encode();
        ws.send(Message::Text(frame.into())).await?;
    }

    loop {
        match next_engine_packet(&mut ws).await? {
            EnginePacket::Message(payload) => match SocketPacket::decode(&payload)? {
                SocketPacket::Connect { nsp, .. } if nsp == namespace => break,
                SocketPacket::Error { nsp, data } if nsp == namespace => {
                    return Err(Error::connect_refused(data.unwrap_or(Value::Null)));
                }
                other => trace!(?other, "Ignoring packet before namespace connect"),
            },
            EnginePacket::Ping(probe) => {
                ws.send(Message::Text(EnginePacket::Pong(probe).encode().into()))
                    .await?;
            }
            EnginePacket::Close => {
                return Err(Error::connection(
                    "server closed the session during handshake",
                ));
            }
            _ => {}
        }
    }

    Ok((ws, handshake))
}

/// Reads the next Engine.IO packet, skipping non-text frames.
async fn next_engine_packet(ws: &mut WsStream) -> Result<EnginePacket> {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return EnginePacket::decode(&text),
            Some(Ok(Message::Close(_))) | None => {
                return Err(Error::connection("websocket closed during handshake"));
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(e.into()),
        }
    }
}

/// Encodes and sends one event.
async fn write_event(
    ws_write: &mut WsWrite,
    namespace: &str,
    event: String,
    payload: Value,
) -> Result<()> {
    let packet = SocketPacket::event(namespace, event, payload).encode()?;
    send_frame(ws_write, EnginePacket::Message(packet).encode()).await?;
    trace!("Event sent");
    Ok(())
}

/// Leaves the namespace and closes the websocket.
async fn close_session(ws_write: &mut WsWrite, namespace: &str) {
    if let Ok(packet) = SocketPacket::disconnect(namespace).encode() {
        let frame = EnginePacket::Message(packet).encode();
        let _ = send_frame(ws_write, frame).await;
    }
    let _ = ws_write.close().await;
}

/// Sends one text frame.
async fn send_frame(ws_write: &mut WsWrite, frame: String) -> Result<()> {
    ws_write.send(Message::Text(frame.into())).await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    const OPEN_FRAME: &str =
        r#"0{"sid":"s1","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;

    async fn listen() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should succeed");
        let port = listener.local_addr().expect("bound address").port();
        (listener, format!("http://127.0.0.1:{port}"))
    }

    fn legacy(server: String) -> ChannelOptions {
        ChannelOptions::new(TransportVariant::Legacy)
            .with_server(server)
            .with_reconnection(false)
    }

    async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
        let (stream, _) = timeout(Duration::from_secs(5), listener.accept())
            .await
            .expect("client should dial")
            .expect("accept should succeed");
        accept_async(stream).await.expect("upgrade should succeed")
    }

    async fn send_text(ws: &mut WebSocketStream<TcpStream>, text: &str) {
        ws.send(Message::Text(text.to_string().into()))
            .await
            .expect("server send should succeed");
    }

    async fn next_text(ws: &mut WebSocketStream<TcpStream>) -> String {
        loop {
            let frame = timeout(Duration::from_secs(5), ws.next())
                .await
                .expect("frame should arrive");
            match frame {
                Some(Ok(Message::Text(text))) => return text.as_str().to_string(),
                Some(Ok(_)) => {}
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    }

    fn recorder(connection: &Connection, event: &str) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        connection.subscribe(
            event,
            Box::new(move |payload: Value| {
                let _ = tx.send(payload);
            }),
        );
        rx
    }

    async fn received(rx: &mut mpsc::UnboundedReceiver<Value>) -> Value {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event should be delivered")
            .expect("handler should be alive")
    }

    #[tokio::test]
    async fn test_buffered_emit_and_event_delivery() {
        let (listener, server) = listen().await;
        let connection = Connection::open(legacy(server)).expect("valid options");
        let mut move_rec = recorder(&connection, "move_rec");

        connection
            .send("move", json!({"x": 1, "y": 2}))
            .expect("event loop alive");

        let mut ws = accept(&listener).await;
        send_text(&mut ws, OPEN_FRAME).await;
        send_text(&mut ws, "40").await;

        assert_eq!(next_text(&mut ws).await, r#"42["move",{"x":1,"y":2}]"#);

        send_text(&mut ws, r#"42["move_rec",{"ok":true}]"#).await;
        assert_eq!(received(&mut move_rec).await, json!({"ok": true}));
        assert_eq!(connection.state(), ChannelState::Open);
    }

    #[tokio::test]
    async fn test_event_without_args_delivers_null() {
        let (listener, server) = listen().await;
        let connection = Connection::open(legacy(server)).expect("valid options");
        let mut get_ready = recorder(&connection, "get_ready_rec");

        let mut ws = accept(&listener).await;
        send_text(&mut ws, OPEN_FRAME).await;
        send_text(&mut ws, "40").await;
        send_text(&mut ws, r#"42["get_ready_rec"]"#).await;

        assert_eq!(received(&mut get_ready).await, Value::Null);
    }

    #[tokio::test]
    async fn test_server_ping_is_answered() {
        let (listener, server) = listen().await;
        let _connection = Connection::open(legacy(server)).expect("valid options");

        let mut ws = accept(&listener).await;
        send_text(&mut ws, OPEN_FRAME).await;
        send_text(&mut ws, "40").await;
        send_text(&mut ws, "2").await;

        assert_eq!(next_text(&mut ws).await, "3");
    }

    #[tokio::test]
    async fn test_server_disconnect_closes_channel() {
        let (listener, server) = listen().await;
        let connection = Connection::open(legacy(server)).expect("valid options");
        let mut disconnect = recorder(&connection, "disconnect");

        let mut ws = accept(&listener).await;
        send_text(&mut ws, OPEN_FRAME).await;
        send_text(&mut ws, "40").await;
        send_text(&mut ws, "41").await;

        assert_eq!(
            received(&mut disconnect).await,
            json!("io server disconnect")
        );
        timeout(Duration::from_secs(5), connection.closed())
            .await
            .expect("channel should close");
        assert_eq!(connection.state(), ChannelState::Closed);
    }

    #[tokio::test]
    async fn test_refused_namespace_reports_error() {
        let (listener, server) = listen().await;
        let connection = Connection::open(legacy(server)).expect("valid options");
        let mut error = recorder(&connection, "error");

        let mut ws = accept(&listener).await;
        send_text(&mut ws, OPEN_FRAME).await;
        send_text(&mut ws, r#"44{"message":"Not authorized"}"#).await;

        assert_eq!(
            received(&mut error).await,
            json!({"message": "Not authorized"})
        );
        timeout(Duration::from_secs(5), connection.closed())
            .await
            .expect("channel should close");
    }

    #[tokio::test]
    async fn test_dial_failure_reports_connect_error() {
        let (listener, server) = listen().await;
        drop(listener);

        let connection = Connection::open(legacy(server)).expect("valid options");
        let mut connect_error = recorder(&connection, "connect_error");

        let payload = received(&mut connect_error).await;
        assert!(payload.is_string(), "unexpected payload: {payload}");

        timeout(Duration::from_secs(5), connection.closed())
            .await
            .expect("channel should close without reconnection");
    }

    #[tokio::test]
    async fn test_legacy_reserved_event_loops_back() {
        let (listener, server) = listen().await;
        drop(listener);

        let connection = Connection::open(legacy(server)).expect("valid options");
        let (tx, mut rx) = mpsc::unbounded_channel();
        connection.subscribe(
            "error",
            Box::new(move |payload: Value| {
                let _ = tx.send(payload);
            }),
        );

        connection
            .send("error", json!("local"))
            .expect("reserved emits are delivered locally");
        assert_eq!(received(&mut rx).await, json!("local"));
    }

    #[tokio::test]
    async fn test_modern_reserved_event_is_rejected() {
        let options = ChannelOptions::new(TransportVariant::Modern)
            .with_server("https://127.0.0.1")
            .with_reconnection(false);
        let connection = Connection::open(options).expect("valid options");

        let err = connection.send("disconnect", Value::Null).unwrap_err();
        assert!(matches!(err, Error::ReservedEvent { .. }));
        connection.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_sends_disconnect() {
        let (listener, server) = listen().await;
        let connection = Connection::open(legacy(server)).expect("valid options");

        let mut ws = accept(&listener).await;
        send_text(&mut ws, OPEN_FRAME).await;
        send_text(&mut ws, "40").await;

        timeout(Duration::from_secs(5), async {
            while connection.state() != ChannelState::Open {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("channel should open");

        connection.shutdown();
        assert_eq!(next_text(&mut ws).await, "41");
        timeout(Duration::from_secs(5), connection.closed())
            .await
            .expect("channel should close");
    }

    #[tokio::test]
    async fn test_lost_session_reconnects_and_flushes_buffered_emit() {
        let (listener, server) = listen().await;
        let options = ChannelOptions::new(TransportVariant::Legacy)
            .with_server(server)
            .with_reconnection_delay(Duration::from_millis(10), Duration::from_millis(40));
        let connection = Connection::open(options).expect("valid options");
        let mut connect = recorder(&connection, "connect");
        let mut disconnect = recorder(&connection, "disconnect");

        let mut ws = accept(&listener).await;
        send_text(&mut ws, OPEN_FRAME).await;
        send_text(&mut ws, "40").await;
        assert_eq!(received(&mut connect).await, Value::Null);

        drop(ws);
        assert!(received(&mut disconnect).await.is_string());
        assert_ne!(connection.state(), ChannelState::Closed);

        connection.send("move", json!(1)).expect("event loop alive");

        let mut ws = accept(&listener).await;
        send_text(&mut ws, OPEN_FRAME).await;
        send_text(&mut ws, "40").await;

        assert_eq!(received(&mut connect).await, Value::Null);
        assert_eq!(next_text(&mut ws).await, r#"42["move",1]"#);
        connection.shutdown();
    }

    #[tokio::test]
    async fn test_legacy_client_pings_then_times_out() {
        let (listener, server) = listen().await;
        let connection = Connection::open(legacy(server)).expect("valid options");
        let mut disconnect = recorder(&connection, "disconnect");

        let mut ws = accept(&listener).await;
        send_text(
            &mut ws,
            r#"0{"sid":"s1","upgrades":[],"pingInterval":200,"pingTimeout":200}"#,
        )
        .await;
        send_text(&mut ws, "40").await;

        assert_eq!(next_text(&mut ws).await, "2");
        assert_eq!(received(&mut disconnect).await, json!("ping timeout"));
        timeout(Duration::from_secs(5), connection.closed())
            .await
            .expect("channel should close without reconnection");
    }

    #[tokio::test]
    async fn test_modern_handshake_connects_root_explicitly() {
        let (listener, server) = listen().await;
        let endpoint = Endpoint::from_server(&server, TransportVariant::Legacy)
            .expect("valid server");
        let client = tokio::spawn(async move {
            establish(&endpoint, TransportVariant::Modern).await
        });

        let mut ws = accept(&listener).await;
        send_text(&mut ws, OPEN_FRAME).await;
        assert_eq!(next_text(&mut ws).await, "40");
        send_text(&mut ws, r#"40{"sid":"n1"}"#).await;

        let (_ws, handshake) = timeout(Duration::from_secs(5), client)
            .await
            .expect("handshake should finish")
            .expect("handshake task should not panic")
            .expect("handshake should succeed");
        assert_eq!(handshake.sid, "s1");
    }

    #[tokio::test]
    async fn test_modern_refusal_reports_connect_error_message() {
        let (listener, server) = listen().await;
        let endpoint = Endpoint::from_server(&server, TransportVariant::Legacy)
            .expect("valid server");
        let options = ChannelOptions::new(TransportVariant::Modern).with_reconnection(false);
        let connection = Connection::spawn(endpoint, options);
        let mut connect_error = recorder(&connection, "connect_error");
        let mut error = recorder(&connection, "error");

        let mut ws = accept(&listener).await;
        send_text(&mut ws, OPEN_FRAME).await;
        assert_eq!(next_text(&mut ws).await, "40");
        send_text(&mut ws, r#"44{"message":"Not authorized"}"#).await;

        assert_eq!(received(&mut connect_error).await, json!("Not authorized"));
        timeout(Duration::from_secs(5), connection.closed())
            .await
            .expect("refused channel should close");
        assert!(error.try_recv().is_err());
    }

    #[test]
    fn test_refusal_message_is_text() {
        assert_eq!(
            refusal_message(json!({"message": "Not authorized", "data": {"code": 1}})),
            json!("Not authorized")
        );
        assert_eq!(refusal_message(json!("banned")), json!("banned"));
        assert_eq!(refusal_message(Value::Null), json!("connection refused"));
        assert_eq!(refusal_message(json!({"code": 1})), json!(r#"{"code":1}"#));
    }
}
