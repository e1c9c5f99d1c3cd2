//! WebSocket transport to the media gateway

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use recamera_core::ConsoleError;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::protocol::SignalingMessage;

/// Connection lifecycle of a [`SignalingTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Socket is being opened
    Connecting,
    /// Socket is open and messages can be sent
    Open,
    /// Close was requested locally
    Closing,
    /// Socket is gone
    Closed,
}

/// Raw connection events
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Socket opened
    Open,
    /// Socket failed to open or broke
    Error {
        /// Description of the failure
        reason: String,
    },
    /// Socket closed; always the last event
    Closed {
        /// Close code sent by the peer, if any
        code: Option<u16>,
        /// Whether the close was requested by this side
        by_client: bool,
    },
}

type Handler = Arc<dyn Fn(&SignalingMessage) + Send + Sync>;

#[derive(Default)]
struct Handlers {
    next_id: AtomicU64,
    entries: RwLock<Vec<(u64, Handler)>>,
}

impl Handlers {
    fn dispatch(&self, message: &SignalingMessage) {
        // Snapshot so handlers may subscribe or unsubscribe while running
        let handlers: Vec<Handler> = self.entries.read().iter().map(|(_, h)| h.clone()).collect();
        for handler in handlers {
            handler(message);
        }
    }
}

enum Outbound {
    Text(String),
    Close,
}

/// Registration of a message handler; the handler is removed when this is
/// dropped or [`Subscription::unsubscribe`] is called
#[must_use = "dropping a subscription removes its handler"]
pub struct Subscription {
    id: u64,
    handlers: Arc<Handlers>,
}

impl Subscription {
    /// Remove the handler now
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handlers.entries.write().retain(|(id, _)| *id != self.id);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Handle to one signaling socket
///
/// The socket runs on a background task. Lifecycle changes arrive on the
/// event receiver returned by [`SignalingTransport::connect`]; parsed text
/// messages go to every handler registered with [`SignalingTransport::on_message`].
pub struct SignalingTransport {
    url: String,
    state: Arc<watch::Sender<TransportState>>,
    outbound: mpsc::UnboundedSender<Outbound>,
    handlers: Arc<Handlers>,
}

impl std::fmt::Debug for SignalingTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalingTransport")
            .field("url", &self.url)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl SignalingTransport {
    /// Start connecting to `url`
    ///
    /// Never fails directly: connection problems are reported as
    /// [`TransportEvent::Error`] followed by [`TransportEvent::Closed`].
    /// Must be called inside a tokio runtime.
    pub fn connect(url: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let url = url.into();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(TransportState::Connecting);
        let state = Arc::new(state);
        let handlers = Arc::new(Handlers::default());

        let task = SocketTask {
            url: url.clone(),
            state: state.clone(),
            handlers: handlers.clone(),
            events: event_tx,
        };
        tokio::spawn(task.run(outbound_rx));

        let transport = Self {
            url,
            state,
            outbound: outbound_tx,
            handlers,
        };
        (transport, event_rx)
    }

    /// URL this transport connects to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current lifecycle state
    pub fn state(&self) -> TransportState {
        *self.state.borrow()
    }

    /// Whether messages can be sent
    pub fn is_open(&self) -> bool {
        self.state() == TransportState::Open
    }

    /// Send a message; fails with [`ConsoleError::NotConnected`] unless open
    pub fn send(&self, message: &SignalingMessage) -> Result<(), ConsoleError> {
        if !self.is_open() {
            return Err(ConsoleError::NotConnected);
        }
        debug!("Sending {} message", message.kind());
        self.outbound
            .send(Outbound::Text(message.to_json()))
            .map_err(|_| ConsoleError::NotConnected)
    }

    /// Register a handler for every parsed message
    ///
    /// Handlers run on the socket task in registration order.
    pub fn on_message<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&SignalingMessage) + Send + Sync + 'static,
    {
        let id = self.handlers.next_id.fetch_add(1, Ordering::Relaxed);
        let handler: Handler = Arc::new(handler);
        self.handlers.entries.write().push((id, handler));
        Subscription {
            id,
            handlers: self.handlers.clone(),
        }
    }

    /// Close the socket; safe to call any number of times
    pub fn close(&self) {
        let requested = self.state.send_if_modified(|state| match *state {
            TransportState::Closing | TransportState::Closed => false,
            TransportState::Connecting | TransportState::Open => {
                *state = TransportState::Closing;
                true
            }
        });
        if requested {
            debug!("Closing signaling socket {}", self.url);
            // The task may already have exited
            let _ = self.outbound.send(Outbound::Close);
        }
    }

    /// Wait until the socket task has finished
    ///
    /// A close frame requested with [`SignalingTransport::close`] has been
    /// written by the time this returns.
    pub async fn closed(&self) {
        let mut state = self.state.subscribe();
        let _ = state.wait_for(|s| *s == TransportState::Closed).await;
    }
}

impl Drop for SignalingTransport {
    fn drop(&mut self) {
        self.close();
    }
}

struct SocketTask {
    url: String,
    state: Arc<watch::Sender<TransportState>>,
    handlers: Arc<Handlers>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl SocketTask {
    async fn run(self, mut outbound: mpsc::UnboundedReceiver<Outbound>) {
        // While connecting nothing can be queued except a close request
        let connected = tokio::select! {
            result = connect_async(self.url.as_str()) => result,
            _ = outbound.recv() => {
                debug!("Signaling socket closed before it opened");
                self.finish(None, true);
                return;
            }
        };

        let ws = match connected {
            Ok((ws, _)) => ws,
            Err(e) => {
                error!("Failed to open signaling socket {}: {}", self.url, e);
                let _ = self.events.send(TransportEvent::Error {
                    reason: e.to_string(),
                });
                self.finish(None, false);
                return;
            }
        };

        let opened = self.state.send_if_modified(|state| {
            if *state == TransportState::Connecting {
                *state = TransportState::Open;
                true
            } else {
                false
            }
        });
        if opened {
            info!("Signaling socket open: {}", self.url);
            let _ = self.events.send(TransportEvent::Open);
        }

        let (mut write, mut read) = ws.split();
        loop {
            tokio::select! {
                command = outbound.recv() => match command {
                    Some(Outbound::Text(text)) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            warn!("Failed to send on signaling socket: {}", e);
                            let _ = self.events.send(TransportEvent::Error { reason: e.to_string() });
                            self.finish(None, false);
                            return;
                        }
                    }
                    Some(Outbound::Close) | None => {
                        if let Err(e) = write.send(Message::Close(None)).await {
                            debug!("Close frame not delivered: {}", e);
                        }
                        self.finish(None, true);
                        return;
                    }
                },
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => match SignalingMessage::from_json(&text) {
                        Ok(message) => {
                            debug!("Received {} message", message.kind());
                            self.handlers.dispatch(&message);
                        }
                        Err(e) => warn!("Dropping unparseable signaling message: {}", e),
                    },
                    Some(Ok(Message::Binary(data))) => {
                        debug!("Ignoring {} byte binary frame", data.len());
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let code = frame.map(|f| u16::from(f.code));
                        info!("Signaling socket closed by gateway (code {:?})", code);
                        self.finish(code, false);
                        return;
                    }
                    Some(Ok(_)) => {
                        // Ping/Pong are answered by tungstenite
                    }
                    Some(Err(e)) => {
                        error!("Signaling socket error: {}", e);
                        let _ = self.events.send(TransportEvent::Error { reason: e.to_string() });
                        self.finish(None, false);
                        return;
                    }
                    None => {
                        debug!("Signaling socket stream ended");
                        self.finish(None, false);
                        return;
                    }
                },
            }
        }
    }

    fn finish(&self, code: Option<u16>, by_client: bool) {
        self.state.send_replace(TransportState::Closed);
        let _ = self.events.send(TransportEvent::Closed { code, by_client });
    }
}
