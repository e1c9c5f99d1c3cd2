//! WebRTC session controller
//!
//! [`WebRtcSession`] is the only owner of the live view's signaling socket and
//! peer connection. Each [`WebRtcSession::start`] begins a new generation;
//! anything still running for an older generation notices on its next step
//! and leaves shared state alone.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use recamera_media::{
    MediaStream, PeerConfig, PeerConnection, PeerConnectionFactory, PeerConnectionState, PeerEvent,
    TrackKind, TransceiverDirection,
};
use recamera_signaling::protocol::DEFAULT_SDP_MID;
use recamera_signaling::{SignalingMessage, SignalingTransport, Subscription, TransportEvent};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// How long `stop` waits for the old socket to finish closing
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Lifecycle of the live view connection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Never started
    #[default]
    Idle,
    /// Signaling socket is opening
    SignalingConnecting,
    /// Offer sent, waiting for media
    OfferSent,
    /// Media is flowing
    Connected,
    /// The session ended with an error; the user must retry
    Failed {
        /// What went wrong
        reason: String,
    },
    /// Stopped locally
    Closed,
}

impl SessionState {
    /// Whether media is flowing
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected)
    }

    /// Whether the session ended with an error
    pub fn is_failed(&self) -> bool {
        matches!(self, SessionState::Failed { .. })
    }

    /// Whether a connection attempt is in progress
    pub fn is_connecting(&self) -> bool {
        matches!(self, SessionState::SignalingConnecting | SessionState::OfferSent)
    }
}

struct ActiveSession {
    id: Uuid,
    url: String,
    transport: Arc<SignalingTransport>,
    peer: Option<Arc<dyn PeerConnection>>,
    stream: Option<MediaStream>,
    driver: Option<JoinHandle<()>>,
    _messages: Subscription,
}

impl ActiveSession {
    /// Release every resource; returns the transport so the caller can wait for it
    fn release(self) -> Arc<SignalingTransport> {
        let ActiveSession {
            id,
            transport,
            peer,
            stream,
            driver,
            ..
        } = self;
        if let Some(driver) = driver {
            driver.abort();
        }
        if let Some(peer) = peer {
            peer.stop_senders();
            peer.close();
        }
        drop(stream);
        transport.close();
        debug!(session = %id, "Session resources released");
        transport
    }
}

#[derive(Default)]
struct Current {
    generation: u64,
    active: Option<ActiveSession>,
}

struct Shared {
    state: watch::Sender<SessionState>,
    current: Mutex<Current>,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        self.current.lock().generation == generation
    }

    fn set_state(&self, generation: u64, state: SessionState) {
        let current = self.current.lock();
        if current.generation == generation {
            self.state.send_replace(state);
        }
    }

    fn attach_peer(&self, generation: u64, peer: Arc<dyn PeerConnection>) -> bool {
        let mut current = self.current.lock();
        if current.generation != generation {
            return false;
        }
        match current.active.as_mut() {
            Some(active) => {
                active.peer = Some(peer);
                true
            }
            None => false,
        }
    }

    fn add_track(&self, generation: u64, track: recamera_media::MediaTrack) {
        let mut current = self.current.lock();
        if current.generation != generation {
            return;
        }
        if let Some(active) = current.active.as_mut() {
            debug!("Received remote {} track {}", track.kind().as_str(), track.id());
            active.stream.get_or_insert_with(MediaStream::new).add_track(track);
        }
    }

    /// End the current generation with an error and release its resources
    fn fail(&self, generation: u64, reason: String) {
        let active = {
            let mut current = self.current.lock();
            if current.generation != generation {
                return;
            }
            error!("WebRTC session failed: {}", reason);
            self.state.send_replace(SessionState::Failed { reason });
            current.active.take()
        };
        if let Some(active) = active {
            active.release();
        }
    }
}

enum Abort {
    Stale,
    Failed(String),
}

/// Controller for the single live WebRTC session
pub struct WebRtcSession {
    factory: Arc<dyn PeerConnectionFactory>,
    peer_config: PeerConfig,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for WebRtcSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebRtcSession")
            .field("state", &*self.shared.state.borrow())
            .field("session_id", &self.session_id())
            .finish()
    }
}

impl WebRtcSession {
    /// Create an idle session that builds peer connections with `factory`
    pub fn new(factory: Arc<dyn PeerConnectionFactory>, peer_config: PeerConfig) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            factory,
            peer_config,
            shared: Arc::new(Shared {
                state,
                current: Mutex::new(Current::default()),
            }),
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.shared.state.borrow().clone()
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Whether media is flowing
    pub fn is_connected(&self) -> bool {
        self.shared.state.borrow().is_connected()
    }

    /// Identifier of the running session, if any
    pub fn session_id(&self) -> Option<Uuid> {
        self.shared.current.lock().active.as_ref().map(|a| a.id)
    }

    /// Signaling URL of the running session, if any
    pub fn url(&self) -> Option<String> {
        self.shared.current.lock().active.as_ref().map(|a| a.url.clone())
    }

    /// Remote media received so far
    pub fn stream(&self) -> Option<MediaStream> {
        self.shared.current.lock().active.as_ref().and_then(|a| a.stream.clone())
    }

    /// Start a session against `signaling_url`
    ///
    /// Any running session is torn down completely first, including waiting
    /// for its socket to close. Failures are reported through the state
    /// channel, never returned.
    pub async fn start(&self, signaling_url: impl Into<String>) -> watch::Receiver<SessionState> {
        self.stop().await;

        let url = signaling_url.into();
        let id = Uuid::new_v4();
        let (transport, transport_events) = SignalingTransport::connect(url.clone());
        let transport = Arc::new(transport);

        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let subscription = transport.on_message(move |message| {
            let _ = message_tx.send(message.clone());
        });

        let generation = {
            let mut current = self.shared.current.lock();
            current.generation += 1;
            current.active = Some(ActiveSession {
                id,
                url: url.clone(),
                transport: transport.clone(),
                peer: None,
                stream: None,
                driver: None,
                _messages: subscription,
            });
            self.shared.state.send_replace(SessionState::SignalingConnecting);
            current.generation
        };
        info!(session = %id, "Starting WebRTC session via {}", url);

        let driver = SessionDriver {
            generation,
            shared: self.shared.clone(),
            factory: self.factory.clone(),
            peer_config: self.peer_config.clone(),
            transport,
        };
        let handle = tokio::spawn(driver.run(transport_events, message_rx));

        {
            let mut current = self.shared.current.lock();
            let is_current = current.generation == generation;
            match current.active.as_mut() {
                Some(active) if is_current => active.driver = Some(handle),
                _ => handle.abort(),
            }
        }

        self.subscribe()
    }

    /// Stop the running session
    ///
    /// Stops outbound tracks, closes the peer connection and the socket, and
    /// forgets the received stream. Safe to call at any time, any number of times.
    pub async fn stop(&self) {
        let Some(active) = self.detach() else {
            return;
        };
        let id = active.id;
        let transport = active.release();
        if tokio::time::timeout(CLOSE_TIMEOUT, transport.closed()).await.is_err() {
            warn!(session = %id, "Signaling socket did not close within {:?}", CLOSE_TIMEOUT);
        }
        info!(session = %id, "WebRTC session stopped");
    }

    fn detach(&self) -> Option<ActiveSession> {
        let mut current = self.shared.current.lock();
        current.generation += 1;
        let active = current.active.take();
        if active.is_some() {
            self.shared.state.send_replace(SessionState::Closed);
        }
        active
    }
}

impl Drop for WebRtcSession {
    fn drop(&mut self) {
        if let Some(active) = self.detach() {
            active.release();
        }
    }
}

struct SessionDriver {
    generation: u64,
    shared: Arc<Shared>,
    factory: Arc<dyn PeerConnectionFactory>,
    peer_config: PeerConfig,
    transport: Arc<SignalingTransport>,
}

async fn next_peer_event(events: &mut Option<mpsc::UnboundedReceiver<PeerEvent>>) -> Option<PeerEvent> {
    match events {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

impl SessionDriver {
    async fn run(
        self,
        mut transport_events: mpsc::UnboundedReceiver<TransportEvent>,
        mut messages: mpsc::UnboundedReceiver<SignalingMessage>,
    ) {
        let mut peer: Option<Arc<dyn PeerConnection>> = None;
        let mut peer_events: Option<mpsc::UnboundedReceiver<PeerEvent>> = None;

        loop {
            if !self.shared.is_current(self.generation) {
                return;
            }

            let outcome = tokio::select! {
                event = transport_events.recv() => match event {
                    Some(TransportEvent::Open) => match self.negotiate().await {
                        Ok((connection, events)) => {
                            peer = Some(connection);
                            peer_events = Some(events);
                            Ok(())
                        }
                        Err(abort) => Err(abort),
                    },
                    Some(TransportEvent::Error { reason }) => {
                        Err(Abort::Failed(format!("Signaling connection error: {}", reason)))
                    }
                    Some(TransportEvent::Closed { by_client: true, .. }) => Err(Abort::Stale),
                    Some(TransportEvent::Closed { code, .. }) => {
                        debug!("Gateway closed the socket (code {:?})", code);
                        Err(Abort::Failed("Signaling connection closed".to_string()))
                    }
                    None => Err(Abort::Failed("Signaling connection closed".to_string())),
                },
                Some(message) = messages.recv() => self.handle_message(peer.clone(), message).await,
                event = next_peer_event(&mut peer_events) => match event {
                    Some(event) => self.handle_peer_event(event),
                    None => {
                        peer_events = None;
                        Ok(())
                    }
                },
            };

            match outcome {
                Ok(()) => {}
                Err(Abort::Stale) => return,
                Err(Abort::Failed(reason)) => {
                    self.shared.fail(self.generation, reason);
                    return;
                }
            }
        }
    }

    fn ensure_current(&self) -> Result<(), Abort> {
        if self.shared.is_current(self.generation) {
            Ok(())
        } else {
            Err(Abort::Stale)
        }
    }

    /// Create the peer connection and send the offer
    async fn negotiate(&self) -> Result<(Arc<dyn PeerConnection>, mpsc::UnboundedReceiver<PeerEvent>), Abort> {
        let (peer, events) = self
            .factory
            .create(&self.peer_config)
            .map_err(|e| Abort::Failed(format!("Failed to create peer connection: {}", e)))?;
        if !self.shared.attach_peer(self.generation, peer.clone()) {
            peer.close();
            return Err(Abort::Stale);
        }

        for kind in [TrackKind::Video, TrackKind::Audio] {
            peer.add_transceiver(kind, TransceiverDirection::RecvOnly)
                .map_err(|e| Abort::Failed(format!("Failed to add {} transceiver: {}", kind.as_str(), e)))?;
        }

        let offer = peer
            .create_offer()
            .await
            .map_err(|e| Abort::Failed(format!("Failed to create WebRTC offer: {}", e)))?;
        self.ensure_current()?;

        peer.set_local_description(&offer)
            .await
            .map_err(|e| Abort::Failed(format!("Failed to create WebRTC offer: {}", e)))?;
        self.ensure_current()?;

        self.transport
            .send(&SignalingMessage::Offer { sdp: offer })
            .map_err(|e| Abort::Failed(format!("Failed to send offer: {}", e)))?;
        debug!("Offer sent");
        self.shared.set_state(self.generation, SessionState::OfferSent);
        Ok((peer, events))
    }

    async fn handle_message(&self, peer: Option<Arc<dyn PeerConnection>>, message: SignalingMessage) -> Result<(), Abort> {
        match message {
            SignalingMessage::Answer { sdp } => match peer {
                Some(peer) => {
                    if let Err(e) = peer.set_remote_answer(&sdp).await {
                        warn!("Failed to apply answer: {}", e);
                    }
                }
                None => warn!("Answer arrived before an offer was sent"),
            },
            SignalingMessage::Candidate { candidate } => match peer {
                Some(peer) => {
                    if let Err(e) = peer.add_ice_candidate(&candidate, DEFAULT_SDP_MID).await {
                        warn!("Failed to add remote candidate: {}", e);
                    }
                }
                None => warn!("Candidate arrived before an offer was sent"),
            },
            ref error @ SignalingMessage::Error { ref message } => {
                if error.is_webrtc_error() {
                    return Err(Abort::Failed(message.clone()));
                }
                warn!("Gateway reported: {}", message);
            }
            other => debug!("Ignoring {} message", other.kind()),
        }
        Ok(())
    }

    fn handle_peer_event(&self, event: PeerEvent) -> Result<(), Abort> {
        match event {
            PeerEvent::IceCandidate(candidate) => {
                if let Err(e) = self.transport.send(&SignalingMessage::Candidate { candidate }) {
                    warn!("Failed to forward local candidate: {}", e);
                }
            }
            PeerEvent::IceGatheringComplete => debug!("ICE gathering complete"),
            PeerEvent::StateChanged(state) => {
                debug!("Peer connection state: {:?}", state);
                match state {
                    PeerConnectionState::Connected => {
                        info!("WebRTC connected");
                        self.shared.set_state(self.generation, SessionState::Connected);
                    }
                    PeerConnectionState::Failed => {
                        return Err(Abort::Failed("WebRTC connection failed".to_string()));
                    }
                    PeerConnectionState::Disconnected => {
                        return Err(Abort::Failed("WebRTC connection lost".to_string()));
                    }
                    _ => {}
                }
            }
            PeerEvent::Track(track) => self.shared.add_track(self.generation, track),
        }
        Ok(())
    }
}
