//! Test doubles shared by the facade integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use recamera::{
    FullscreenControl, MediaError, MediaRecorder, MediaRecorderFactory, MediaStream, Notifier, PeerConfig,
    PeerConnection, PeerConnectionFactory, PeerConnectionState, PeerEvent, Playback, RecorderProfile,
    SessionState, SignalingMessage, TrackKind, VideoFrame, VideoSource,
};
use recamera_media::{MediaResult, RecorderEvent, RecorderState, TransceiverDirection};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};

pub const WAIT: Duration = Duration::from_secs(5);

pub type GatewaySocket = WebSocketStream<TcpStream>;

/// In-process stand-in for the camera's signaling gateway
pub struct Gateway {
    pub addr: SocketAddr,
    connections: mpsc::UnboundedReceiver<GatewaySocket>,
}

impl Gateway {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                if let Ok(ws) = accept_async(stream).await {
                    if tx.send(ws).is_err() {
                        return;
                    }
                }
            }
        });
        Self { addr, connections: rx }
    }

    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn url(&self, src: &str) -> String {
        format!("ws://{}/go2rtc/api/ws?src={}", self.addr, src)
    }

    pub async fn accept(&mut self) -> GatewaySocket {
        timeout(WAIT, self.connections.recv())
            .await
            .expect("timed out waiting for a connection")
            .expect("gateway stopped")
    }
}

/// Next signaling message sent by the client
pub async fn next_message(server: &mut GatewaySocket) -> SignalingMessage {
    loop {
        match timeout(WAIT, server.next()).await.expect("timed out waiting for a message") {
            Some(Ok(Message::Text(text))) => return SignalingMessage::from_json(&text).unwrap(),
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
            other => panic!("gateway expected a text message, got {:?}", other),
        }
    }
}

pub async fn send(server: &mut GatewaySocket, message: &SignalingMessage) {
    server.send(Message::Text(message.to_json())).await.unwrap();
}

/// Wait until the client side has closed the socket
pub async fn expect_closed(server: &mut GatewaySocket) {
    loop {
        match timeout(WAIT, server.next()).await.expect("socket stayed open") {
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
            Some(Ok(_)) => continue,
        }
    }
}

pub async fn wait_for_state<F>(state: &mut watch::Receiver<SessionState>, predicate: F) -> SessionState
where
    F: FnMut(&SessionState) -> bool,
{
    timeout(WAIT, state.wait_for(predicate))
        .await
        .expect("timed out waiting for session state")
        .expect("session dropped")
        .clone()
}

pub async fn eventually<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + WAIT;
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Peer connection that records what the session does to it
pub struct MockPeer {
    pub index: usize,
    log: Arc<Mutex<Vec<String>>>,
    events: mpsc::UnboundedSender<PeerEvent>,
    fail_offer: bool,
    pub transceivers: Mutex<Vec<(TrackKind, TransceiverDirection)>>,
    pub remote_answer: Mutex<Option<String>>,
    pub candidates: Mutex<Vec<(String, String)>>,
    closed: AtomicBool,
    senders_stopped: AtomicBool,
}

impl MockPeer {
    pub fn emit(&self, event: PeerEvent) {
        let _ = self.events.send(event);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn senders_stopped(&self) -> bool {
        self.senders_stopped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PeerConnection for MockPeer {
    fn add_transceiver(&self, kind: TrackKind, direction: TransceiverDirection) -> MediaResult<()> {
        self.transceivers.lock().push((kind, direction));
        Ok(())
    }

    async fn create_offer(&self) -> MediaResult<String> {
        self.log.lock().push(format!("offer:{}", self.index));
        if self.fail_offer {
            return Err(MediaError::Negotiation {
                reason: "no codecs".to_string(),
            });
        }
        Ok(format!("offer-{}", self.index))
    }

    async fn set_local_description(&self, _sdp: &str) -> MediaResult<()> {
        Ok(())
    }

    async fn set_remote_answer(&self, sdp: &str) -> MediaResult<()> {
        if sdp == "bad" {
            return Err(MediaError::Negotiation {
                reason: "malformed answer".to_string(),
            });
        }
        *self.remote_answer.lock() = Some(sdp.to_string());
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: &str, sdp_mid: &str) -> MediaResult<()> {
        if candidate == "bad" {
            return Err(MediaError::Negotiation {
                reason: "malformed candidate".to_string(),
            });
        }
        self.candidates.lock().push((candidate.to_string(), sdp_mid.to_string()));
        Ok(())
    }

    fn connection_state(&self) -> PeerConnectionState {
        if self.is_closed() {
            PeerConnectionState::Closed
        } else {
            PeerConnectionState::New
        }
    }

    fn stop_senders(&self) {
        self.senders_stopped.store(true, Ordering::SeqCst);
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.log.lock().push(format!("close:{}", self.index));
        }
    }
}

#[derive(Default)]
pub struct MockPeerFactory {
    pub fail_offer: bool,
    log: Arc<Mutex<Vec<String>>>,
    peers: Mutex<Vec<Arc<MockPeer>>>,
}

impl MockPeerFactory {
    pub fn failing_offers() -> Self {
        Self {
            fail_offer: true,
            ..Self::default()
        }
    }

    pub fn created(&self) -> usize {
        self.peers.lock().len()
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    /// Peer number `index`, counting from one, once it exists
    pub async fn peer(&self, index: usize) -> Arc<MockPeer> {
        eventually(|| self.created() >= index).await;
        self.peers.lock()[index - 1].clone()
    }
}

impl PeerConnectionFactory for MockPeerFactory {
    fn create(&self, _config: &PeerConfig) -> MediaResult<(Arc<dyn PeerConnection>, mpsc::UnboundedReceiver<PeerEvent>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut peers = self.peers.lock();
        let peer = Arc::new(MockPeer {
            index: peers.len() + 1,
            log: self.log.clone(),
            events: tx,
            fail_offer: self.fail_offer,
            transceivers: Mutex::new(Vec::new()),
            remote_answer: Mutex::new(None),
            candidates: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            senders_stopped: AtomicBool::new(false),
        });
        peers.push(peer.clone());
        Ok((peer, rx))
    }
}

/// Recorder whose data is pushed by the test
struct ScriptedRecorder {
    state: RecorderState,
    events: mpsc::UnboundedSender<RecorderEvent>,
}

impl MediaRecorder for ScriptedRecorder {
    fn start(&mut self, _timeslice: Duration) -> MediaResult<()> {
        self.state = RecorderState::Recording;
        Ok(())
    }

    fn stop(&mut self) -> MediaResult<()> {
        self.state = RecorderState::Inactive;
        let _ = self.events.send(RecorderEvent::Stopped);
        Ok(())
    }

    fn state(&self) -> RecorderState {
        self.state
    }
}

#[derive(Default)]
pub struct ScriptedRecorderFactory {
    sender: Mutex<Option<mpsc::UnboundedSender<RecorderEvent>>>,
}

impl ScriptedRecorderFactory {
    pub fn emit(&self, event: RecorderEvent) {
        if let Some(sender) = self.sender.lock().as_ref() {
            let _ = sender.send(event);
        }
    }

    pub fn emit_data(&self, data: &'static [u8]) {
        self.emit(RecorderEvent::Data(Bytes::from_static(data)));
    }
}

impl MediaRecorderFactory for ScriptedRecorderFactory {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        mime_type == "video/webm;codecs=vp9,opus"
    }

    fn create(
        &self,
        _stream: &MediaStream,
        _profile: &RecorderProfile,
    ) -> MediaResult<(Box<dyn MediaRecorder>, mpsc::UnboundedReceiver<RecorderEvent>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.sender.lock() = Some(tx.clone());
        let recorder = ScriptedRecorder {
            state: RecorderState::Inactive,
            events: tx,
        };
        Ok((Box::new(recorder), rx))
    }
}

/// Notifier that keeps every message
#[derive(Default)]
pub struct CollectingNotifier {
    pub successes: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
    pub infos: Mutex<Vec<String>>,
}

impl Notifier for CollectingNotifier {
    fn success(&self, message: &str) {
        self.successes.lock().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }

    fn info(&self, message: &str) {
        self.infos.lock().push(message.to_string());
    }
}

/// Video element double: serves a fixed frame and records playback calls
#[derive(Default)]
pub struct FakeVideo {
    pub size: Option<(u32, u32)>,
    pub block_unmuted_autoplay: bool,
    pub plays: Mutex<Vec<bool>>,
    pub attached_tracks: Mutex<Option<usize>>,
    pub muted: AtomicBool,
}

impl VideoSource for FakeVideo {
    fn video_size(&self) -> Option<(u32, u32)> {
        self.size
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        Some(VideoFrame {
            width: 4,
            height: 2,
            data: vec![200; 4 * 2 * 4],
            timestamp: 0,
        })
    }
}

impl Playback for FakeVideo {
    fn attach(&self, stream: Option<&MediaStream>) {
        *self.attached_tracks.lock() = stream.map(|s| s.tracks().len());
    }

    fn play(&self, muted: bool) -> Result<(), String> {
        self.plays.lock().push(muted);
        if self.block_unmuted_autoplay && !muted {
            return Err("NotAllowedError".to_string());
        }
        Ok(())
    }

    fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeScreen {
    pub active: AtomicBool,
}

impl FullscreenControl for FakeScreen {
    fn is_supported(&self) -> bool {
        true
    }

    fn is_fullscreen(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), String> {
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn exit(&self) -> Result<(), String> {
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }
}
