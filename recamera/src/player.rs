//! Live view player
//!
//! [`LivePlayer`] puts the page-level controls on top of a [`WebRtcSession`]:
//! stream switching, local recording, snapshots, mute and fullscreen. A
//! background task follows the session state and drives the recording timer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use recamera_core::ConsoleError;
use recamera_media::{
    capture_snapshot, format_elapsed, MediaError, MediaRecorderFactory, PeerConnectionFactory, QualityTier,
    RecorderProfile, RecordingFile, RecordingPipeline, Snapshot, VideoSource,
};
use recamera_signaling::{SignalingEndpoint, StreamSource};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ConsoleConfig;
use crate::download::{DirectoryDownloadSink, DownloadSink};
use crate::error::PlayerError;
use crate::event::{EventStream, PlayerEvent};
use crate::fullscreen::{is_fullscreen_shortcut, toggle_fullscreen, FullscreenControl, KeyPress};
use crate::notify::{LogNotifier, Notifier};
use crate::playback::Playback;
use crate::session::{SessionState, WebRtcSession};

/// Interval of the recording timer
const RECORDING_TICK: Duration = Duration::from_secs(1);

/// Fluent builder for a [`LivePlayer`]
pub struct LivePlayerBuilder {
    config: ConsoleConfig,
    peers: Arc<dyn PeerConnectionFactory>,
    recorders: Arc<dyn MediaRecorderFactory>,
    stream: StreamSource,
    quality: QualityTier,
    notifier: Option<Arc<dyn Notifier>>,
    downloads: Option<Arc<dyn DownloadSink>>,
    fullscreen: Option<Arc<dyn FullscreenControl>>,
    video: Option<Arc<dyn VideoSource>>,
    playback: Option<Arc<dyn Playback>>,
}

impl LivePlayerBuilder {
    fn new(
        config: ConsoleConfig,
        peers: Arc<dyn PeerConnectionFactory>,
        recorders: Arc<dyn MediaRecorderFactory>,
    ) -> Self {
        Self {
            stream: config.default_stream,
            quality: config.default_quality,
            config,
            peers,
            recorders,
            notifier: None,
            downloads: None,
            fullscreen: None,
            video: None,
            playback: None,
        }
    }

    /// Stream watched on connect
    pub fn stream(mut self, stream: StreamSource) -> Self {
        self.stream = stream;
        self
    }

    /// Initial recording quality
    pub fn quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }

    /// Where user-facing messages go; defaults to the log
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Where files go; defaults to the configured download directory
    pub fn downloads(mut self, downloads: Arc<dyn DownloadSink>) -> Self {
        self.downloads = Some(downloads);
        self
    }

    /// Fullscreen API of the host
    pub fn fullscreen(mut self, control: Arc<dyn FullscreenControl>) -> Self {
        self.fullscreen = Some(control);
        self
    }

    /// Source of decoded frames for snapshots and recording size
    pub fn video(mut self, video: Arc<dyn VideoSource>) -> Self {
        self.video = Some(video);
        self
    }

    /// Element playing the received stream
    pub fn playback(mut self, playback: Arc<dyn Playback>) -> Self {
        self.playback = Some(playback);
        self
    }

    /// Create the player; must be called inside a tokio runtime
    pub fn build(self) -> LivePlayer {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let recording = RecordingPipeline::new(self.recorders).with_timeslice(self.config.recorder_timeslice());

        let inner = Arc::new(PlayerInner {
            endpoint: self.config.endpoint(),
            session: WebRtcSession::new(self.peers, self.config.peer_config()),
            recording: tokio::sync::Mutex::new(recording),
            stream: Mutex::new(self.stream),
            quality: Mutex::new(self.quality),
            muted: AtomicBool::new(false),
            switching: AtomicBool::new(false),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
            downloads: self
                .downloads
                .unwrap_or_else(|| Arc::new(DirectoryDownloadSink::new(self.config.download_dir.clone()))),
            fullscreen: self.fullscreen,
            video: self.video,
            playback: self.playback,
            events: event_tx,
        });

        let monitor = tokio::spawn(monitor(inner.clone(), inner.session.subscribe()));
        LivePlayer {
            inner,
            events: Mutex::new(Some(event_rx)),
            monitor,
        }
    }
}

struct PlayerInner {
    endpoint: SignalingEndpoint,
    session: WebRtcSession,
    recording: tokio::sync::Mutex<RecordingPipeline>,
    stream: Mutex<StreamSource>,
    quality: Mutex<QualityTier>,
    muted: AtomicBool,
    switching: AtomicBool,
    notifier: Arc<dyn Notifier>,
    downloads: Arc<dyn DownloadSink>,
    fullscreen: Option<Arc<dyn FullscreenControl>>,
    video: Option<Arc<dyn VideoSource>>,
    playback: Option<Arc<dyn Playback>>,
    events: mpsc::UnboundedSender<PlayerEvent>,
}

impl PlayerInner {
    fn emit(&self, event: PlayerEvent) {
        debug!("Player event: {}", event.event_type());
        let _ = self.events.send(event);
    }

    fn set_muted(&self, muted: bool) {
        let previous = self.muted.swap(muted, Ordering::SeqCst);
        if let Some(playback) = &self.playback {
            playback.set_muted(muted);
        }
        if previous != muted {
            self.emit(PlayerEvent::MuteChanged { muted });
        }
    }

    async fn on_state(&self, state: SessionState) {
        self.emit(PlayerEvent::StateChanged { state: state.clone() });
        match state {
            SessionState::Connected => self.start_playback(),
            SessionState::Failed { .. } | SessionState::Closed => {
                if let Some(playback) = &self.playback {
                    playback.attach(None);
                }
                // Reported to the user by finish_recording
                let _ = self.finish_recording().await;
            }
            _ => {}
        }
    }

    fn start_playback(&self) {
        let Some(playback) = &self.playback else {
            return;
        };
        playback.attach(self.session.stream().as_ref());

        let muted = self.muted.load(Ordering::SeqCst);
        if let Err(reason) = playback.play(muted) {
            warn!("Autoplay failed: {}", reason);
            if !muted {
                // Platforms allow muted autoplay
                self.set_muted(true);
                if let Err(reason) = playback.play(true) {
                    error!("Playback failed even when muted: {}", reason);
                }
            }
        }
    }

    async fn poll_recording(&self) {
        let mut recording = self.recording.lock().await;
        if !recording.is_recording() {
            return;
        }
        match recording.poll() {
            Ok(()) => {
                if let Some(elapsed) = recording.elapsed() {
                    self.emit(PlayerEvent::RecordingTick {
                        elapsed: format_elapsed(elapsed),
                    });
                }
            }
            Err(e) => {
                drop(recording);
                self.notifier.error(&format!("Recording error: {}", e));
                self.emit(PlayerEvent::RecordingFailed { reason: e.to_string() });
            }
        }
    }

    async fn finish_recording(&self) -> Result<Option<RecordingFile>, PlayerError> {
        let result = {
            let mut recording = self.recording.lock().await;
            recording.stop().await
        };

        let file = match result {
            Ok(Some(file)) => file,
            Ok(None) => return Ok(None),
            Err(e) => {
                let message = match e {
                    MediaError::EmptyRecording { .. } => "Recording failed: no data was recorded".to_string(),
                    ref other => format!("Recording failed: {}", other),
                };
                self.notifier.error(&message);
                self.emit(PlayerEvent::RecordingFailed { reason: e.to_string() });
                return Err(e.into());
            }
        };

        match self.downloads.save(&file.file_name, &file.mime_type, &file.data) {
            Ok(path) => {
                info!("Recording written to {}", path.display());
                self.notifier.success(&format!("Recording saved: {}", file.file_name));
                self.emit(PlayerEvent::RecordingSaved {
                    file_name: file.file_name.clone(),
                    bytes: file.data.len(),
                    duration: file.duration,
                });
                Ok(Some(file))
            }
            Err(e) => {
                self.notifier.error(&format!("Failed to save recording: {}", e));
                self.emit(PlayerEvent::RecordingFailed { reason: e.to_string() });
                Err(e.into())
            }
        }
    }
}

async fn monitor(inner: Arc<PlayerInner>, mut state: watch::Receiver<SessionState>) {
    let mut tick = tokio::time::interval(RECORDING_TICK);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    return;
                }
                let current = state.borrow_and_update().clone();
                inner.on_state(current).await;
            }
            _ = tick.tick() => inner.poll_recording().await,
        }
    }
}

/// The live view: one session plus recording, snapshots and page controls
pub struct LivePlayer {
    inner: Arc<PlayerInner>,
    events: Mutex<Option<mpsc::UnboundedReceiver<PlayerEvent>>>,
    monitor: JoinHandle<()>,
}

impl std::fmt::Debug for LivePlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivePlayer")
            .field("stream", &self.current_stream())
            .field("session", &self.inner.session)
            .finish()
    }
}

impl LivePlayer {
    /// Start building a player
    pub fn builder(
        config: ConsoleConfig,
        peers: Arc<dyn PeerConnectionFactory>,
        recorders: Arc<dyn MediaRecorderFactory>,
    ) -> LivePlayerBuilder {
        LivePlayerBuilder::new(config, peers, recorders)
    }

    /// Player events; only the first call receives them
    pub fn events(&self) -> EventStream {
        match self.events.lock().take() {
            Some(receiver) => EventStream::new(receiver),
            None => EventStream::closed(),
        }
    }

    /// The underlying session
    pub fn session(&self) -> &WebRtcSession {
        &self.inner.session
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.inner.session.state()
    }

    /// Observe session state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.session.subscribe()
    }

    /// Whether media is flowing
    pub fn is_connected(&self) -> bool {
        self.inner.session.is_connected()
    }

    /// Stream currently selected
    pub fn current_stream(&self) -> StreamSource {
        *self.inner.stream.lock()
    }

    /// Whether a stream switch is in progress
    pub fn is_switching(&self) -> bool {
        self.inner.switching.load(Ordering::SeqCst)
    }

    /// Recording quality for the next recording
    pub fn quality(&self) -> QualityTier {
        *self.inner.quality.lock()
    }

    /// Change the quality used by the next recording
    pub fn set_quality(&self, quality: QualityTier) {
        *self.inner.quality.lock() = quality;
    }

    /// Connect to the selected stream, replacing any running session
    ///
    /// A running recording is stopped and saved before the old session closes.
    pub async fn connect(&self) {
        if self.is_recording().await {
            self.inner.notifier.info("Reconnecting stops the recording");
            // Reported to the user by finish_recording
            let _ = self.inner.finish_recording().await;
        }
        let url = self.inner.endpoint.url(self.current_stream());
        self.inner.session.start(url).await;
    }

    /// Stop recording and close the session
    pub async fn disconnect(&self) {
        // Reported to the user by finish_recording
        let _ = self.inner.finish_recording().await;
        self.inner.session.stop().await;
        if let Some(playback) = &self.inner.playback {
            playback.attach(None);
        }
    }

    /// Watch a different stream
    ///
    /// Returns `false` without doing anything when `source` is already
    /// selected or another switch is running. A running recording is stopped
    /// and saved first; the old session is fully closed before the new one starts.
    pub async fn switch_stream(&self, source: StreamSource) -> bool {
        let from = self.current_stream();
        if from == source {
            return false;
        }
        if self.inner.switching.swap(true, Ordering::SeqCst) {
            debug!("Stream switch already in progress");
            return false;
        }
        let _switching = SwitchGuard(&self.inner.switching);

        if self.is_recording().await {
            self.inner.notifier.info("Switching streams stops the recording");
            // Reported to the user by finish_recording
            let _ = self.inner.finish_recording().await;
        }

        self.inner.session.stop().await;
        if let Some(playback) = &self.inner.playback {
            playback.attach(None);
        }

        *self.inner.stream.lock() = source;
        info!("Switching stream: {} -> {}", from, source);
        self.inner.emit(PlayerEvent::StreamSwitched { from, to: source });
        self.inner.session.start(self.inner.endpoint.url(source)).await;
        true
    }

    /// Whether a recording is running
    pub async fn is_recording(&self) -> bool {
        self.inner.recording.lock().await.is_recording()
    }

    /// Elapsed recording time as `HH:MM:SS`
    pub async fn recording_elapsed(&self) -> Option<String> {
        self.inner.recording.lock().await.elapsed().map(format_elapsed)
    }

    /// Start recording the received stream
    pub async fn start_recording(&self) -> Result<RecorderProfile, PlayerError> {
        if !self.is_connected() {
            self.inner.notifier.error("Connect to the video stream first");
            return Err(ConsoleError::NotConnected.into());
        }

        let stream = self.inner.session.stream();
        let size = self
            .inner
            .video
            .as_ref()
            .and_then(|video| video.video_size())
            .unwrap_or((0, 0));
        let quality = self.quality();

        let result = self.inner.recording.lock().await.start(stream.as_ref(), size, quality);
        match result {
            Ok(profile) => {
                self.inner.notifier.success("Recording started");
                self.inner.emit(PlayerEvent::RecordingStarted {
                    profile: profile.clone(),
                });
                Ok(profile)
            }
            Err(e) => {
                self.inner.notifier.error(&format!("Failed to start recording: {}", e));
                Err(e.into())
            }
        }
    }

    /// Stop recording and save the file
    ///
    /// Returns `Ok(None)` when nothing was recording.
    pub async fn stop_recording(&self) -> Result<Option<RecordingFile>, PlayerError> {
        self.inner.finish_recording().await
    }

    /// Save the current frame as a PNG
    pub fn snapshot(&self) -> Result<Snapshot, PlayerError> {
        let result = match &self.inner.video {
            Some(video) => capture_snapshot(&**video, self.is_connected(), Utc::now()).map_err(PlayerError::from),
            None => Err(MediaError::FrameUnavailable {
                reason: "no video output attached".to_string(),
            }
            .into()),
        };

        let saved = result.and_then(|snapshot| {
            self.inner.downloads.save(&snapshot.file_name, "image/png", &snapshot.data)?;
            Ok(snapshot)
        });
        match saved {
            Ok(snapshot) => {
                self.inner.notifier.success(&format!("Snapshot saved: {}", snapshot.file_name));
                self.inner.emit(PlayerEvent::SnapshotSaved {
                    file_name: snapshot.file_name.clone(),
                });
                Ok(snapshot)
            }
            Err(e) => {
                self.inner.notifier.error(&format!("Snapshot failed: {}", e));
                self.inner.emit(PlayerEvent::SnapshotFailed { reason: e.to_string() });
                Err(e)
            }
        }
    }

    /// Whether audio is muted
    pub fn is_muted(&self) -> bool {
        self.inner.muted.load(Ordering::SeqCst)
    }

    /// Flip the mute flag; returns the new value
    pub fn toggle_mute(&self) -> bool {
        let muted = !self.is_muted();
        self.inner.set_muted(muted);
        muted
    }

    /// Enter or leave fullscreen; returns whether fullscreen is now active
    pub fn toggle_fullscreen(&self) -> Result<bool, PlayerError> {
        let control = self.inner.fullscreen.as_ref().ok_or_else(|| ConsoleError::InvalidState {
            expected: "fullscreen control".to_string(),
            actual: "none".to_string(),
        })?;
        let active = toggle_fullscreen(control.as_ref())?;
        self.inner.emit(PlayerEvent::FullscreenChanged { active });
        Ok(active)
    }

    /// Handle a key press; returns `true` when it was consumed
    pub fn handle_key(&self, press: &KeyPress) -> bool {
        if !is_fullscreen_shortcut(press, self.is_connected()) {
            return false;
        }
        if let Err(e) = self.toggle_fullscreen() {
            warn!("Fullscreen toggle failed: {}", e);
        }
        true
    }
}

impl Drop for LivePlayer {
    fn drop(&mut self) {
        self.monitor.abort();

        let recording = match self.inner.recording.try_lock() {
            Ok(recording) => recording.is_recording(),
            Err(_) => true,
        };
        if !recording {
            return;
        }
        // The session closes once this task releases the last reference
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = self.inner.clone();
                handle.spawn(async move {
                    let _ = inner.finish_recording().await;
                });
            }
            Err(_) => warn!("Player dropped outside a runtime, recording discarded"),
        }
    }
}

/// Clears the switching flag however the switch ends
struct SwitchGuard<'a>(&'a AtomicBool);

impl Drop for SwitchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
