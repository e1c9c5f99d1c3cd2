//! Local recording of the live stream
//!
//! [`RecordingPipeline`] owns at most one recorder. Chunks emitted while
//! recording are buffered in arrival order and joined into a single file
//! when the recording stops.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::codecs::{BitratePlan, RecorderProfile};
use crate::error::{MediaError, MediaResult};
use crate::tracks::MediaStream;

/// Interval at which the recorder hands over data
pub const DEFAULT_TIMESLICE: Duration = Duration::from_millis(1000);
/// How long `stop` waits for the recorder to flush
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);
/// Size assumed when the video element has not reported one yet
pub const FALLBACK_VIDEO_SIZE: (u32, u32) = (1920, 1080);

const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// User-selected recording quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Full bitrate
    #[default]
    High,
    /// 60% bitrate
    Medium,
    /// 30% bitrate
    Low,
}

impl QualityTier {
    /// Multiplier applied to the resolution's base bitrate
    pub fn factor(&self) -> f64 {
        match self {
            QualityTier::High => 1.0,
            QualityTier::Medium => 0.6,
            QualityTier::Low => 0.3,
        }
    }

    /// Audio bitrate for this tier
    pub fn audio_bitrate(&self) -> u32 {
        match self {
            QualityTier::High => 192_000,
            QualityTier::Medium | QualityTier::Low => 128_000,
        }
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::High => "high",
            QualityTier::Medium => "medium",
            QualityTier::Low => "low",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(QualityTier::High),
            "medium" => Ok(QualityTier::Medium),
            "low" => Ok(QualityTier::Low),
            other => Err(MediaError::RecorderUnavailable {
                reason: format!("unknown quality tier '{}'", other),
            }),
        }
    }
}

/// Base video bitrate for a frame of `pixels` pixels
pub fn base_video_bitrate(pixels: u64) -> u32 {
    match pixels {
        p if p >= 2_000_000 => 12_000_000,
        p if p >= 900_000 => 8_000_000,
        p if p >= 300_000 => 4_000_000,
        _ => 2_000_000,
    }
}

/// Bitrates for a stream of the given size; zero dimensions fall back to 1080p
pub fn bitrate_plan(width: u32, height: u32, tier: QualityTier) -> BitratePlan {
    let width = if width == 0 { FALLBACK_VIDEO_SIZE.0 } else { width };
    let height = if height == 0 { FALLBACK_VIDEO_SIZE.1 } else { height };
    let base = base_video_bitrate(u64::from(width) * u64::from(height));
    BitratePlan {
        video: (f64::from(base) * tier.factor()).round() as u32,
        audio: tier.audio_bitrate(),
    }
}

/// Timestamp used in produced file names
pub fn file_timestamp(at: DateTime<Utc>) -> String {
    at.format(FILE_TIMESTAMP_FORMAT).to_string()
}

/// Format a recording duration as `HH:MM:SS`
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Recorder lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// Not recording
    Inactive,
    /// Producing data
    Recording,
}

/// Notifications from a recorder
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// Encoded data became available
    Data(Bytes),
    /// The recorder hit a runtime error
    Error(String),
    /// The recorder has flushed its last data
    Stopped,
}

/// An encoder attached to a media stream
pub trait MediaRecorder: Send {
    /// Begin recording, emitting data every `timeslice`
    fn start(&mut self, timeslice: Duration) -> MediaResult<()>;

    /// Stop recording; remaining data is emitted before [`RecorderEvent::Stopped`]
    fn stop(&mut self) -> MediaResult<()>;

    /// Current state
    fn state(&self) -> RecorderState;
}

/// Creates recorders for the runtime's encoders
pub trait MediaRecorderFactory: Send + Sync {
    /// Whether a MIME type can be recorded
    fn is_type_supported(&self, mime_type: &str) -> bool;

    /// Create a recorder for `stream` and the channel its events arrive on
    fn create(
        &self,
        stream: &MediaStream,
        profile: &RecorderProfile,
    ) -> MediaResult<(Box<dyn MediaRecorder>, mpsc::UnboundedReceiver<RecorderEvent>)>;
}

/// A finished recording ready for download
#[derive(Debug, Clone)]
pub struct RecordingFile {
    /// Suggested file name
    pub file_name: String,
    /// MIME type of the data
    pub mime_type: String,
    /// File contents
    pub data: Bytes,
    /// Wall time spent recording
    pub duration: Duration,
}

struct ActiveRecording {
    recorder: Box<dyn MediaRecorder>,
    events: mpsc::UnboundedReceiver<RecorderEvent>,
    profile: RecorderProfile,
    chunks: Vec<Bytes>,
    started: Instant,
    flushed: bool,
}

impl ActiveRecording {
    fn push(&mut self, data: Bytes) {
        if data.is_empty() {
            return;
        }
        debug!("Recorded chunk of {} bytes ({} total)", data.len(), self.chunks.len() + 1);
        self.chunks.push(data);
    }
}

/// Start/stop control over a single recorder
pub struct RecordingPipeline {
    factory: Arc<dyn MediaRecorderFactory>,
    timeslice: Duration,
    flush_timeout: Duration,
    active: Option<ActiveRecording>,
}

impl fmt::Debug for RecordingPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingPipeline")
            .field("timeslice", &self.timeslice)
            .field("recording", &self.is_recording())
            .finish()
    }
}

impl RecordingPipeline {
    /// Create a pipeline using `factory` for recorders
    pub fn new(factory: Arc<dyn MediaRecorderFactory>) -> Self {
        Self {
            factory,
            timeslice: DEFAULT_TIMESLICE,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            active: None,
        }
    }

    /// Override the data interval
    pub fn with_timeslice(mut self, timeslice: Duration) -> Self {
        self.timeslice = timeslice;
        self
    }

    /// Override how long `stop` waits for the final data
    pub fn with_flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }

    /// Whether a recording is running
    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Time since the running recording started
    pub fn elapsed(&self) -> Option<Duration> {
        self.active.as_ref().map(|a| a.started.elapsed())
    }

    /// Profile of the running recording
    pub fn profile(&self) -> Option<&RecorderProfile> {
        self.active.as_ref().map(|a| &a.profile)
    }

    /// Start recording `stream`
    ///
    /// `video_size` is the decoded video size; zero dimensions are treated as 1080p.
    pub fn start(
        &mut self,
        stream: Option<&MediaStream>,
        video_size: (u32, u32),
        tier: QualityTier,
    ) -> MediaResult<RecorderProfile> {
        if self.active.is_some() {
            return Err(MediaError::AlreadyRecording);
        }
        let stream = stream.ok_or(MediaError::NoActiveStream)?;
        if !stream.has_video() {
            return Err(MediaError::NoVideoTrack);
        }

        let plan = bitrate_plan(video_size.0, video_size.1, tier);
        let factory = self.factory.clone();
        let profile = RecorderProfile::negotiate(plan, |mime| factory.is_type_supported(mime));

        let (mut recorder, events) = self.factory.create(stream, &profile)?;
        recorder.start(self.timeslice)?;
        info!(
            "Recording started ({}, {}x{}, {})",
            profile.container_mime(),
            video_size.0,
            video_size.1,
            tier
        );

        self.active = Some(ActiveRecording {
            recorder,
            events,
            profile: profile.clone(),
            chunks: Vec::new(),
            started: Instant::now(),
            flushed: false,
        });
        Ok(profile)
    }

    /// Buffer any data the recorder has emitted so far
    ///
    /// A recorder error ends the recording and is returned.
    pub fn poll(&mut self) -> MediaResult<()> {
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };
        while let Ok(event) = active.events.try_recv() {
            match event {
                RecorderEvent::Data(data) => active.push(data),
                RecorderEvent::Stopped => active.flushed = true,
                RecorderEvent::Error(reason) => {
                    error!("Recorder error: {}", reason);
                    if let Err(e) = active.recorder.stop() {
                        warn!("Failed to stop recorder after error: {}", e);
                    }
                    self.active = None;
                    return Err(MediaError::RecorderFailed { reason });
                }
            }
        }
        Ok(())
    }

    /// Stop the running recording and assemble the file
    ///
    /// Returns `Ok(None)` when nothing is recording. A recording that captured
    /// no data is reported as [`MediaError::EmptyRecording`].
    pub async fn stop(&mut self) -> MediaResult<Option<RecordingFile>> {
        let Some(mut active) = self.active.take() else {
            return Ok(None);
        };

        if active.recorder.state() == RecorderState::Recording {
            if let Err(e) = active.recorder.stop() {
                warn!("Recorder did not stop cleanly: {}", e);
            }
        }

        if !active.flushed {
            let flush = async {
                while let Some(event) = active.events.recv().await {
                    match event {
                        RecorderEvent::Data(data) => active.push(data),
                        RecorderEvent::Stopped => return Ok(()),
                        RecorderEvent::Error(reason) => return Err(MediaError::RecorderFailed { reason }),
                    }
                }
                Ok(())
            };
            match tokio::time::timeout(self.flush_timeout, flush).await {
                Ok(result) => result?,
                Err(_) => warn!("Recorder did not flush within {:?}", self.flush_timeout),
            }
        }

        let duration = active.started.elapsed();
        let chunks = active.chunks;
        info!("Recording stopped with {} chunks", chunks.len());
        if chunks.is_empty() {
            warn!("Recording captured no data");
            return Err(MediaError::EmptyRecording { chunks: 0 });
        }

        let total: usize = chunks.iter().map(Bytes::len).sum();
        if total == 0 {
            return Err(MediaError::EmptyRecording {
                chunks: chunks.len(),
            });
        }
        let mut data = BytesMut::with_capacity(total);
        for chunk in &chunks {
            data.extend_from_slice(chunk);
        }

        let file_name = format!(
            "recording_{}.{}",
            file_timestamp(Utc::now()),
            active.profile.file_extension()
        );
        info!("Recording saved as {} ({} bytes)", file_name, total);
        Ok(Some(RecordingFile {
            file_name,
            mime_type: active.profile.container_mime().to_string(),
            data: data.freeze(),
            duration,
        }))
    }
}
