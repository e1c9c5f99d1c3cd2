//! Still-image capture of the current video frame

use std::io::Cursor;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::{ImageFormat, RgbaImage};
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};
use crate::recording::file_timestamp;
use crate::tracks::VideoFrame;

/// Source of decoded video frames, typically the video element
pub trait VideoSource: Send + Sync {
    /// Native size of the decoded video, if known
    fn video_size(&self) -> Option<(u32, u32)>;

    /// Most recent decoded frame
    fn current_frame(&self) -> Option<VideoFrame>;
}

/// An encoded still image
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Suggested file name
    pub file_name: String,
    /// PNG data
    pub data: Bytes,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Encode a frame as PNG
pub fn encode_png(frame: &VideoFrame) -> MediaResult<Bytes> {
    if frame.width == 0 || frame.height == 0 {
        return Err(MediaError::FrameUnavailable {
            reason: "frame has no pixels".to_string(),
        });
    }
    if frame.data.len() != frame.expected_len() {
        return Err(MediaError::Encoding {
            format: "png".to_string(),
            reason: format!(
                "expected {} bytes for {}x{}, got {}",
                frame.expected_len(),
                frame.width,
                frame.height,
                frame.data.len()
            ),
        });
    }

    let image = RgbaImage::from_raw(frame.width, frame.height, frame.data.clone()).ok_or_else(|| {
        MediaError::Encoding {
            format: "png".to_string(),
            reason: "frame buffer does not match its dimensions".to_string(),
        }
    })?;

    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| MediaError::Encoding {
            format: "png".to_string(),
            reason: e.to_string(),
        })?;
    Ok(Bytes::from(out.into_inner()))
}

/// Capture the current frame of `source` at its native size
pub fn capture_snapshot(source: &dyn VideoSource, connected: bool, at: DateTime<Utc>) -> MediaResult<Snapshot> {
    if !connected {
        return Err(MediaError::FrameUnavailable {
            reason: "video is not connected".to_string(),
        });
    }
    let frame = source.current_frame().ok_or_else(|| MediaError::FrameUnavailable {
        reason: "no decoded frame yet".to_string(),
    })?;
    if let Some((width, height)) = source.video_size() {
        if (width, height) != (frame.width, frame.height) {
            debug!(
                "Frame is {}x{} while video reports {}x{}",
                frame.width, frame.height, width, height
            );
        }
    }

    let data = encode_png(&frame)?;
    let file_name = format!("snapshot_{}.png", file_timestamp(at));
    info!("Captured snapshot {} ({}x{})", file_name, frame.width, frame.height);
    Ok(Snapshot {
        file_name,
        data,
        width: frame.width,
        height: frame.height,
    })
}
