//! # reCamera Core
//!
//! Shared building blocks for the reCamera live-view console: the error
//! taxonomy, relative geometry, the privacy-mask engine and renderer, the
//! OSD overlay engine, the live view that keeps both on the container size,
//! and client-side validation of network settings.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod frame;
pub mod geometry;
pub mod mask;
pub mod osd;
pub mod validation;
pub mod view;
pub mod wire;

// Re-export main types
pub use error::ConsoleError;
pub use frame::{AnimationLoop, ResizeWatcher};
pub use geometry::{ceil3, round3, PixelRect, Point, RelativeRect, Size};
pub use mask::{
    Canvas2d, Cursor, DrawGesture, EditorKey, InteractionMode, Mask, MaskEditor, MaskId, MaskList,
    MaskRenderer, MaskScene, ResizeHandle, MAX_MASKS,
};
pub use osd::{
    ContainerRect, DateStyle, OsdAttribute, OsdClock, OsdElement, OsdItemKind, OsdOverlay,
    OsdSettings, OverlayPosition, TimeStyle,
};
pub use validation::{validate_ipv4, validate_netmask, validate_port, AddressMethod, StaticIpConfig};
pub use view::LiveView;

/// Result type for console operations
pub type Result<T> = std::result::Result<T, ConsoleError>;
