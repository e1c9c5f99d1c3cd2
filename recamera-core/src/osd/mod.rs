//! On-screen display overlays
//!
//! Up to three texts (channel name, date/time, serial number) are positioned
//! over the video in relative coordinates. [`OsdOverlay`] handles dragging and
//! inline editing, [`OsdClock`] refreshes the date/time text.

pub mod clock;
pub mod format;
pub mod overlay;
pub mod settings;

pub use clock::OsdClock;
pub use format::{format_date, format_date_time, format_time, resolve_font_size, DateStyle, TimeStyle};
pub use overlay::{ContainerRect, OsdDrag, OsdElement, OsdOverlay};
pub use settings::{
    ChannelNameOverlay, DateTimeOverlay, FontColorMode, OsdAttribute, OsdItemKind, OsdSettings,
    OverlayPosition, SerialNumberOverlay, AUTO_FONT_SIZE,
};
