//! Privacy mask geometry, interactive editing and rendering
//!
//! Masks are stored as rectangles relative to the video container so they
//! keep their meaning when the stream resolution changes. [`MaskEditor`]
//! turns pointer and keyboard input into new [`MaskList`] values and
//! [`MaskRenderer`] paints the result onto a [`Canvas2d`].

pub mod editor;
pub mod list;
pub mod render;

pub use editor::{Cursor, EditorKey, InteractionMode, MaskEditor};
pub use list::{
    DrawGesture, Mask, MaskId, MaskList, ResizeHandle, CORNER_HANDLE_TOLERANCE,
    EDGE_HANDLE_TOLERANCE, MAX_MASKS, MIN_DRAW_FRACTION, MIN_RESIZE_FRACTION,
};
pub use render::{Canvas2d, MaskRenderer, MaskScene};
