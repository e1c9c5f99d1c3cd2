//! Positioned OSD texts and their drag/edit interaction

use chrono::NaiveDateTime;
use tracing::debug;

use super::format::{format_date_time, resolve_font_size};
use super::settings::{OsdItemKind, OsdSettings};
use crate::geometry::{Point, Size};

/// Client-space bounds of the video container
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContainerRect {
    /// Left edge in client coordinates
    pub left: f64,
    /// Top edge in client coordinates
    pub top: f64,
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl ContainerRect {
    /// Create a new container rectangle
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Pixel size of the container
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// An in-progress drag of one overlay
///
/// Pointer moves are only tracked while one of these exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OsdDrag {
    /// Overlay being moved
    pub kind: OsdItemKind,
    /// Pointer position relative to the element's top-left at grab time
    pub offset: Point,
}

/// One overlay ready to be placed over the video
#[derive(Debug, Clone, PartialEq)]
pub struct OsdElement {
    /// Which overlay this is
    pub kind: OsdItemKind,
    /// Text to display
    pub text: String,
    /// Left edge in container pixels
    pub left: f64,
    /// Top edge in container pixels
    pub top: f64,
    /// Resolved font size in pixels
    pub font_size: f64,
    /// CSS text colour
    pub color: String,
    /// CSS text shadow
    pub text_shadow: &'static str,
    /// Whether the element can be grabbed
    pub movable: bool,
    /// Whether the element is being dragged
    pub dragging: bool,
    /// Whether the element shows an inline text input
    pub editing: bool,
}

/// Interaction state for the OSD overlays
///
/// Settings are owned by the caller. Methods that change them return a new
/// [`OsdSettings`] instead of mutating in place.
#[derive(Debug, Clone)]
pub struct OsdOverlay {
    edit_mode: bool,
    container: Size,
    drag: Option<OsdDrag>,
    editing: Option<OsdItemKind>,
    serial_number: String,
}

impl OsdOverlay {
    /// Create an overlay for a device with the given serial number
    pub fn new(serial_number: impl Into<String>) -> Self {
        Self {
            edit_mode: false,
            container: Size::default(),
            drag: None,
            editing: None,
            serial_number: serial_number.into(),
        }
    }

    /// Enter or leave edit mode; leaving ends any drag or text edit
    pub fn set_edit_mode(&mut self, edit_mode: bool) {
        self.edit_mode = edit_mode;
        if !edit_mode {
            self.drag = None;
            self.editing = None;
        }
    }

    /// Whether overlays can currently be moved
    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    /// Update the cached container size; returns whether it changed
    pub fn apply_resize(&mut self, size: Size) -> bool {
        let size = Size::new(size.width.round(), size.height.round());
        if size == self.container {
            return false;
        }
        debug!("OSD container resized to {}x{}", size.width, size.height);
        self.container = size;
        true
    }

    /// Cached container size
    pub fn container(&self) -> Size {
        self.container
    }

    /// Active drag, if any
    pub fn drag(&self) -> Option<OsdDrag> {
        self.drag
    }

    /// Overlay whose text is being edited, if any
    pub fn editing(&self) -> Option<OsdItemKind> {
        self.editing
    }

    /// Grab an overlay; `element_origin` is the element's top-left in client space
    pub fn pointer_down(&mut self, kind: OsdItemKind, client: Point, element_origin: Point) -> bool {
        if !self.edit_mode {
            return false;
        }
        self.drag = Some(OsdDrag {
            kind,
            offset: client.offset_from(element_origin),
        });
        true
    }

    /// Follow the pointer during a drag
    pub fn pointer_move(&self, settings: &OsdSettings, client: Point, container: ContainerRect) -> Option<OsdSettings> {
        let drag = self.drag?;
        if container.width <= 0.0 || container.height <= 0.0 {
            return None;
        }
        let x = (client.x - container.left - drag.offset.x) / container.width;
        let y = (client.y - container.top - drag.offset.y) / container.height;
        let position = settings.position(drag.kind).moved_to(x, y);
        Some(settings.with_position(drag.kind, position))
    }

    /// Release the pointer, ending any drag
    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    /// Start editing an overlay's text in place; only the channel name allows it
    pub fn double_click(&mut self, kind: OsdItemKind) -> bool {
        if !self.edit_mode || !kind.is_text_editable() {
            return false;
        }
        self.editing = Some(kind);
        true
    }

    /// Replace the text of the overlay being edited
    pub fn edit_text(&self, settings: &OsdSettings, text: &str) -> Option<OsdSettings> {
        match self.editing {
            Some(OsdItemKind::ChannelName) => Some(settings.with_channel_name(text)),
            _ => None,
        }
    }

    /// Finish inline editing
    pub fn end_edit(&mut self) {
        self.editing = None;
    }

    /// Elements to display for the given settings and clock value
    ///
    /// Nothing is laid out until the container has a measured width.
    pub fn layout(&self, settings: &OsdSettings, now: &NaiveDateTime) -> Vec<OsdElement> {
        if self.container.width <= 0.0 {
            return Vec::new();
        }
        let font_size = resolve_font_size(settings.attribute.font_size, self.container.width);
        let color = settings.attribute.css_color();
        let text_shadow = settings.attribute.text_shadow();

        OsdItemKind::ALL
            .iter()
            .filter_map(|&kind| {
                let position = settings.position(kind);
                if !position.enabled {
                    return None;
                }
                let text = match kind {
                    OsdItemKind::ChannelName => settings.channel_name.name.clone(),
                    OsdItemKind::DateTime => {
                        let dt = &settings.date_time;
                        format_date_time(now, dt.date_style, dt.time_style, dt.show_weekday)
                    }
                    OsdItemKind::SerialNumber => format!("SN: {}", self.serial_number),
                };
                Some(OsdElement {
                    kind,
                    text,
                    left: position.x * self.container.width,
                    top: position.y * self.container.height,
                    font_size,
                    color: color.clone(),
                    text_shadow,
                    movable: self.edit_mode,
                    dragging: self.drag.map(|d| d.kind) == Some(kind),
                    editing: self.editing == Some(kind),
                })
            })
            .collect()
    }
}
