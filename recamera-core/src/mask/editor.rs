//! Pointer and keyboard interaction over the mask canvas
//!
//! The editor never mutates the caller's [`MaskList`]. Every handler takes the
//! current snapshot and returns `Some(updated)` when the list should change;
//! the owner stores the new snapshot and passes it back on the next event.

use super::list::{DrawGesture, MaskId, MaskList, ResizeHandle};
use super::render::MaskScene;
use crate::geometry::{Point, Size};
use tracing::debug;

/// Active pointer gesture; at most one at a time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionMode {
    /// No button held
    Idle,
    /// Drawing a new mask
    Drawing(DrawGesture),
    /// Moving a mask; the offset is pointer minus mask top-left at grab time
    Dragging {
        /// Mask being moved
        mask_id: MaskId,
        /// Pixel offset captured on pointer-down
        grab_offset: Point,
    },
    /// Resizing a mask by one handle
    Resizing {
        /// Mask being resized
        mask_id: MaskId,
        /// Handle being dragged
        handle: ResizeHandle,
        /// Pointer position of the previous move
        last: Point,
    },
}

/// Cursor the canvas should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// Plain arrow
    Default,
    /// Draw mode is armed
    Crosshair,
    /// Over a mask that can be dragged
    Move,
    /// Over a resize handle
    Resize(ResizeHandle),
}

impl Cursor {
    /// CSS cursor name
    pub fn css_name(&self) -> &'static str {
        match self {
            Cursor::Default => "default",
            Cursor::Crosshair => "crosshair",
            Cursor::Move => "move",
            Cursor::Resize(ResizeHandle::NorthWest) => "nw-resize",
            Cursor::Resize(ResizeHandle::NorthEast) => "ne-resize",
            Cursor::Resize(ResizeHandle::SouthWest) => "sw-resize",
            Cursor::Resize(ResizeHandle::SouthEast) => "se-resize",
            Cursor::Resize(ResizeHandle::North) => "n-resize",
            Cursor::Resize(ResizeHandle::South) => "s-resize",
            Cursor::Resize(ResizeHandle::East) => "e-resize",
            Cursor::Resize(ResizeHandle::West) => "w-resize",
        }
    }
}

/// Keys the editor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    /// Delete the selected mask
    Delete,
    /// Delete the selected mask
    Backspace,
    /// Clear the selection
    Escape,
    /// Anything else
    Other,
}

/// Interaction state for the privacy-mask canvas
#[derive(Debug, Clone)]
pub struct MaskEditor {
    container: Size,
    draw_mode: bool,
    mode: InteractionMode,
    selected: Option<MaskId>,
    hovered: Option<MaskId>,
    cursor: Cursor,
}

impl MaskEditor {
    /// Editor for a canvas of the given pixel size
    pub fn new(container: Size) -> Self {
        Self {
            container,
            draw_mode: false,
            mode: InteractionMode::Idle,
            selected: None,
            hovered: None,
            cursor: Cursor::Default,
        }
    }

    /// Track a new canvas size
    pub fn set_container(&mut self, container: Size) {
        self.container = container;
    }

    /// Current canvas size
    pub fn container(&self) -> Size {
        self.container
    }

    /// Arm or disarm draw mode; disarming discards an unfinished rectangle
    pub fn set_draw_mode(&mut self, armed: bool) {
        self.draw_mode = armed;
        if armed {
            self.hovered = None;
            self.cursor = Cursor::Crosshair;
        } else {
            if matches!(self.mode, InteractionMode::Drawing(_)) {
                self.mode = InteractionMode::Idle;
            }
            self.cursor = Cursor::Default;
        }
    }

    /// Whether draw mode is armed
    pub fn draw_mode(&self) -> bool {
        self.draw_mode
    }

    /// Active gesture
    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// Selected mask, if any
    pub fn selected(&self) -> Option<MaskId> {
        self.selected
    }

    /// Mask under the pointer, if any
    pub fn hovered(&self) -> Option<MaskId> {
        self.hovered
    }

    /// Cursor computed by the last pointer event
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Select a mask explicitly (e.g. from a list next to the canvas)
    pub fn select(&mut self, id: Option<MaskId>) {
        self.selected = id;
    }

    /// Pointer pressed on the canvas
    pub fn pointer_down(&mut self, masks: &MaskList, point: Point) {
        if self.mode != InteractionMode::Idle {
            return;
        }

        if self.draw_mode {
            if masks.is_full() {
                debug!("Draw ignored, mask limit reached");
                return;
            }
            if masks.hit_test(point, self.container).is_none() {
                self.mode = InteractionMode::Drawing(DrawGesture::begin(point));
            }
            return;
        }

        if let Some(selected) = self.selected {
            if let Some(handle) = masks.resize_handle_at(point, selected, self.container) {
                self.mode = InteractionMode::Resizing {
                    mask_id: selected,
                    handle,
                    last: point,
                };
                return;
            }
        }

        match masks.hit_test(point, self.container) {
            Some(id) => {
                let origin = masks
                    .get(id)
                    .map(|m| m.to_pixels(self.container))
                    .map(|r| Point::new(r.x, r.y))
                    .unwrap_or_default();
                self.selected = Some(id);
                self.mode = InteractionMode::Dragging {
                    mask_id: id,
                    grab_offset: point.offset_from(origin),
                };
            }
            None => self.selected = None,
        }
    }

    /// Pointer moved over the canvas
    pub fn pointer_move(&mut self, masks: &MaskList, point: Point) -> Option<MaskList> {
        match self.mode {
            InteractionMode::Drawing(mut gesture) => {
                gesture.update(point);
                self.mode = InteractionMode::Drawing(gesture);
                None
            }
            InteractionMode::Dragging {
                mask_id,
                grab_offset,
            } => {
                let mut next = masks.clone();
                next.drag(mask_id, point, grab_offset, self.container)
                    .then_some(next)
            }
            InteractionMode::Resizing {
                mask_id,
                handle,
                last,
            } => {
                let delta = point.offset_from(last);
                self.mode = InteractionMode::Resizing {
                    mask_id,
                    handle,
                    last: point,
                };
                let mut next = masks.clone();
                next.resize(mask_id, handle, delta.x, delta.y, self.container)
                    .then_some(next)
            }
            InteractionMode::Idle => {
                self.update_hover(masks, point);
                None
            }
        }
    }

    /// Pointer released; commits a drawn rectangle
    pub fn pointer_up(&mut self, masks: &MaskList) -> Option<MaskList> {
        let mode = std::mem::replace(&mut self.mode, InteractionMode::Idle);
        match mode {
            InteractionMode::Drawing(gesture) => {
                let mut next = masks.clone();
                let mask = next.commit_draw(&gesture, self.container)?;
                debug!("Committed mask {} at {:?}", mask.id, mask.rect());
                Some(next)
            }
            _ => None,
        }
    }

    /// Pointer left the canvas; an unfinished rectangle is discarded
    pub fn pointer_leave(&mut self) {
        if matches!(self.mode, InteractionMode::Drawing(_)) {
            self.mode = InteractionMode::Idle;
        }
        self.hovered = None;
    }

    /// Keyboard shortcut handling
    pub fn key_down(&mut self, masks: &MaskList, key: EditorKey) -> Option<MaskList> {
        match key {
            EditorKey::Delete | EditorKey::Backspace => self.delete_selected(masks),
            EditorKey::Escape => {
                self.selected = None;
                None
            }
            EditorKey::Other => None,
        }
    }

    /// Remove the selected mask
    pub fn delete_selected(&mut self, masks: &MaskList) -> Option<MaskList> {
        let id = self.selected.take()?;
        self.remove(masks, id)
    }

    /// Remove a mask by id, e.g. from a delete button
    pub fn remove(&mut self, masks: &MaskList, id: MaskId) -> Option<MaskList> {
        let mut next = masks.clone();
        next.remove(id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        if matches!(self.mode, InteractionMode::Dragging { mask_id, .. } | InteractionMode::Resizing { mask_id, .. } if mask_id == id)
        {
            self.mode = InteractionMode::Idle;
        }
        Some(next)
    }

    /// Renderable snapshot of the editor over `masks`
    pub fn scene<'a>(&self, masks: &'a MaskList) -> MaskScene<'a> {
        MaskScene {
            masks,
            container: self.container,
            selected: self.selected.filter(|id| masks.get(*id).is_some()),
            hovered: if self.draw_mode { None } else { self.hovered },
            drawing: match self.mode {
                InteractionMode::Drawing(gesture) => Some(gesture.rect()),
                _ => None,
            },
            draw_mode: self.draw_mode,
        }
    }

    fn update_hover(&mut self, masks: &MaskList, point: Point) {
        if self.draw_mode {
            self.cursor = Cursor::Crosshair;
            return;
        }
        self.hovered = masks.hit_test(point, self.container);

        let handle = self
            .selected
            .and_then(|id| masks.resize_handle_at(point, id, self.container));
        self.cursor = match (handle, self.hovered) {
            (Some(handle), _) => Cursor::Resize(handle),
            (None, Some(_)) => Cursor::Move,
            (None, None) => Cursor::Default,
        };
    }
}
