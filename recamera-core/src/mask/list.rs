//! Privacy-mask list and the geometry operations that mutate it

use std::collections::HashSet;

use crate::geometry::{ceil3, round3, PixelRect, Point, RelativeRect, Size};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maximum number of privacy masks the device accepts
pub const MAX_MASKS: usize = 6;

/// Smallest committed mask, as a fraction of either container dimension
pub const MIN_DRAW_FRACTION: f64 = 0.01;

/// Minimum mask side while resizing, as a fraction of the shorter container side
pub const MIN_RESIZE_FRACTION: f64 = 0.01;

/// Pixel distance from a corner that still grabs the corner handle
pub const CORNER_HANDLE_TOLERANCE: f64 = 12.0;

/// Pixel distance from an edge that still grabs the edge handle
pub const EDGE_HANDLE_TOLERANCE: f64 = 8.0;

/// Stable mask identifier
pub type MaskId = u32;

/// One rectangular privacy-mask region in relative coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    /// Identifier, unique within the list
    pub id: MaskId,
    /// Left edge as a fraction of container width
    #[serde(rename = "iPositionX")]
    pub position_x: f64,
    /// Top edge as a fraction of container height
    #[serde(rename = "iPositionY")]
    pub position_y: f64,
    /// Width as a fraction of container width
    #[serde(rename = "iMaskWidth")]
    pub width: f64,
    /// Height as a fraction of container height
    #[serde(rename = "iMaskHeight")]
    pub height: f64,
}

impl Mask {
    /// Relative rectangle covered by this mask
    pub fn rect(&self) -> RelativeRect {
        RelativeRect::new(self.position_x, self.position_y, self.width, self.height)
    }

    /// Pixel rectangle covered by this mask in the given container
    pub fn to_pixels(&self, container: Size) -> PixelRect {
        self.rect().to_pixels(container)
    }

    /// Resize handle under `point`, corners first
    pub fn handle_at(&self, point: Point, container: Size) -> Option<ResizeHandle> {
        let r = self.to_pixels(container);
        let near = |a: f64, b: f64, tol: f64| (a - b).abs() <= tol;
        let corner = CORNER_HANDLE_TOLERANCE;
        let edge = EDGE_HANDLE_TOLERANCE;

        if near(point.x, r.x, corner) && near(point.y, r.y, corner) {
            return Some(ResizeHandle::NorthWest);
        }
        if near(point.x, r.right(), corner) && near(point.y, r.y, corner) {
            return Some(ResizeHandle::NorthEast);
        }
        if near(point.x, r.x, corner) && near(point.y, r.bottom(), corner) {
            return Some(ResizeHandle::SouthWest);
        }
        if near(point.x, r.right(), corner) && near(point.y, r.bottom(), corner) {
            return Some(ResizeHandle::SouthEast);
        }

        let within_y = point.y > r.y + corner && point.y < r.bottom() - corner;
        let within_x = point.x > r.x + corner && point.x < r.right() - corner;
        if near(point.x, r.x, edge) && within_y {
            return Some(ResizeHandle::West);
        }
        if near(point.x, r.right(), edge) && within_y {
            return Some(ResizeHandle::East);
        }
        if near(point.y, r.y, edge) && within_x {
            return Some(ResizeHandle::North);
        }
        if near(point.y, r.bottom(), edge) && within_x {
            return Some(ResizeHandle::South);
        }
        None
    }
}

/// The eight resize handles drawn around a selected mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeHandle {
    /// Top-left corner
    NorthWest,
    /// Top-right corner
    NorthEast,
    /// Bottom-left corner
    SouthWest,
    /// Bottom-right corner
    SouthEast,
    /// Top edge
    North,
    /// Bottom edge
    South,
    /// Right edge
    East,
    /// Left edge
    West,
}

impl ResizeHandle {
    /// All handles in drawing order
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::NorthWest,
        ResizeHandle::NorthEast,
        ResizeHandle::SouthWest,
        ResizeHandle::SouthEast,
        ResizeHandle::North,
        ResizeHandle::South,
        ResizeHandle::West,
        ResizeHandle::East,
    ];

    /// Short compass identifier (`nw`, `e`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            ResizeHandle::NorthWest => "nw",
            ResizeHandle::NorthEast => "ne",
            ResizeHandle::SouthWest => "sw",
            ResizeHandle::SouthEast => "se",
            ResizeHandle::North => "n",
            ResizeHandle::South => "s",
            ResizeHandle::East => "e",
            ResizeHandle::West => "w",
        }
    }

    /// Whether dragging this handle moves the top edge
    pub fn moves_top(&self) -> bool {
        matches!(
            self,
            ResizeHandle::North | ResizeHandle::NorthWest | ResizeHandle::NorthEast
        )
    }

    /// Whether dragging this handle moves the bottom edge
    pub fn moves_bottom(&self) -> bool {
        matches!(
            self,
            ResizeHandle::South | ResizeHandle::SouthWest | ResizeHandle::SouthEast
        )
    }

    /// Whether dragging this handle moves the left edge
    pub fn moves_left(&self) -> bool {
        matches!(
            self,
            ResizeHandle::West | ResizeHandle::NorthWest | ResizeHandle::SouthWest
        )
    }

    /// Whether dragging this handle moves the right edge
    pub fn moves_right(&self) -> bool {
        matches!(
            self,
            ResizeHandle::East | ResizeHandle::NorthEast | ResizeHandle::SouthEast
        )
    }

    /// Pixel position of this handle on a rectangle
    pub fn anchor(&self, rect: PixelRect) -> Point {
        let cx = rect.x + rect.width / 2.0;
        let cy = rect.y + rect.height / 2.0;
        match self {
            ResizeHandle::NorthWest => Point::new(rect.x, rect.y),
            ResizeHandle::NorthEast => Point::new(rect.right(), rect.y),
            ResizeHandle::SouthWest => Point::new(rect.x, rect.bottom()),
            ResizeHandle::SouthEast => Point::new(rect.right(), rect.bottom()),
            ResizeHandle::North => Point::new(cx, rect.y),
            ResizeHandle::South => Point::new(cx, rect.bottom()),
            ResizeHandle::West => Point::new(rect.x, cy),
            ResizeHandle::East => Point::new(rect.right(), cy),
        }
    }
}

/// In-progress rectangle anchored at the pointer-down position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawGesture {
    start: Point,
    current: Point,
}

impl DrawGesture {
    /// Start drawing at `point`
    pub fn begin(point: Point) -> Self {
        Self {
            start: point,
            current: point,
        }
    }

    /// Move the free corner to `point`
    pub fn update(&mut self, point: Point) {
        self.current = point;
    }

    /// Anchor point
    pub fn start(&self) -> Point {
        self.start
    }

    /// Raw rectangle from the anchor to the pointer; width/height may be negative
    pub fn rect(&self) -> PixelRect {
        PixelRect::from_corners(self.start, self.current)
    }
}

/// Persisted privacy-mask configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MaskListWire", into = "MaskListWire")]
pub struct MaskList {
    enabled: bool,
    masks: Vec<Mask>,
    next_id: MaskId,
}

#[derive(Serialize, Deserialize)]
struct MaskListWire {
    #[serde(rename = "iEnabled", with = "crate::wire::int_flag", default)]
    enabled: bool,
    #[serde(rename = "privacyMask", default)]
    privacy_mask: Vec<Mask>,
}

impl From<MaskListWire> for MaskList {
    fn from(wire: MaskListWire) -> Self {
        MaskList::from_masks(wire.enabled, wire.privacy_mask)
    }
}

impl From<MaskList> for MaskListWire {
    fn from(list: MaskList) -> Self {
        MaskListWire {
            enabled: list.enabled,
            privacy_mask: list.masks,
        }
    }
}

impl Default for MaskList {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskList {
    /// Empty, disabled mask list
    pub fn new() -> Self {
        Self {
            enabled: false,
            masks: Vec::new(),
            next_id: 0,
        }
    }

    /// Rehydrate a stored list; new ids continue above the highest stored id.
    /// Entries beyond [`MAX_MASKS`] are dropped and repeated ids are replaced
    /// with fresh ones, keeping the first occurrence.
    pub fn from_masks(enabled: bool, mut masks: Vec<Mask>) -> Self {
        if masks.len() > MAX_MASKS {
            debug!("Dropping {} stored masks over the limit", masks.len() - MAX_MASKS);
            masks.truncate(MAX_MASKS);
        }
        let mut next_id = masks.iter().map(|m| m.id + 1).max().unwrap_or(0);
        let mut seen = HashSet::with_capacity(masks.len());
        for mask in &mut masks {
            if !seen.insert(mask.id) {
                debug!("Stored mask id {} repeats, reassigned to {}", mask.id, next_id);
                mask.id = next_id;
                next_id += 1;
            }
        }
        Self {
            enabled,
            masks,
            next_id,
        }
    }

    /// Whether masking is applied by the device
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggle device-side masking
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Masks in stacking order, topmost last
    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    /// Number of masks
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    /// Whether the list has no masks
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Whether another mask can be added
    pub fn is_full(&self) -> bool {
        self.masks.len() >= MAX_MASKS
    }

    /// Look up a mask by id
    pub fn get(&self, id: MaskId) -> Option<&Mask> {
        self.masks.iter().find(|m| m.id == id)
    }

    /// Topmost mask containing `point`
    pub fn hit_test(&self, point: Point, container: Size) -> Option<MaskId> {
        self.masks
            .iter()
            .rev()
            .find(|m| m.to_pixels(container).contains(point))
            .map(|m| m.id)
    }

    /// Resize handle of mask `id` under `point`
    pub fn resize_handle_at(&self, point: Point, id: MaskId, container: Size) -> Option<ResizeHandle> {
        self.get(id)?.handle_at(point, container)
    }

    /// Append a relative rectangle as a new mask.
    ///
    /// Returns `None` without touching the list when the rectangle is smaller
    /// than [`MIN_DRAW_FRACTION`] in either dimension or the list is full.
    pub fn add(&mut self, rect: RelativeRect) -> Option<Mask> {
        if self.is_full() {
            debug!("Mask limit of {} reached, ignoring new mask", MAX_MASKS);
            return None;
        }
        if rect.width < MIN_DRAW_FRACTION || rect.height < MIN_DRAW_FRACTION {
            debug!(
                "Rejecting mask {:.3}x{:.3}, below minimum size",
                rect.width, rect.height
            );
            return None;
        }
        let mask = Mask {
            id: self.next_id,
            position_x: round3(rect.x),
            position_y: round3(rect.y),
            width: round3(rect.width),
            height: round3(rect.height),
        };
        self.next_id += 1;
        self.masks.push(mask);
        Some(mask)
    }

    /// Commit a finished draw gesture
    pub fn commit_draw(&mut self, gesture: &DrawGesture, container: Size) -> Option<Mask> {
        if container.is_empty() {
            return None;
        }
        self.add(RelativeRect::from_pixels(gesture.rect(), container))
    }

    /// Move mask `id` so that its top-left sits at `pointer - grab_offset`,
    /// clamped to the container.
    pub fn drag(&mut self, id: MaskId, pointer: Point, grab_offset: Point, container: Size) -> bool {
        if container.is_empty() {
            return false;
        }
        let Some(mask) = self.masks.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        let max_x = round3(1.0 - mask.width).max(0.0);
        let max_y = round3(1.0 - mask.height).max(0.0);
        let x = round3((pointer.x - grab_offset.x) / container.width);
        let y = round3((pointer.y - grab_offset.y) / container.height);
        mask.position_x = x.clamp(0.0, max_x);
        mask.position_y = y.clamp(0.0, max_y);
        true
    }

    /// Move the edges named by `handle` by a pixel delta.
    ///
    /// The opposite edge stays pinned when the result would fall below the
    /// minimum size, and every edge stays inside the container.
    pub fn resize(
        &mut self,
        id: MaskId,
        handle: ResizeHandle,
        dx: f64,
        dy: f64,
        container: Size,
    ) -> bool {
        if container.is_empty() {
            return false;
        }
        let Some(mask) = self.masks.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        let min_px = container.shorter_side() * MIN_RESIZE_FRACTION;
        let min_w = ceil3(min_px / container.width);
        let min_h = ceil3(min_px / container.height);

        let (left, right) = resize_span(
            mask.position_x,
            mask.position_x + mask.width,
            dx / container.width,
            min_w,
            handle.moves_left(),
            handle.moves_right(),
        );
        let (top, bottom) = resize_span(
            mask.position_y,
            mask.position_y + mask.height,
            dy / container.height,
            min_h,
            handle.moves_top(),
            handle.moves_bottom(),
        );

        let (x, width) = settle_span(left, right, min_w);
        let (y, height) = settle_span(top, bottom, min_h);
        mask.position_x = x;
        mask.width = width;
        mask.position_y = y;
        mask.height = height;
        true
    }

    /// Remove mask `id`
    pub fn remove(&mut self, id: MaskId) -> Option<Mask> {
        let index = self.masks.iter().position(|m| m.id == id)?;
        Some(self.masks.remove(index))
    }
}

fn resize_span(
    start: f64,
    end: f64,
    delta: f64,
    min: f64,
    moves_start: bool,
    moves_end: bool,
) -> (f64, f64) {
    if moves_start {
        let end = end.clamp(min, 1.0);
        let start = (start + delta).max(0.0).min(end - min);
        (start, end)
    } else if moves_end {
        let start = start.clamp(0.0, 1.0 - min);
        let end = (end + delta).min(1.0).max(start + min);
        (start, end)
    } else {
        (start, end)
    }
}

/// Round edges to storage precision, keeping the span at least `min` and inside [0, 1]
fn settle_span(start: f64, end: f64, min: f64) -> (f64, f64) {
    let start = round3(start);
    let end = round3(end);
    let length = round3(end - start).max(min);
    let start = start.min(round3(1.0 - length)).max(0.0);
    (start, length)
}
