//! Canvas rendering of privacy masks and editing affordances

use super::list::{MaskId, MaskList, ResizeHandle, MAX_MASKS};
use crate::geometry::{PixelRect, Point, Size};

/// Drawing surface the renderer paints on, modelled on a 2D canvas context
pub trait Canvas2d {
    /// Clear a rectangle to transparent
    fn clear_rect(&mut self, rect: PixelRect);
    /// Fill a rectangle
    fn fill_rect(&mut self, rect: PixelRect, color: &str);
    /// Stroke a rectangle outline; an empty `dash` draws a solid line
    fn stroke_rect(&mut self, rect: PixelRect, color: &str, line_width: f64, dash: &[f64]);
    /// Stroke an open polyline
    fn stroke_path(&mut self, points: &[Point], color: &str, line_width: f64);
    /// Draw text with its baseline at `at`
    fn fill_text(&mut self, text: &str, at: Point, font: &str, color: &str);
    /// Width in pixels of `text` in `font`
    fn measure_text(&self, text: &str, font: &str) -> f64;
    /// Glow applied to subsequent fills; `None` disables it
    fn set_shadow(&mut self, color: Option<&str>, blur: f64);
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, Copy)]
pub struct MaskScene<'a> {
    /// Current masks
    pub masks: &'a MaskList,
    /// Canvas pixel size
    pub container: Size,
    /// Selected mask
    pub selected: Option<MaskId>,
    /// Hovered mask
    pub hovered: Option<MaskId>,
    /// Rectangle being drawn, in pixels; may have negative extent
    pub drawing: Option<PixelRect>,
    /// Whether draw mode is armed
    pub draw_mode: bool,
}

const SELECTED_COLOR: &str = "#3b82f6";
const HOVER_COLOR: &str = "#f59e0b";
const DEFAULT_COLOR: &str = "#ef4444";
const WHITE: &str = "#ffffff";
const LABEL_FONT: &str = "bold 14px sans-serif";
const READOUT_FONT: &str = "bold 12px sans-serif";
const HANDLE_SIZE: f64 = 8.0;
const PREVIEW_CORNER: f64 = 15.0;
const PREVIEW_DASH: [f64; 2] = [10.0, 6.0];

/// Stateless painter for a [`MaskScene`]
#[derive(Debug, Default, Clone, Copy)]
pub struct MaskRenderer;

impl MaskRenderer {
    /// Clear the canvas and paint the whole scene
    pub fn render<C: Canvas2d + ?Sized>(&self, scene: &MaskScene<'_>, canvas: &mut C) {
        let container = scene.container;
        canvas.clear_rect(PixelRect::new(0.0, 0.0, container.width, container.height));

        for (index, mask) in scene.masks.masks().iter().enumerate() {
            let rect = mask.to_pixels(container);
            let selected = scene.selected == Some(mask.id);
            let hovered = !scene.draw_mode && scene.hovered == Some(mask.id);
            self.paint_mask(canvas, scene.masks.is_enabled(), rect, index, selected, hovered);

            if selected && !scene.draw_mode {
                self.paint_handles(canvas, rect);
                let readout = format!("{:.1}% × {:.1}%", mask.width * 100.0, mask.height * 100.0);
                self.paint_readout(canvas, rect, &readout);
            }
        }

        if let Some(drawing) = scene.drawing {
            if drawing.width != 0.0 && drawing.height != 0.0 {
                self.paint_preview(canvas, drawing.normalized());
            }
        }

        if scene.draw_mode && scene.masks.len() >= MAX_MASKS {
            self.paint_limit_banner(canvas, container);
        }
    }

    fn paint_mask<C: Canvas2d + ?Sized>(
        &self,
        canvas: &mut C,
        masking_enabled: bool,
        rect: PixelRect,
        index: usize,
        selected: bool,
        hovered: bool,
    ) {
        let fill = match (masking_enabled, selected) {
            (true, true) => "rgba(0, 0, 0, 0.8)",
            (true, false) => "rgba(0, 0, 0, 0.7)",
            (false, true) => "rgba(59, 130, 246, 0.1)",
            (false, false) => "rgba(100, 116, 139, 0.05)",
        };
        canvas.fill_rect(rect, fill);

        let (border, width) = if selected {
            (SELECTED_COLOR, 3.0)
        } else if hovered {
            (HOVER_COLOR, 2.0)
        } else {
            (DEFAULT_COLOR, 2.0)
        };
        canvas.stroke_rect(rect, border, width, &[]);

        let label = format!("Mask {}", index + 1);
        let padding = 8.0;
        let label_width = canvas.measure_text(&label, LABEL_FONT);
        canvas.fill_rect(
            PixelRect::new(rect.x + 4.0, rect.y + 4.0, label_width + padding * 2.0, 24.0),
            border,
        );
        canvas.fill_text(
            &label,
            Point::new(rect.x + 4.0 + padding, rect.y + 4.0 + 17.0),
            LABEL_FONT,
            WHITE,
        );
    }

    fn paint_handles<C: Canvas2d + ?Sized>(&self, canvas: &mut C, rect: PixelRect) {
        for handle in ResizeHandle::ALL {
            let at = handle.anchor(rect);
            let square = PixelRect::new(
                at.x - HANDLE_SIZE / 2.0,
                at.y - HANDLE_SIZE / 2.0,
                HANDLE_SIZE,
                HANDLE_SIZE,
            );
            canvas.fill_rect(square, SELECTED_COLOR);
            canvas.stroke_rect(square, WHITE, 2.0, &[]);
        }
    }

    fn paint_readout<C: Canvas2d + ?Sized>(&self, canvas: &mut C, rect: PixelRect, text: &str) {
        let text_width = canvas.measure_text(text, READOUT_FONT);
        let x = rect.x + rect.width / 2.0 - text_width / 2.0 - 6.0;
        let y = rect.bottom() + 8.0;
        canvas.fill_rect(
            PixelRect::new(x, y, text_width + 12.0, 20.0),
            "rgba(59, 130, 246, 0.95)",
        );
        canvas.fill_text(text, Point::new(x + 6.0, y + 14.0), READOUT_FONT, WHITE);
    }

    fn paint_preview<C: Canvas2d + ?Sized>(&self, canvas: &mut C, rect: PixelRect) {
        canvas.set_shadow(Some("rgba(59, 130, 246, 0.5)"), 10.0);
        canvas.fill_rect(rect, "rgba(59, 130, 246, 0.25)");
        canvas.set_shadow(None, 0.0);

        canvas.stroke_rect(rect, WHITE, 4.0, &PREVIEW_DASH);
        canvas.stroke_rect(rect, SELECTED_COLOR, 3.0, &PREVIEW_DASH);

        let (x, y, r, b) = (rect.x, rect.y, rect.right(), rect.bottom());
        let c = PREVIEW_CORNER;
        let corners = [
            [Point::new(x, y + c), Point::new(x, y), Point::new(x + c, y)],
            [Point::new(r - c, y), Point::new(r, y), Point::new(r, y + c)],
            [Point::new(x, b - c), Point::new(x, b), Point::new(x + c, b)],
            [Point::new(r - c, b), Point::new(r, b), Point::new(r, b - c)],
        ];
        for corner in &corners {
            canvas.stroke_path(corner, SELECTED_COLOR, 3.0);
        }

        let text = format!("{} × {} px", rect.width.round(), rect.height.round());
        let text_width = canvas.measure_text(&text, LABEL_FONT);
        let padding = 8.0;
        let text_height = 20.0;
        let label_y = y - text_height - padding;
        canvas.fill_rect(
            PixelRect::new(x, label_y, text_width + padding * 2.0, text_height + padding),
            "rgba(59, 130, 246, 0.95)",
        );
        canvas.fill_text(
            &text,
            Point::new(x + padding, label_y + text_height - 2.0),
            LABEL_FONT,
            WHITE,
        );
    }

    fn paint_limit_banner<C: Canvas2d + ?Sized>(&self, canvas: &mut C, container: Size) {
        let text = format!("Mask limit reached ({}/{})", MAX_MASKS, MAX_MASKS);
        let text_width = canvas.measure_text(&text, LABEL_FONT);
        let width = text_width + 32.0;
        let height = 36.0;
        let x = (container.width - width) / 2.0;
        let y = (container.height - height) / 2.0;
        canvas.fill_rect(PixelRect::new(x, y, width, height), "rgba(245, 158, 11, 0.95)");
        canvas.fill_text(&text, Point::new(x + 16.0, y + 23.0), LABEL_FONT, WHITE);
    }
}
