//! Overlay state that follows the video container
//!
//! The host measures the container and reports sizes to a [`ResizeWatcher`].
//! A [`LiveView`] subscribes to it and keeps the OSD overlay and the mask
//! editor on the latest size, so layouts and hit tests use live pixels.

use tokio::sync::watch;
use tracing::debug;

use crate::frame::ResizeWatcher;
use crate::geometry::Size;
use crate::mask::MaskEditor;
use crate::osd::OsdOverlay;

/// OSD overlay and mask editor bound to one container
#[derive(Debug)]
pub struct LiveView {
    sizes: watch::Receiver<Size>,
    osd: OsdOverlay,
    masks: MaskEditor,
}

impl LiveView {
    /// Follow `watcher`, starting from its current size
    pub fn new(serial_number: impl Into<String>, watcher: &ResizeWatcher) -> Self {
        let mut sizes = watcher.subscribe();
        let initial = *sizes.borrow_and_update();
        let mut osd = OsdOverlay::new(serial_number);
        osd.apply_resize(initial);
        Self {
            sizes,
            osd,
            masks: MaskEditor::new(initial),
        }
    }

    /// Apply a size reported since the last call; returns whether one was
    pub fn sync(&mut self) -> bool {
        if !self.sizes.has_changed().unwrap_or(false) {
            return false;
        }
        let size = *self.sizes.borrow_and_update();
        self.apply(size);
        true
    }

    /// Wait for the next size change and apply it
    ///
    /// Returns `None` once the watcher is gone.
    pub async fn resized(&mut self) -> Option<Size> {
        self.sizes.changed().await.ok()?;
        let size = *self.sizes.borrow_and_update();
        self.apply(size);
        Some(size)
    }

    fn apply(&mut self, size: Size) {
        debug!("Live view resized to {}x{}", size.width, size.height);
        self.osd.apply_resize(size);
        self.masks.set_container(size);
    }

    /// OSD interaction state
    pub fn osd(&self) -> &OsdOverlay {
        &self.osd
    }

    /// Mutable OSD interaction state
    pub fn osd_mut(&mut self) -> &mut OsdOverlay {
        &mut self.osd
    }

    /// Mask interaction state
    pub fn masks(&self) -> &MaskEditor {
        &self.masks
    }

    /// Mutable mask interaction state
    pub fn masks_mut(&mut self) -> &mut MaskEditor {
        &mut self.masks
    }
}
