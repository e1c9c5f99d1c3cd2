//! Redraw scheduling and container resize observation

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::geometry::Size;

/// Calls a frame callback on a fixed cadence until stopped or dropped
#[derive(Debug)]
pub struct AnimationLoop {
    task: Option<JoinHandle<()>>,
}

impl AnimationLoop {
    /// Start calling `frame` every `interval`; must run inside a tokio runtime
    pub fn start<F>(interval: Duration, mut frame: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                frame();
            }
        });
        Self { task: Some(task) }
    }

    /// Whether the loop is still scheduled
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancel the loop
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("Stopping animation loop");
            task.abort();
        }
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Publishes container size changes to interested observers
#[derive(Debug)]
pub struct ResizeWatcher {
    sender: watch::Sender<Size>,
}

impl ResizeWatcher {
    /// Create a watcher with an initial size
    pub fn new(initial: Size) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Report a measured size; observers wake only if it differs
    pub fn observe(&self, size: Size) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == size {
                false
            } else {
                *current = size;
                true
            }
        })
    }

    /// Current size
    pub fn size(&self) -> Size {
        *self.sender.borrow()
    }

    /// New observer
    pub fn subscribe(&self) -> watch::Receiver<Size> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_animation_loop_runs_until_stopped() {
        let frames = Arc::new(AtomicUsize::new(0));
        let counter = frames.clone();
        let mut animation = AnimationLoop::start(Duration::from_millis(2), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(animation.is_running());
        animation.stop();
        assert!(!animation.is_running());

        let seen = frames.load(Ordering::SeqCst);
        assert!(seen > 0);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(frames.load(Ordering::SeqCst), seen);
    }

    #[tokio::test]
    async fn test_resize_watcher_ignores_same_size() {
        let watcher = ResizeWatcher::new(Size::new(640.0, 360.0));
        let mut rx = watcher.subscribe();
        assert!(!watcher.observe(Size::new(640.0, 360.0)));
        assert!(!rx.has_changed().unwrap());

        assert!(watcher.observe(Size::new(1280.0, 720.0)));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Size::new(1280.0, 720.0));
    }
}
