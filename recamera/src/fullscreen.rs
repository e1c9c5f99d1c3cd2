//! Fullscreen control and the keyboard shortcut that drives it

use recamera_core::ConsoleError;

/// Platform fullscreen API for the player container
pub trait FullscreenControl: Send + Sync {
    /// Whether the platform can go fullscreen at all
    fn is_supported(&self) -> bool;

    /// Whether the container is currently fullscreen
    fn is_fullscreen(&self) -> bool;

    /// Make the container fullscreen
    fn enter(&self) -> Result<(), String>;

    /// Leave fullscreen
    fn exit(&self) -> Result<(), String>;
}

/// Enter fullscreen if windowed, leave it otherwise; returns the new state
pub fn toggle_fullscreen(control: &dyn FullscreenControl) -> Result<bool, ConsoleError> {
    if !control.is_supported() {
        return Err(ConsoleError::InvalidState {
            expected: "fullscreen support".to_string(),
            actual: "unsupported".to_string(),
        });
    }
    let (result, target) = if control.is_fullscreen() {
        (control.exit(), false)
    } else {
        (control.enter(), true)
    };
    result.map_err(|reason| ConsoleError::InvalidState {
        expected: if target { "fullscreen" } else { "windowed" }.to_string(),
        actual: reason,
    })?;
    Ok(target)
}

/// A key press delivered to the page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPress {
    /// Key value, e.g. `"f"`
    pub key: String,
    /// Control held
    pub ctrl: bool,
    /// Alt held
    pub alt: bool,
    /// Meta/command held
    pub meta: bool,
    /// Focus is in a text input or text area
    pub in_text_input: bool,
}

impl KeyPress {
    /// A bare key press outside any input
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }
}

/// Whether `press` should toggle fullscreen
///
/// Only a bare `f`/`F` counts, only while connected, and never while typing.
pub fn is_fullscreen_shortcut(press: &KeyPress, connected: bool) -> bool {
    matches!(press.key.as_str(), "f" | "F")
        && connected
        && !press.ctrl
        && !press.alt
        && !press.meta
        && !press.in_text_input
}
