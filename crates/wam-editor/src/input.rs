//! Host-neutral canvas input.
//!
//! Pointer positions are in device (surface) coordinates; the session maps
//! them into scene space through the viewport before the controller sees
//! them.

use wam_core::Point;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MouseButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    /// Ctrl on most platforms, ⌘ on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Where keyboard focus sits when a key arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusContext {
    /// Focus is inside a text input, textarea or content-editable element.
    pub in_text_input: bool,
    pub modal_open: bool,
}

impl FocusContext {
    /// Canvas shortcuts only fire when neither a text field nor a modal
    /// owns the keyboard.
    pub fn accepts_shortcuts(&self) -> bool {
        !self.in_text_input && !self.modal_open
    }
}

/// A raw event from the canvas surface.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    PointerDown {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    PointerMove {
        position: Point,
    },
    PointerUp {
        position: Point,
    },
    ContextMenu {
        position: Point,
    },
    /// Wheel or pinch zoom around `position`; `factor > 1` zooms in.
    Zoom {
        position: Point,
        factor: f64,
    },
    Key {
        key: String,
        modifiers: Modifiers,
        focus: FocusContext,
    },
}

impl CanvasEvent {
    pub fn pointer_down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            position: Point::new(x, y),
            button: MouseButton::Primary,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_move(x: f64, y: f64) -> Self {
        Self::PointerMove {
            position: Point::new(x, y),
        }
    }

    pub fn pointer_up(x: f64, y: f64) -> Self {
        Self::PointerUp {
            position: Point::new(x, y),
        }
    }

    pub fn context_menu(x: f64, y: f64) -> Self {
        Self::ContextMenu {
            position: Point::new(x, y),
        }
    }

    /// A key press with the canvas focused.
    pub fn key(key: &str, modifiers: Modifiers) -> Self {
        Self::Key {
            key: key.to_string(),
            modifiers,
            focus: FocusContext::default(),
        }
    }

    /// Device position for pointer events.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { position, .. }
            | Self::PointerMove { position }
            | Self::PointerUp { position }
            | Self::ContextMenu { position }
            | Self::Zoom { position, .. } => Some(*position),
            Self::Key { .. } => None,
        }
    }
}
