//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Every binding
//! is suppressed while a text field or modal dialog owns the keyboard.

use crate::input::{FocusContext, Modifiers};

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    DeleteSelection,
    Undo,
    Redo,
    /// Show or hide the entity details panel.
    TogglePanel,
    ZoomIn,
    ZoomOut,
    ResetZoom,
}

/// Resolves key events into shortcut actions.
///
/// `command` is Ctrl, or ⌘ on macOS.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the combo has no binding or focus is elsewhere.
    pub fn resolve(key: &str, modifiers: Modifiers, focus: FocusContext) -> Option<ShortcutAction> {
        if !focus.accepts_shortcuts() {
            return None;
        }

        if modifiers.command() && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if modifiers.command() {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "b" | "B" => Some(ShortcutAction::TogglePanel),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ResetZoom),
                _ => None,
            };
        }

        match key {
            "Delete" | "Backspace" if !modifiers.alt => Some(ShortcutAction::DeleteSelection),
            _ => None,
        }
    }
}
