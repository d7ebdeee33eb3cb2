//! Interactive editing for WAM diagrams.
//!
//! `EditorSession` owns the scene graph, the viewport and the interaction
//! state; hosts feed it canvas events and call its commands.

pub mod config;
pub mod controller;
pub mod error;
pub mod form_history;
pub mod history;
pub mod input;
pub mod overlay;
pub mod selection;
pub mod session;
pub mod shortcuts;

pub use config::{DEFAULT_PAPER, EditorConfig, PAPER_MAX, PAPER_MIN};
pub use controller::{Gesture, InteractionContext, InteractionController, Request};
pub use error::EditorError;
pub use form_history::FormHistory;
pub use history::GraphHistory;
pub use input::{CanvasEvent, FocusContext, Modifiers, MouseButton};
pub use overlay::{OverlayBox, SelectionOverlay};
pub use selection::{Selection, SelectionChange, Subscription};
pub use session::{Confirm, ConfirmRequest, EditorSession, FixedAnswer, Theme};
pub use shortcuts::{ShortcutAction, ShortcutMap};
