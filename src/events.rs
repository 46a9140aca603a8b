// Overlay events and external collaborators
// Defines the interfaces the engine calls into (overlay rendering, applications,
// preferences, system actions) and the event payloads sent to the overlay webview.

use crate::keyboard_capture::ModifierKey;
use serde::{Deserialize, Serialize};

/// Event names as constants for consistency
pub mod overlay_events {
    pub const OVERLAY_SHOWN: &str = "overlay_shown";
    pub const OVERLAY_SELECTION_CHANGED: &str = "overlay_selection_changed";
    pub const OVERLAY_HIDDEN: &str = "overlay_hidden";

    use super::ApplicationHandle;
    use crate::overlay::ViewMode;

    /// Payload for overlay_shown (sent on show and on every mode flip)
    #[derive(Debug, Clone, serde::Serialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    pub struct OverlayShownPayload {
        pub mode: ViewMode,
        pub applications: Vec<ApplicationHandle>,
        pub selected_index: usize,
    }

    /// Payload for overlay_selection_changed
    #[derive(Debug, Clone, serde::Serialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    pub struct OverlaySelectionPayload {
        pub selected_index: usize,
    }
}

/// Shortcut-related event names
pub mod shortcut_events {
    pub const SHORTCUTS_UPDATED: &str = "shortcuts_updated";

    /// Payload for shortcuts_updated
    #[derive(Debug, Clone, serde::Serialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    pub struct ShortcutsUpdatedPayload {
        /// "register", "unregister" or "import"
        pub action: String,
        pub count: usize,
    }
}

/// Permission-related event names
pub mod permission_events {
    pub const INPUT_PERMISSION_REQUIRED: &str = "input_permission_required";
    pub const INPUT_CAPTURE_STARTED: &str = "input_capture_started";
}

/// Opaque handle to an application, supplied by the `ApplicationProvider`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationHandle {
    /// Display name
    pub name: String,
    /// Bundle identifier (macOS)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    /// Process id, when the application is running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<i32>,
}

impl ApplicationHandle {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bundle_id: None,
            pid: None,
        }
    }
}

/// Overlay rendering layer
///
/// The view reports the user's pick back through `Dispatcher::select_from_ui`.
pub trait OverlayView: Send + Sync {
    fn show_bound_view(&self, applications: &[ApplicationHandle], selected_index: usize);
    fn show_running_view(&self, applications: &[ApplicationHandle], selected_index: usize);
    fn update_selected_index(&self, index: usize);
    fn hide(&self);
}

/// Source of application lists and the switch-to mechanism
pub trait ApplicationProvider: Send + Sync {
    /// User-curated applications, in display order
    fn bound_applications(&self) -> Vec<ApplicationHandle>;
    /// Currently running applications, in display order
    fn running_applications(&self) -> Vec<ApplicationHandle>;
    fn switch_to(&self, application: &ApplicationHandle);
}

/// User preferences the engine reads
pub trait PreferencesProvider: Send + Sync {
    fn trigger_modifier(&self) -> ModifierKey;
}

/// Fixed preferences, for headless use and tests
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticPreferences {
    pub trigger: ModifierKey,
}

impl PreferencesProvider for StaticPreferences {
    fn trigger_modifier(&self) -> ModifierKey {
        self.trigger
    }
}

/// Actions behind the Settings and Quit combos
pub trait SystemActions: Send + Sync {
    fn open_settings(&self);
    fn quit(&self);
}

#[cfg(test)]
#[path = "events_test.rs"]
pub(crate) mod tests;
