//! Settings and Quit combo handlers.

use tauri::{AppHandle, Manager};

use crate::events::SystemActions;

/// Label of the settings window in tauri.conf.json
pub const SETTINGS_WINDOW_LABEL: &str = "main";

pub struct TauriSystemActions {
    app_handle: AppHandle,
}

impl TauriSystemActions {
    pub fn new(app_handle: AppHandle) -> Self {
        Self { app_handle }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
impl SystemActions for TauriSystemActions {
    fn open_settings(&self) {
        let Some(window) = self.app_handle.get_webview_window(SETTINGS_WINDOW_LABEL) else {
            crate::warn!("Settings window '{}' not found", SETTINGS_WINDOW_LABEL);
            return;
        };
        if let Err(e) = window.show() {
            crate::warn!("Failed to show settings window: {}", e);
        }
        if let Err(e) = window.set_focus() {
            crate::warn!("Failed to focus settings window: {}", e);
        }
        crate::info!("Settings window shown");
    }

    fn quit(&self) {
        crate::info!("Quit requested");
        self.app_handle.exit(0);
    }
}
