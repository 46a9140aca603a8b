//! Tauri overlay renderer.
//!
//! Forwards session transitions to the overlay webview as events and shows or
//! hides its window. The webview reports clicks back through `overlay_select`.

use tauri::{AppHandle, Emitter, Manager};

use crate::emit_or_warn;
use crate::events::overlay_events::{
    OverlaySelectionPayload, OverlayShownPayload, OVERLAY_HIDDEN, OVERLAY_SELECTION_CHANGED,
    OVERLAY_SHOWN,
};
use crate::events::{ApplicationHandle, OverlayView};
use crate::overlay::ViewMode;

/// Label of the overlay window in tauri.conf.json
pub const OVERLAY_WINDOW_LABEL: &str = "overlay";

/// Tauri AppHandle-based overlay view for production use.
pub struct TauriOverlayView {
    app_handle: AppHandle,
}

impl TauriOverlayView {
    pub fn new(app_handle: AppHandle) -> Self {
        Self { app_handle }
    }

    fn show(&self, mode: ViewMode, applications: &[ApplicationHandle], selected_index: usize) {
        emit_or_warn!(
            self.app_handle,
            OVERLAY_SHOWN,
            OverlayShownPayload {
                mode,
                applications: applications.to_vec(),
                selected_index,
            }
        );

        match self.app_handle.get_webview_window(OVERLAY_WINDOW_LABEL) {
            Some(window) => {
                if let Err(e) = window.show() {
                    crate::warn!("Failed to show overlay window: {}", e);
                }
            }
            None => crate::warn!("Overlay window '{}' not found", OVERLAY_WINDOW_LABEL),
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
impl OverlayView for TauriOverlayView {
    fn show_bound_view(&self, applications: &[ApplicationHandle], selected_index: usize) {
        self.show(ViewMode::Bound, applications, selected_index);
    }

    fn show_running_view(&self, applications: &[ApplicationHandle], selected_index: usize) {
        self.show(ViewMode::Running, applications, selected_index);
    }

    fn update_selected_index(&self, index: usize) {
        emit_or_warn!(
            self.app_handle,
            OVERLAY_SELECTION_CHANGED,
            OverlaySelectionPayload {
                selected_index: index
            }
        );
    }

    fn hide(&self) {
        emit_or_warn!(self.app_handle, OVERLAY_HIDDEN, ());
        if let Some(window) = self.app_handle.get_webview_window(OVERLAY_WINDOW_LABEL) {
            if let Err(e) = window.hide() {
                crate::warn!("Failed to hide overlay window: {}", e);
            }
        }
    }
}
