//! Overlay webview commands.
#![cfg_attr(coverage_nightly, coverage(off))]

use tauri::State;

use super::logic::{get_overlay_state_impl, overlay_dismiss_impl, overlay_select_impl};
use super::DispatcherState;
use crate::overlay::OverlaySnapshot;

#[tauri::command]
pub fn get_overlay_state(dispatcher: State<'_, DispatcherState>) -> OverlaySnapshot {
    get_overlay_state_impl(dispatcher.inner())
}

/// The overlay's onSelect: commit the clicked application and hide
#[tauri::command]
pub fn overlay_select(dispatcher: State<'_, DispatcherState>, index: usize) {
    overlay_select_impl(dispatcher.inner(), index);
}

#[tauri::command]
pub fn overlay_dismiss(dispatcher: State<'_, DispatcherState>) {
    overlay_dismiss_impl(dispatcher.inner());
}

/// Open System Settings at the Accessibility pane
#[tauri::command]
pub fn open_accessibility_settings() -> Result<(), String> {
    crate::keyboard_capture::permissions::open_accessibility_settings()
}
