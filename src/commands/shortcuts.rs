//! Shortcut settings commands.
#![cfg_attr(coverage_nightly, coverage(off))]

use tauri::{AppHandle, Emitter, State};

use super::logic::{
    detect_shortcut_conflicts_impl, export_shortcuts_impl, import_shortcuts_impl,
    list_shortcuts_impl, register_shortcut_impl, unregister_shortcut_impl, ShortcutConflict,
    ShortcutInfo, ShortcutSinks,
};
use super::RegistryState;
use crate::emit_or_warn;
use crate::events::shortcut_events::{ShortcutsUpdatedPayload, SHORTCUTS_UPDATED};
use crate::keyboard_capture::{KeyCode, ModifierSet};
use crate::shortcuts::{ShortcutBinding, ShortcutStore, TauriShortcutBackend};

fn notify(app_handle: &AppHandle, action: &str, count: usize) {
    emit_or_warn!(
        app_handle,
        SHORTCUTS_UPDATED,
        ShortcutsUpdatedPayload {
            action: action.to_string(),
            count,
        }
    );
}

#[tauri::command]
pub fn register_shortcut(
    app_handle: AppHandle,
    registry: State<'_, RegistryState>,
    store: State<'_, ShortcutStore>,
    key_code: KeyCode,
    modifiers: ModifierSet,
    identifier: String,
) -> Result<ShortcutInfo, String> {
    let backend = TauriShortcutBackend::new(app_handle.clone());
    let sinks = ShortcutSinks {
        store: Some(store.inner()),
        global: Some(&backend),
    };
    let info = register_shortcut_impl(
        registry.inner(),
        sinks,
        ShortcutBinding::new(key_code, modifiers, identifier),
    )
    .map_err(|e| e.to_string())?;

    notify(&app_handle, "register", registry.lock().len());
    Ok(info)
}

#[tauri::command]
pub fn unregister_shortcut(
    app_handle: AppHandle,
    registry: State<'_, RegistryState>,
    store: State<'_, ShortcutStore>,
    key_code: KeyCode,
    modifiers: ModifierSet,
    identifier: String,
) -> Result<bool, String> {
    let backend = TauriShortcutBackend::new(app_handle.clone());
    let sinks = ShortcutSinks {
        store: Some(store.inner()),
        global: Some(&backend),
    };
    let removed = unregister_shortcut_impl(
        registry.inner(),
        sinks,
        &ShortcutBinding::new(key_code, modifiers, identifier),
    )
    .map_err(|e| e.to_string())?;

    if removed {
        notify(&app_handle, "unregister", registry.lock().len());
    }
    Ok(removed)
}

#[tauri::command]
pub fn list_shortcuts(registry: State<'_, RegistryState>) -> Vec<ShortcutInfo> {
    list_shortcuts_impl(registry.inner())
}

#[tauri::command]
pub fn detect_shortcut_conflicts(registry: State<'_, RegistryState>) -> Vec<ShortcutConflict> {
    detect_shortcut_conflicts_impl(registry.inner())
}

#[tauri::command]
pub fn export_shortcuts(registry: State<'_, RegistryState>) -> Result<String, String> {
    export_shortcuts_impl(registry.inner()).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn import_shortcuts(
    app_handle: AppHandle,
    registry: State<'_, RegistryState>,
    store: State<'_, ShortcutStore>,
    data: String,
) -> Result<usize, String> {
    let backend = TauriShortcutBackend::new(app_handle.clone());
    let sinks = ShortcutSinks {
        store: Some(store.inner()),
        global: Some(&backend),
    };
    let count =
        import_shortcuts_impl(registry.inner(), sinks, data.as_bytes()).map_err(|e| e.to_string())?;

    notify(&app_handle, "import", count);
    Ok(count)
}
