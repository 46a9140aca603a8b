// Command implementation logic - testable functions separate from Tauri wrappers
//
// Every mutation is applied to the registry first, then persisted, then mirrored to
// the OS hotkey service. A failed save rolls the registry back; a failed OS
// registration only logs, since the binding still works while capture is armed.

use crate::dispatcher::Dispatcher;
use crate::keyboard_capture::{KeyCode, ModifierSet};
use crate::overlay::OverlaySnapshot;
use crate::shortcuts::global::{register_global, unregister_global};
use crate::shortcuts::{
    GlobalShortcutBackend, ShortcutAction, ShortcutBinding, ShortcutError,
    ShortcutRegistry, ShortcutStore,
};
use crate::{debug, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Binding as shown in the settings UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutInfo {
    pub key_code: KeyCode,
    pub modifiers: ModifierSet,
    pub identifier: String,
    /// Human-readable combination, e.g. "option+1"
    pub label: String,
}

impl From<&ShortcutBinding> for ShortcutInfo {
    fn from(binding: &ShortcutBinding) -> Self {
        Self {
            key_code: binding.key_code,
            modifiers: binding.modifiers,
            identifier: binding.identifier.clone(),
            label: binding.to_string(),
        }
    }
}

/// Two bindings sharing a combination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortcutConflict {
    pub first: ShortcutInfo,
    pub second: ShortcutInfo,
}

/// Where shortcut mutations are mirrored besides the registry
#[derive(Clone, Copy, Default)]
pub struct ShortcutSinks<'a> {
    pub store: Option<&'a ShortcutStore>,
    pub global: Option<&'a dyn GlobalShortcutBackend>,
}

/// OS hotkey callback: look the combination up at fire time, run it outside the lock
pub fn global_action(registry: &Arc<Mutex<ShortcutRegistry>>, binding: &ShortcutBinding) -> ShortcutAction {
    let registry = Arc::clone(registry);
    let (key_code, modifiers) = binding.combo();
    Arc::new(move || {
        let found = registry.lock().matching(key_code, modifiers);
        if let Some(found) = found {
            found.invoke();
        }
    })
}

fn persist(registry: &ShortcutRegistry, sinks: ShortcutSinks<'_>) -> Result<(), ShortcutError> {
    match sinks.store {
        Some(store) => registry.save_to(store),
        None => Ok(()),
    }
}

/// Register every binding with the OS hotkey service, once per combination
pub fn register_all_global(
    registry: &Arc<Mutex<ShortcutRegistry>>,
    backend: &dyn GlobalShortcutBackend,
    bindings: &[ShortcutBinding],
) -> usize {
    let mut seen = HashSet::new();
    let mut registered = 0;
    for binding in bindings {
        if !seen.insert(binding.combo()) {
            continue;
        }
        match register_global(backend, binding, global_action(registry, binding)) {
            Ok(_) => registered += 1,
            Err(e) => warn!("Global shortcut for '{}' not registered: {}", binding.identifier, e),
        }
    }
    registered
}

fn unregister_all_global(backend: &dyn GlobalShortcutBackend, bindings: &[ShortcutBinding]) {
    let mut seen = HashSet::new();
    for binding in bindings {
        if !seen.insert(binding.combo()) {
            continue;
        }
        if let Err(e) = unregister_global(backend, binding) {
            warn!("Failed to unregister global shortcut {}: {}", binding, e);
        }
    }
}

/// Implementation of register_shortcut
pub fn register_shortcut_impl(
    registry: &Arc<Mutex<ShortcutRegistry>>,
    sinks: ShortcutSinks<'_>,
    binding: ShortcutBinding,
) -> Result<ShortcutInfo, ShortcutError> {
    {
        let mut guard = registry.lock();
        let previous = guard.snapshot();
        guard.register(binding.clone(), None)?;
        if let Err(e) = persist(&guard, sinks) {
            guard.restore(previous);
            return Err(e);
        }
    }

    if let Some(backend) = sinks.global {
        if let Err(e) = register_global(backend, &binding, global_action(registry, &binding)) {
            warn!("Shortcut {} only active while the overlay is open: {}", binding, e);
        }
    }
    Ok(ShortcutInfo::from(&binding))
}

/// Implementation of unregister_shortcut. Returns whether the binding existed.
pub fn unregister_shortcut_impl(
    registry: &Arc<Mutex<ShortcutRegistry>>,
    sinks: ShortcutSinks<'_>,
    binding: &ShortcutBinding,
) -> Result<bool, ShortcutError> {
    let combo_still_bound = {
        let mut guard = registry.lock();
        let previous = guard.snapshot();
        if !guard.unregister(binding) {
            return Ok(false);
        }
        if let Err(e) = persist(&guard, sinks) {
            guard.restore(previous);
            return Err(e);
        }
        guard.find(binding.key_code, binding.modifiers).is_some()
    };

    if let Some(backend) = sinks.global {
        if !combo_still_bound {
            if let Err(e) = unregister_global(backend, binding) {
                warn!("Failed to unregister global shortcut {}: {}", binding, e);
            }
        }
    }
    Ok(true)
}

/// Implementation of list_shortcuts
pub fn list_shortcuts_impl(registry: &Mutex<ShortcutRegistry>) -> Vec<ShortcutInfo> {
    registry.lock().bindings().iter().map(ShortcutInfo::from).collect()
}

/// Implementation of detect_shortcut_conflicts
pub fn detect_shortcut_conflicts_impl(registry: &Mutex<ShortcutRegistry>) -> Vec<ShortcutConflict> {
    registry
        .lock()
        .detect_conflicts()
        .iter()
        .map(|(first, second)| ShortcutConflict {
            first: ShortcutInfo::from(first),
            second: ShortcutInfo::from(second),
        })
        .collect()
}

/// Implementation of export_shortcuts. The document is UTF-8 JSON.
pub fn export_shortcuts_impl(registry: &Mutex<ShortcutRegistry>) -> Result<String, ShortcutError> {
    let bytes = registry.lock().export()?;
    String::from_utf8(bytes).map_err(|e| ShortcutError::MalformedData(e.to_string()))
}

/// Implementation of import_shortcuts. Replaces the whole binding set.
pub fn import_shortcuts_impl(
    registry: &Arc<Mutex<ShortcutRegistry>>,
    sinks: ShortcutSinks<'_>,
    data: &[u8],
) -> Result<usize, ShortcutError> {
    let (previous, current, count) = {
        let mut guard = registry.lock();
        let snapshot = guard.snapshot();
        let previous = guard.bindings();
        let count = guard.import(data)?;
        if let Err(e) = persist(&guard, sinks) {
            guard.restore(snapshot);
            return Err(e);
        }
        (previous, guard.bindings(), count)
    };

    if let Some(backend) = sinks.global {
        unregister_all_global(backend, &previous);
        let registered = register_all_global(registry, backend, &current);
        debug!("{} of {} imported shortcuts registered globally", registered, count);
    }
    Ok(count)
}

/// Implementation of get_overlay_state
pub fn get_overlay_state_impl(dispatcher: &Mutex<Dispatcher>) -> OverlaySnapshot {
    dispatcher.lock().snapshot()
}

/// Implementation of overlay_select
pub fn overlay_select_impl(dispatcher: &Mutex<Dispatcher>, index: usize) {
    dispatcher.lock().select_from_ui(index);
}

/// Implementation of overlay_dismiss
pub fn overlay_dismiss_impl(dispatcher: &Mutex<Dispatcher>) {
    dispatcher.lock().dismiss_from_ui();
}

#[cfg(test)]
#[path = "logic_test.rs"]
mod tests;
