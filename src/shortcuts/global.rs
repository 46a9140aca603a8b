// OS-wide registration of shortcut bindings
//
// Key-down capture is only armed while the overlay is visible, so bound shortcuts are
// also registered with the system hotkey service to fire from anywhere.

use super::{ShortcutAction, ShortcutBinding};
use crate::keyboard_capture::keycodes::{self, KeyCode, FUNCTION_CODES, LETTER_CODES};
use crate::keyboard_capture::ModifierKey;

/// Trait for OS hotkey registration backends (allows mocking in tests)
pub trait GlobalShortcutBackend: Send + Sync {
    fn register(&self, accelerator: &str, callback: ShortcutAction) -> Result<(), String>;
    fn unregister(&self, accelerator: &str) -> Result<(), String>;
}

fn key_name(key_code: KeyCode) -> Option<String> {
    if let Some(i) = LETTER_CODES.iter().position(|&c| c == key_code) {
        return Some(((b'A' + i as u8) as char).to_string());
    }
    if let Some(i) = FUNCTION_CODES.iter().position(|&c| c == key_code) {
        return Some(format!("F{}", i + 1));
    }
    match key_code {
        keycodes::DIGIT_FIRST..=keycodes::DIGIT_LAST | 28 | 29 => {
            Some(keycodes::keycode_to_name(key_code))
        }
        keycodes::KEY_SPACE => Some("Space".to_string()),
        keycodes::KEY_TAB => Some("Tab".to_string()),
        keycodes::KEY_ESCAPE => Some("Escape".to_string()),
        keycodes::KEY_COMMA => Some("Comma".to_string()),
        keycodes::KEY_GRAVE => Some("Backquote".to_string()),
        keycodes::KEY_LEFT => Some("ArrowLeft".to_string()),
        keycodes::KEY_RIGHT => Some("ArrowRight".to_string()),
        keycodes::KEY_UP => Some("ArrowUp".to_string()),
        keycodes::KEY_DOWN => Some("ArrowDown".to_string()),
        _ => None,
    }
}

/// Accelerator string for a binding, e.g. "Alt+Control+3"
///
/// Returns `None` when the key has no accelerator name (e.g. "=" on the digit row).
pub fn accelerator_for(binding: &ShortcutBinding) -> Option<String> {
    let key = key_name(binding.key_code)?;
    if key.chars().count() == 1 && !key.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let mut parts: Vec<&str> = binding
        .modifiers
        .iter()
        .map(|m| match m {
            ModifierKey::Option => "Alt",
            ModifierKey::Control => "Control",
            ModifierKey::Command => "Super",
            ModifierKey::Shift => "Shift",
        })
        .collect();
    parts.push(&key);
    Some(parts.join("+"))
}

/// Register a binding with the backend. Returns the accelerator used.
pub fn register_global(
    backend: &dyn GlobalShortcutBackend,
    binding: &ShortcutBinding,
    callback: ShortcutAction,
) -> Result<String, String> {
    let accelerator = accelerator_for(binding)
        .ok_or_else(|| format!("{} has no global accelerator", binding))?;
    backend.register(&accelerator, callback)?;
    crate::debug!("Global shortcut {} registered for '{}'", accelerator, binding.identifier);
    Ok(accelerator)
}

pub fn unregister_global(backend: &dyn GlobalShortcutBackend, binding: &ShortcutBinding) -> Result<(), String> {
    match accelerator_for(binding) {
        Some(accelerator) => backend.unregister(&accelerator),
        None => Ok(()),
    }
}

#[cfg(feature = "desktop")]
pub use tauri_backend::TauriShortcutBackend;

#[cfg(feature = "desktop")]
mod tauri_backend {
    use super::GlobalShortcutBackend;
    use crate::shortcuts::ShortcutAction;
    use tauri_plugin_global_shortcut::{GlobalShortcutExt, Shortcut, ShortcutState};

    /// Thin wrapper around tauri_plugin_global_shortcut
    pub struct TauriShortcutBackend {
        app: tauri::AppHandle,
    }

    impl TauriShortcutBackend {
        #[cfg_attr(coverage_nightly, coverage(off))]
        pub fn new(app: tauri::AppHandle) -> Self {
            Self { app }
        }
    }

    #[cfg_attr(coverage_nightly, coverage(off))]
    impl GlobalShortcutBackend for TauriShortcutBackend {
        fn register(&self, accelerator: &str, callback: ShortcutAction) -> Result<(), String> {
            let parsed: Shortcut = accelerator.parse().map_err(|e| format!("{}", e))?;
            self.app
                .global_shortcut()
                .on_shortcut(parsed, move |_, _, event| {
                    // Fire on press only; the plugin also reports releases
                    if event.state == ShortcutState::Pressed {
                        callback()
                    }
                })
                .map_err(|e| format!("{}", e))
        }

        fn unregister(&self, accelerator: &str) -> Result<(), String> {
            let parsed: Shortcut = accelerator.parse().map_err(|e| format!("{}", e))?;
            self.app
                .global_shortcut()
                .unregister(parsed)
                .map_err(|e| format!("{}", e))
        }
    }
}
