//! Store-backed preferences and application lists.
//!
//! Both live in the `settings.json` store written by the settings window:
//! - `trigger.modifier`: lowercase modifier name ("option", "control", ...)
//! - `bound.applications`: array of `{ "name", "bundleId" }` objects

use serde_json::Value;
use tauri::AppHandle;
use tauri_plugin_store::StoreExt;

use super::workspace;
use crate::events::{ApplicationHandle, ApplicationProvider, PreferencesProvider};
use crate::keyboard_capture::ModifierKey;

pub const SETTINGS_FILE: &str = "settings.json";
pub const TRIGGER_MODIFIER_KEY: &str = "trigger.modifier";
pub const BOUND_APPLICATIONS_KEY: &str = "bound.applications";

/// Trigger modifier from a stored value, falling back to Option
pub fn parse_trigger(value: Option<&Value>) -> ModifierKey {
    match value.and_then(Value::as_str) {
        Some(name) => name.parse().unwrap_or_else(|e| {
            crate::warn!("Invalid {} '{}': {}, using option", TRIGGER_MODIFIER_KEY, name, e);
            ModifierKey::default()
        }),
        None => ModifierKey::default(),
    }
}

/// Bound applications from a stored value; malformed entries are skipped
pub fn parse_bound_applications(value: Option<Value>) -> Vec<ApplicationHandle> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<ApplicationHandle>(entry) {
            Ok(application) => Some(application),
            Err(e) => {
                crate::warn!("Skipping malformed bound application: {}", e);
                None
            }
        })
        .collect()
}

fn read(app_handle: &AppHandle, key: &str) -> Option<Value> {
    match app_handle.store(SETTINGS_FILE) {
        Ok(store) => store.get(key),
        Err(e) => {
            crate::warn!("Failed to open {}: {}", SETTINGS_FILE, e);
            None
        }
    }
}

/// Preferences read from the settings store
pub struct StorePreferences {
    app_handle: AppHandle,
}

impl StorePreferences {
    pub fn new(app_handle: AppHandle) -> Self {
        Self { app_handle }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
impl PreferencesProvider for StorePreferences {
    fn trigger_modifier(&self) -> ModifierKey {
        parse_trigger(read(&self.app_handle, TRIGGER_MODIFIER_KEY).as_ref())
    }
}

/// Bound list from the settings store, running list from the OS
pub struct DesktopApplications {
    app_handle: AppHandle,
}

impl DesktopApplications {
    pub fn new(app_handle: AppHandle) -> Self {
        Self { app_handle }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
impl ApplicationProvider for DesktopApplications {
    fn bound_applications(&self) -> Vec<ApplicationHandle> {
        parse_bound_applications(read(&self.app_handle, BOUND_APPLICATIONS_KEY))
    }

    fn running_applications(&self) -> Vec<ApplicationHandle> {
        workspace::running_applications()
    }

    fn switch_to(&self, application: &ApplicationHandle) {
        if let Err(e) = workspace::activate(application) {
            crate::warn!("{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_trigger() {
        assert_eq!(parse_trigger(Some(&json!("control"))), ModifierKey::Control);
        assert_eq!(parse_trigger(Some(&json!("cmd"))), ModifierKey::Command);
        assert_eq!(parse_trigger(Some(&json!("hyper"))), ModifierKey::Option);
        assert_eq!(parse_trigger(Some(&json!(3))), ModifierKey::Option);
        assert_eq!(parse_trigger(None), ModifierKey::Option);
    }

    #[test]
    fn test_parse_bound_applications_skips_malformed_entries() {
        let value = json!([
            { "name": "Safari", "bundleId": "com.apple.Safari" },
            { "bundleId": "missing.name" },
            { "name": "Notes" }
        ]);

        let applications = parse_bound_applications(Some(value));

        assert_eq!(applications.len(), 2);
        assert_eq!(applications[0].bundle_id.as_deref(), Some("com.apple.Safari"));
        assert_eq!(applications[1], ApplicationHandle::named("Notes"));
    }

    #[test]
    fn test_parse_bound_applications_non_array() {
        assert!(parse_bound_applications(Some(json!({ "name": "Safari" }))).is_empty());
        assert!(parse_bound_applications(None).is_empty());
    }
}
