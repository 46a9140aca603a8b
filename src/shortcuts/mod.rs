// Logical keyboard shortcuts
// Bindings of (key code, modifier set) to an identifier, with conflict detection,
// a reserved-combination blocklist, a versioned export format and file persistence.

pub mod global;
pub mod registry;
pub mod reserved;
pub mod schema;
pub mod store;

pub use global::{accelerator_for, GlobalShortcutBackend};
pub use registry::{ActionFactory, RegistrySnapshot, ShortcutAction, ShortcutMatch, ShortcutRegistry};
pub use schema::{ShortcutDocument, SCHEMA_VERSION};
pub use store::ShortcutStore;

use crate::keyboard_capture::keycodes::keycode_to_name;
use crate::keyboard_capture::{KeyCode, ModifierSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One logical shortcut
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutBinding {
    pub key_code: KeyCode,
    pub modifiers: ModifierSet,
    pub identifier: String,
}

impl ShortcutBinding {
    pub fn new(key_code: KeyCode, modifiers: ModifierSet, identifier: impl Into<String>) -> Self {
        Self {
            key_code,
            modifiers,
            identifier: identifier.into(),
        }
    }

    /// The (key code, modifiers) pair bindings must not share
    pub fn combo(&self) -> (KeyCode, ModifierSet) {
        (self.key_code, self.modifiers)
    }
}

impl fmt::Display for ShortcutBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", describe_combo(self.key_code, self.modifiers))
    }
}

/// Human-readable form of a combination, e.g. "option+command+3"
pub fn describe_combo(key_code: KeyCode, modifiers: ModifierSet) -> String {
    let key = keycode_to_name(key_code);
    if modifiers.is_empty() {
        key
    } else {
        format!("{}+{}", modifiers, key)
    }
}

/// Errors returned by registry and persistence operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShortcutError {
    /// Another binding already uses the same combination
    #[error("{combo} is already bound to '{existing}'")]
    Conflict { combo: String, existing: String },
    /// Empty modifier set or zero key code
    #[error("Invalid shortcut: {0}")]
    InvalidShortcut(String),
    /// Collides with an OS-level combination
    #[error("{0} is reserved by the system")]
    SystemReserved(String),
    /// Import document could not be decoded or validated
    #[error("Malformed shortcut data: {0}")]
    MalformedData(String),
    /// Reading or writing the shortcut file failed
    #[error("Failed to persist shortcuts: {0}")]
    Persistence(String),
}

/// Prefix of identifiers that switch to a bound application ("app_1" is the first)
pub const BOUND_APP_PREFIX: &str = "app_";

/// Zero-based bound-application index named by an identifier like "app_3"
pub fn bound_app_index(identifier: &str) -> Option<usize> {
    identifier
        .strip_prefix(BOUND_APP_PREFIX)?
        .parse::<usize>()
        .ok()?
        .checked_sub(1)
}

/// Bindings installed on first launch: Control+Shift+1..4 switch to bound apps 1..4
///
/// The combination leaves out the default trigger, so pressing it never opens the overlay.
pub fn default_bindings() -> Vec<ShortcutBinding> {
    use crate::keyboard_capture::ModifierKey;

    let modifiers = ModifierSet::only(ModifierKey::Control).with(ModifierKey::Shift);
    (0..4u16)
        .map(|i| {
            ShortcutBinding::new(
                crate::keyboard_capture::keycodes::DIGIT_FIRST + i,
                modifiers,
                format!("{}{}", BOUND_APP_PREFIX, i + 1),
            )
        })
        .collect()
}
