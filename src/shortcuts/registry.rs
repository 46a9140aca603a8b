// Shortcut registry - holds the active bindings and their actions

use super::reserved::is_reserved;
use super::{describe_combo, ShortcutBinding, ShortcutDocument, ShortcutError, ShortcutStore};
use crate::keyboard_capture::{KeyCode, ModifierSet};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Action run when a binding fires
pub type ShortcutAction = Arc<dyn Fn() + Send + Sync>;

/// Produces the action for an identifier (used for bindings created by import/load)
pub type ActionFactory = Arc<dyn Fn(&str) -> Option<ShortcutAction> + Send + Sync>;

#[derive(Clone)]
struct RegisteredShortcut {
    binding: ShortcutBinding,
    action: Option<ShortcutAction>,
}

/// Saved registry contents (bindings, order and actions), for rolling back a change
#[derive(Clone)]
pub struct RegistrySnapshot(Vec<RegisteredShortcut>);

impl RegistrySnapshot {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Binding found by a lookup, detached from the registry so it can be run without holding a lock
#[derive(Clone)]
pub struct ShortcutMatch {
    pub identifier: String,
    action: Option<ShortcutAction>,
}

impl ShortcutMatch {
    /// Run the action; returns false when the binding has no action attached
    pub fn invoke(&self) -> bool {
        match self.action {
            Some(ref action) => {
                action();
                true
            }
            None => {
                crate::debug!("Shortcut '{}' has no action attached", self.identifier);
                false
            }
        }
    }
}

impl fmt::Debug for ShortcutMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortcutMatch")
            .field("identifier", &self.identifier)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

/// Active shortcut bindings
///
/// Registration guarantees unique (key code, modifiers) pairs. Duplicates can only
/// enter through `import`/`load_from` of a hand-edited document; lookups then resolve
/// to the earliest binding and `detect_conflicts` reports them.
#[derive(Default)]
pub struct ShortcutRegistry {
    entries: Vec<RegisteredShortcut>,
    action_factory: Option<ActionFactory>,
}

impl ShortcutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that attaches actions to imported bindings through `factory`
    pub fn with_action_factory(factory: ActionFactory) -> Self {
        Self {
            entries: Vec::new(),
            action_factory: Some(factory),
        }
    }

    fn validate(key_code: KeyCode, modifiers: ModifierSet) -> Result<(), ShortcutError> {
        if modifiers.is_empty() {
            return Err(ShortcutError::InvalidShortcut(
                "at least one modifier is required".to_string(),
            ));
        }
        if key_code == 0 {
            // 0 is the "no key" sentinel of settings UIs, even though it is kVK_ANSI_A
            return Err(ShortcutError::InvalidShortcut("key code must be non-zero".to_string()));
        }
        if is_reserved(key_code, modifiers) {
            return Err(ShortcutError::SystemReserved(describe_combo(key_code, modifiers)));
        }
        Ok(())
    }

    /// Add a binding
    ///
    /// `action` overrides the action factory; with neither, the binding is stored
    /// without an action (lookups still match it).
    #[must_use = "this returns a Result that should be handled"]
    pub fn register(
        &mut self,
        binding: ShortcutBinding,
        action: Option<ShortcutAction>,
    ) -> Result<(), ShortcutError> {
        Self::validate(binding.key_code, binding.modifiers)?;

        if let Some(existing) = self.find(binding.key_code, binding.modifiers) {
            return Err(ShortcutError::Conflict {
                combo: binding.to_string(),
                existing: existing.identifier.clone(),
            });
        }

        let action = action.or_else(|| self.action_for(&binding.identifier));
        crate::info!("Registered shortcut {} -> '{}'", binding, binding.identifier);
        self.entries.push(RegisteredShortcut { binding, action });
        Ok(())
    }

    /// Remove a binding and its action. Returns whether anything was removed.
    pub fn unregister(&mut self, binding: &ShortcutBinding) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.binding != *binding);
        let removed = self.entries.len() != before;
        if removed {
            crate::info!("Unregistered shortcut {} -> '{}'", binding, binding.identifier);
        }
        removed
    }

    /// Earliest binding with exactly this combination
    pub fn find(&self, key_code: KeyCode, modifiers: ModifierSet) -> Option<&ShortcutBinding> {
        self.entries
            .iter()
            .map(|e| &e.binding)
            .find(|b| b.combo() == (key_code, modifiers))
    }

    /// Look up a binding without running it
    pub fn matching(&self, key_code: KeyCode, modifiers: ModifierSet) -> Option<ShortcutMatch> {
        self.entries
            .iter()
            .find(|e| e.binding.combo() == (key_code, modifiers))
            .map(|e| ShortcutMatch {
                identifier: e.binding.identifier.clone(),
                action: e.action.clone(),
            })
    }

    /// Run the binding for this combination, if any. Returns whether a binding matched.
    pub fn execute_if_registered(&self, key_code: KeyCode, modifiers: ModifierSet) -> bool {
        match self.matching(key_code, modifiers) {
            Some(found) => {
                crate::debug!("Shortcut {} matched '{}'", describe_combo(key_code, modifiers), found.identifier);
                found.invoke();
                true
            }
            None => false,
        }
    }

    /// All pairs of bindings sharing a combination
    pub fn detect_conflicts(&self) -> Vec<(ShortcutBinding, ShortcutBinding)> {
        let mut conflicts = Vec::new();
        for (i, a) in self.entries.iter().enumerate() {
            for b in &self.entries[i + 1..] {
                if a.binding.combo() == b.binding.combo() {
                    conflicts.push((a.binding.clone(), b.binding.clone()));
                }
            }
        }
        conflicts
    }

    /// Bindings in registration order
    pub fn bindings(&self) -> Vec<ShortcutBinding> {
        self.entries.iter().map(|e| e.binding.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the full binding set
    pub fn export(&self) -> Result<Vec<u8>, ShortcutError> {
        ShortcutDocument::new(self.bindings()).encode()
    }

    /// Replace the binding set with the contents of `data`
    ///
    /// Either every binding is accepted or the registry is left untouched.
    /// Returns the number of imported bindings.
    pub fn import(&mut self, data: &[u8]) -> Result<usize, ShortcutError> {
        let document = ShortcutDocument::decode(data)?;
        self.replace_all(document.bindings)
    }

    fn replace_all(&mut self, bindings: Vec<ShortcutBinding>) -> Result<usize, ShortcutError> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(bindings.len());

        for binding in bindings {
            Self::validate(binding.key_code, binding.modifiers).map_err(|e| {
                ShortcutError::MalformedData(format!("binding '{}': {}", binding.identifier, e))
            })?;
            if !seen.insert(binding.combo()) {
                crate::warn!(
                    "Imported shortcut {} for '{}' conflicts with an earlier binding",
                    binding,
                    binding.identifier
                );
            }
            let action = self.action_for(&binding.identifier);
            entries.push(RegisteredShortcut { binding, action });
        }

        let count = entries.len();
        self.entries = entries;
        crate::info!("Imported {} shortcuts", count);
        Ok(count)
    }

    /// Capture the current entries
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot(self.entries.clone())
    }

    /// Put back exactly what `snapshot` captured, duplicates and order included
    pub fn restore(&mut self, snapshot: RegistrySnapshot) {
        crate::debug!("Restoring {} shortcuts", snapshot.len());
        self.entries = snapshot.0;
    }

    /// Replace the binding set with the persisted one
    pub fn load_from(&mut self, store: &ShortcutStore) -> Result<usize, ShortcutError> {
        let bindings = store.load()?;
        self.replace_all(bindings)
    }

    pub fn save_to(&self, store: &ShortcutStore) -> Result<(), ShortcutError> {
        store.save(&self.bindings())
    }

    fn action_for(&self, identifier: &str) -> Option<ShortcutAction> {
        self.action_factory.as_ref().and_then(|factory| factory(identifier))
    }
}

impl fmt::Debug for ShortcutRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortcutRegistry")
            .field("bindings", &self.bindings())
            .field("has_action_factory", &self.action_factory.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
