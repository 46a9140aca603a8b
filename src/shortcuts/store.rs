// Shortcut file persistence using atomic write (temp file + rename)

use super::{ShortcutBinding, ShortcutDocument, ShortcutError};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the app directory under the user config dir
pub const APP_DIR_NAME: &str = "keyswitch";
/// File holding the persisted bindings
pub const SHORTCUTS_FILE_NAME: &str = "shortcuts.json";

/// JSON file holding the bound shortcuts
#[derive(Debug, Clone)]
pub struct ShortcutStore {
    path: PathBuf,
}

impl ShortcutStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at `<config_dir>/keyswitch/shortcuts.json`
    pub fn with_default_path() -> Result<Self, ShortcutError> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ShortcutError::Persistence("Could not determine config directory".to_string())
        })?;
        Ok(Self::new(config_dir.join(APP_DIR_NAME).join(SHORTCUTS_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load persisted bindings. A missing file yields no bindings.
    pub fn load(&self) -> Result<Vec<ShortcutBinding>, ShortcutError> {
        crate::debug!("Loading shortcuts from {:?}", self.path);

        if !self.path.exists() {
            crate::debug!("No shortcuts file found, starting with empty registry");
            return Ok(Vec::new());
        }

        let content = fs::read(&self.path).map_err(|e| ShortcutError::Persistence(e.to_string()))?;
        let document = ShortcutDocument::decode(&content)?;
        Ok(document.bindings)
    }

    /// Persist bindings atomically
    pub fn save(&self, bindings: &[ShortcutBinding]) -> Result<(), ShortcutError> {
        crate::debug!("Persisting {} shortcuts to {:?}", bindings.len(), self.path);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ShortcutError::Persistence(e.to_string()))?;
        }

        let content = ShortcutDocument::new(bindings.to_vec()).encode()?;
        let temp_path = self.path.with_extension("tmp");

        {
            let mut file = File::create(&temp_path)
                .map_err(|e| ShortcutError::Persistence(format!("Failed to create temp file: {}", e)))?;
            file.write_all(&content)
                .map_err(|e| ShortcutError::Persistence(format!("Failed to write: {}", e)))?;
            file.sync_all()
                .map_err(|e| ShortcutError::Persistence(format!("Failed to sync: {}", e)))?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            ShortcutError::Persistence(format!("Failed to rename: {}", e))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard_capture::{ModifierKey, ModifierSet};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ShortcutStore {
        ShortcutStore::new(dir.path().join("nested").join(SHORTCUTS_FILE_NAME))
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store_in(&dir).load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let bindings = vec![
            ShortcutBinding::new(18, ModifierSet::only(ModifierKey::Option), "app_1"),
            ShortcutBinding::new(
                19,
                ModifierSet::only(ModifierKey::Option).with(ModifierKey::Control),
                "app_2",
            ),
        ];

        store.save(&bindings).unwrap();

        assert_eq!(store.load().unwrap(), bindings);
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_malformed() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ nope").unwrap();

        assert!(matches!(store.load(), Err(ShortcutError::MalformedData(_))));
    }
}
