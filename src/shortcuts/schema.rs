//! Versioned export/import document.

use super::{ShortcutBinding, ShortcutError};
use serde::{Deserialize, Serialize};

/// Current document version
pub const SCHEMA_VERSION: u32 = 1;

/// `{ "version": 1, "bindings": [...] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutDocument {
    pub version: u32,
    pub bindings: Vec<ShortcutBinding>,
}

impl ShortcutDocument {
    pub fn new(bindings: Vec<ShortcutBinding>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            bindings,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ShortcutError> {
        serde_json::to_vec_pretty(self).map_err(|e| ShortcutError::Persistence(e.to_string()))
    }

    /// Decode and check the version. Binding contents are validated by the registry.
    pub fn decode(data: &[u8]) -> Result<Self, ShortcutError> {
        let document: ShortcutDocument =
            serde_json::from_slice(data).map_err(|e| ShortcutError::MalformedData(e.to_string()))?;
        if document.version != SCHEMA_VERSION {
            return Err(ShortcutError::MalformedData(format!(
                "Unsupported schema version {} (expected {})",
                document.version, SCHEMA_VERSION
            )));
        }
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard_capture::{ModifierKey, ModifierSet};

    #[test]
    fn test_document_shape() {
        let document = ShortcutDocument::new(vec![ShortcutBinding::new(
            18,
            ModifierSet::only(ModifierKey::Option),
            "app_1",
        )]);
        let value: serde_json::Value = serde_json::from_slice(&document.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "version": 1,
                "bindings": [{ "keyCode": 18, "modifiers": ["option"], "identifier": "app_1" }]
            })
        );
    }

    #[test]
    fn test_decode_rejects_other_versions() {
        let err = ShortcutDocument::decode(br#"{"version":2,"bindings":[]}"#).unwrap_err();
        assert!(matches!(err, ShortcutError::MalformedData(_)));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let cases: [&[u8]; 3] = [
            b"not json",
            br#"{"bindings":[]}"#,
            br#"{"version":1,"bindings":[{"keyCode":"x"}]}"#,
        ];
        for data in cases {
            assert!(matches!(
                ShortcutDocument::decode(data),
                Err(ShortcutError::MalformedData(_))
            ));
        }
    }

    #[test]
    fn test_decode_rejects_unknown_modifier() {
        let data = br#"{"version":1,"bindings":[{"keyCode":18,"modifiers":["hyper"],"identifier":"a"}]}"#;
        assert!(matches!(
            ShortcutDocument::decode(data),
            Err(ShortcutError::MalformedData(_))
        ));
    }
}
