//! Modifier keys and modifier sets.
//!
//! Provides the `ModifierKey`/`ModifierSet` types used throughout the engine and
//! the CGEventFlags constants needed to build them from raw macOS flag words.

use serde::{Deserialize, Serialize};
use std::fmt;

// Standard modifier flags from CGEvent
pub const CG_EVENT_FLAG_MASK_SHIFT: u64 = 0x00020000;
pub const CG_EVENT_FLAG_MASK_CONTROL: u64 = 0x00040000;
pub const CG_EVENT_FLAG_MASK_ALTERNATE: u64 = 0x00080000;
pub const CG_EVENT_FLAG_MASK_COMMAND: u64 = 0x00100000;

/// A single modifier key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierKey {
    Option,
    Control,
    Command,
    Shift,
}

impl ModifierKey {
    /// All modifiers in canonical order
    pub const ALL: [ModifierKey; 4] = [
        ModifierKey::Option,
        ModifierKey::Control,
        ModifierKey::Command,
        ModifierKey::Shift,
    ];

    fn bit(self) -> u8 {
        match self {
            ModifierKey::Option => 0b0001,
            ModifierKey::Control => 0b0010,
            ModifierKey::Command => 0b0100,
            ModifierKey::Shift => 0b1000,
        }
    }

    /// Lowercase name used in persisted settings
    pub fn as_str(self) -> &'static str {
        match self {
            ModifierKey::Option => "option",
            ModifierKey::Control => "control",
            ModifierKey::Command => "command",
            ModifierKey::Shift => "shift",
        }
    }
}

impl Default for ModifierKey {
    fn default() -> Self {
        Self::Option
    }
}

impl fmt::Display for ModifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModifierKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "option" | "opt" | "alt" => Ok(ModifierKey::Option),
            "control" | "ctrl" => Ok(ModifierKey::Control),
            "command" | "cmd" => Ok(ModifierKey::Command),
            "shift" => Ok(ModifierKey::Shift),
            other => Err(format!("Unknown modifier: {}", other)),
        }
    }
}

/// Set of currently held (or required) modifier keys
///
/// Serializes as a list of lowercase names in canonical order, so two equal
/// sets always produce the same document.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ModifierKey>", into = "Vec<ModifierKey>")]
pub struct ModifierSet(u8);

impl ModifierSet {
    /// The empty set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Set containing exactly one modifier
    pub fn only(key: ModifierKey) -> Self {
        Self(key.bit())
    }

    pub fn contains(&self, key: ModifierKey) -> bool {
        self.0 & key.bit() != 0
    }

    pub fn insert(&mut self, key: ModifierKey) {
        self.0 |= key.bit();
    }

    pub fn remove(&mut self, key: ModifierKey) {
        self.0 &= !key.bit();
    }

    /// Builder-style insert
    pub fn with(mut self, key: ModifierKey) -> Self {
        self.insert(key);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate the held modifiers in canonical order
    pub fn iter(&self) -> impl Iterator<Item = ModifierKey> + '_ {
        ModifierKey::ALL.into_iter().filter(move |k| self.contains(*k))
    }

    /// Extract the modifier set from raw CGEventFlags bits
    pub fn from_cg_flags(flags_raw: u64) -> Self {
        let mut set = Self::empty();
        if flags_raw & CG_EVENT_FLAG_MASK_ALTERNATE != 0 {
            set.insert(ModifierKey::Option);
        }
        if flags_raw & CG_EVENT_FLAG_MASK_CONTROL != 0 {
            set.insert(ModifierKey::Control);
        }
        if flags_raw & CG_EVENT_FLAG_MASK_COMMAND != 0 {
            set.insert(ModifierKey::Command);
        }
        if flags_raw & CG_EVENT_FLAG_MASK_SHIFT != 0 {
            set.insert(ModifierKey::Shift);
        }
        set
    }
}

impl From<Vec<ModifierKey>> for ModifierSet {
    fn from(keys: Vec<ModifierKey>) -> Self {
        keys.into_iter().collect()
    }
}

impl From<ModifierSet> for Vec<ModifierKey> {
    fn from(set: ModifierSet) -> Self {
        set.iter().collect()
    }
}

impl FromIterator<ModifierKey> for ModifierSet {
    fn from_iter<I: IntoIterator<Item = ModifierKey>>(iter: I) -> Self {
        let mut set = Self::empty();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

impl fmt::Debug for ModifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for ModifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(ModifierKey::as_str).collect();
        f.write_str(&names.join("+"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cg_flags_option_only() {
        let set = ModifierSet::from_cg_flags(CG_EVENT_FLAG_MASK_ALTERNATE | 0x20);
        assert!(set.contains(ModifierKey::Option));
        assert!(!set.contains(ModifierKey::Command));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_from_cg_flags_combination() {
        let set = ModifierSet::from_cg_flags(CG_EVENT_FLAG_MASK_COMMAND | CG_EVENT_FLAG_MASK_SHIFT);
        assert_eq!(
            set,
            ModifierSet::only(ModifierKey::Command).with(ModifierKey::Shift)
        );
    }

    #[test]
    fn test_from_cg_flags_ignores_device_bits() {
        // Left/right device bits alone carry no logical modifier
        assert!(ModifierSet::from_cg_flags(0x0000_0008 | 0x0000_0002).is_empty());
    }

    #[test]
    fn test_insert_remove() {
        let mut set = ModifierSet::empty();
        set.insert(ModifierKey::Control);
        set.insert(ModifierKey::Control);
        assert_eq!(set.len(), 1);
        set.remove(ModifierKey::Control);
        assert!(set.is_empty());
    }

    #[test]
    fn test_serializes_in_canonical_order() {
        let set: ModifierSet = vec![ModifierKey::Shift, ModifierKey::Option].into();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["option","shift"]"#);

        let parsed: ModifierSet = serde_json::from_str(r#"["shift","option","shift"]"#).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn test_modifier_key_from_str_aliases() {
        assert_eq!("Alt".parse::<ModifierKey>(), Ok(ModifierKey::Option));
        assert_eq!("cmd".parse::<ModifierKey>(), Ok(ModifierKey::Command));
        assert_eq!("ctrl".parse::<ModifierKey>(), Ok(ModifierKey::Control));
        assert!("hyper".parse::<ModifierKey>().is_err());
    }

    #[test]
    fn test_display() {
        let set = ModifierSet::only(ModifierKey::Command).with(ModifierKey::Option);
        assert_eq!(set.to_string(), "option+command");
    }
}
