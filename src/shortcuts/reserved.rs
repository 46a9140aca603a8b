//! OS-level combinations that can never be bound.

use crate::keyboard_capture::keycodes::{self, KeyCode};
use crate::keyboard_capture::{ModifierKey, ModifierSet};

use crate::keyboard_capture::ModifierKey::{Command, Control, Option as Opt, Shift};

/// Reserved combinations (macOS)
///
/// Matching is on the exact modifier set, so Cmd+Shift+H is not blocked by Cmd+H.
const RESERVED: &[(KeyCode, &[ModifierKey])] = &[
    (keycodes::KEY_TAB, &[Command]),
    (keycodes::KEY_TAB, &[Command, Shift]),
    (keycodes::KEY_SPACE, &[Command]),
    (keycodes::KEY_SPACE, &[Control]),
    (keycodes::KEY_ESCAPE, &[Command, Opt]),
    (keycodes::KEY_3, &[Command, Shift]),
    (keycodes::KEY_4, &[Command, Shift]),
    (keycodes::KEY_5, &[Command, Shift]),
    (keycodes::KEY_Q, &[Control, Command]),
    (keycodes::KEY_GRAVE, &[Command]),
    (keycodes::KEY_D, &[Command, Opt]),
    (keycodes::KEY_UP, &[Control]),
    (keycodes::KEY_DOWN, &[Control]),
    (keycodes::KEY_LEFT, &[Control]),
    (keycodes::KEY_RIGHT, &[Control]),
    (keycodes::KEY_H, &[Command]),
    (keycodes::KEY_M, &[Command]),
];

/// Whether the combination is reserved by the system
pub fn is_reserved(key_code: KeyCode, modifiers: ModifierSet) -> bool {
    RESERVED.iter().any(|(code, mods)| {
        *code == key_code && mods.iter().copied().collect::<ModifierSet>() == modifiers
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(keys: &[ModifierKey]) -> ModifierSet {
        keys.iter().copied().collect()
    }

    #[test]
    fn test_app_switcher_and_spotlight_are_reserved() {
        assert!(is_reserved(keycodes::KEY_TAB, set(&[Command])));
        assert!(is_reserved(keycodes::KEY_TAB, set(&[Shift, Command])));
        assert!(is_reserved(keycodes::KEY_SPACE, set(&[Command])));
    }

    #[test]
    fn test_screenshots_are_reserved() {
        for code in [keycodes::KEY_3, keycodes::KEY_4, keycodes::KEY_5] {
            assert!(is_reserved(code, set(&[Command, Shift])));
        }
    }

    #[test]
    fn test_match_requires_exact_modifier_set() {
        assert!(is_reserved(keycodes::KEY_H, set(&[Command])));
        assert!(!is_reserved(keycodes::KEY_H, set(&[Command, Shift])));
        assert!(!is_reserved(keycodes::KEY_TAB, set(&[Opt])));
    }

    #[test]
    fn test_typical_switch_bindings_are_allowed() {
        assert!(!is_reserved(18, set(&[Opt])));
        assert!(!is_reserved(18, set(&[Control, Opt])));
    }
}
