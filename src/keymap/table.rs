//! Key-code tables.
//!
//! A table maps raw platform key codes onto the dense slot space and names the
//! codes of the control keys. Tables are validated when built so that every
//! code lands in at most one slot class and no plain control key doubles as a slot.

use crate::keyboard_capture::keycodes::{self, KeyCode};
use std::collections::{HashMap, HashSet};

use super::{KeySlot, DIGIT_SLOTS, FUNCTION_SLOTS, LETTER_SLOTS};

/// Key codes of the non-slot keys the resolver recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlCodes {
    pub escape: KeyCode,
    pub tab: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
    /// Combined with the control modifier to open settings
    pub settings: KeyCode,
    /// Combined with the control modifier to quit
    pub quit: KeyCode,
}

/// Injectable key-code table
pub trait KeyCodeTable: Send + Sync {
    /// Slot reached by this code, if any
    fn slot_for(&self, key_code: KeyCode) -> Option<KeySlot>;

    fn controls(&self) -> &ControlCodes;
}

/// Errors raised while building a table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyTableError {
    #[error("{class} block must have {expected} codes, got {actual}")]
    WrongLength {
        class: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Key code {0} is assigned to more than one slot")]
    DuplicateCode(KeyCode),
    #[error("Control key code {0} is also assigned to a slot")]
    ControlOverlapsSlot(KeyCode),
}

/// Table built from explicit per-class code lists
#[derive(Debug, Clone)]
pub struct StaticKeyCodeTable {
    slots: HashMap<KeyCode, KeySlot>,
    controls: ControlCodes,
}

impl StaticKeyCodeTable {
    /// Build a table from 9 digit codes, 26 letter codes and 12 function-key codes
    pub fn new(
        digits: &[KeyCode],
        letters: &[KeyCode],
        functions: &[KeyCode],
        controls: ControlCodes,
    ) -> Result<Self, KeyTableError> {
        let blocks = [
            ("digit", digits, DIGIT_SLOTS.len()),
            ("letter", letters, LETTER_SLOTS.len()),
            ("function", functions, FUNCTION_SLOTS.len()),
        ];
        for (class, codes, expected) in blocks {
            if codes.len() != expected {
                return Err(KeyTableError::WrongLength {
                    class,
                    expected,
                    actual: codes.len(),
                });
            }
        }

        let mut seen = HashSet::new();
        for &code in digits.iter().chain(letters).chain(functions) {
            if !seen.insert(code) {
                return Err(KeyTableError::DuplicateCode(code));
            }
        }

        // Settings/quit keys are combos and are told apart by modifier
        for code in [controls.escape, controls.tab, controls.left, controls.right] {
            if seen.contains(&code) {
                return Err(KeyTableError::ControlOverlapsSlot(code));
            }
        }

        Ok(Self::assemble(digits, letters, functions, controls))
    }

    fn assemble(
        digits: &[KeyCode],
        letters: &[KeyCode],
        functions: &[KeyCode],
        controls: ControlCodes,
    ) -> Self {
        let slots = [
            (DIGIT_SLOTS.start, digits),
            (LETTER_SLOTS.start, letters),
            (FUNCTION_SLOTS.start, functions),
        ]
        .into_iter()
        .flat_map(|(first, codes)| {
            codes
                .iter()
                .enumerate()
                .map(move |(offset, &code)| (code, KeySlot(first + offset)))
        })
        .collect();

        Self { slots, controls }
    }

    /// The macOS virtual key-code table
    pub fn macos() -> Self {
        let digits: Vec<KeyCode> = (keycodes::DIGIT_FIRST..=keycodes::DIGIT_LAST).collect();
        Self::assemble(
            &digits,
            &keycodes::LETTER_CODES,
            &keycodes::FUNCTION_CODES,
            Self::macos_controls(),
        )
    }

    pub fn macos_controls() -> ControlCodes {
        ControlCodes {
            escape: keycodes::KEY_ESCAPE,
            tab: keycodes::KEY_TAB,
            left: keycodes::KEY_LEFT,
            right: keycodes::KEY_RIGHT,
            settings: keycodes::KEY_COMMA,
            quit: keycodes::KEY_Q,
        }
    }
}

impl Default for StaticKeyCodeTable {
    fn default() -> Self {
        Self::macos()
    }
}

impl KeyCodeTable for StaticKeyCodeTable {
    fn slot_for(&self, key_code: KeyCode) -> Option<KeySlot> {
        self.slots.get(&key_code).copied()
    }

    fn controls(&self) -> &ControlCodes {
        &self.controls
    }
}
