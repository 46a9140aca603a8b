// Key-code resolution
// Maps raw key codes (plus the held modifiers and trigger state) to the logical events the
// overlay understands: a selection slot or a named control action.

pub mod table;

pub use table::{ControlCodes, KeyCodeTable, KeyTableError, StaticKeyCodeTable};

use crate::keyboard_capture::{KeyCode, ModifierKey, ModifierSet};
use serde::Serialize;
use std::ops::Range;
use std::sync::Arc;

/// Slots reached by the digit keys 1-9
pub const DIGIT_SLOTS: Range<usize> = 0..9;
/// Slots reached by the letter keys A-Z
pub const LETTER_SLOTS: Range<usize> = 9..35;
/// Slots reached by the function keys F1-F12
pub const FUNCTION_SLOTS: Range<usize> = 35..47;
/// Total number of addressable slots
pub const SLOT_COUNT: usize = FUNCTION_SLOTS.end;

/// Class of key a slot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotClass {
    Digit,
    Letter,
    Function,
}

/// Dense logical selection index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct KeySlot(pub usize);

impl KeySlot {
    pub fn index(self) -> usize {
        self.0
    }

    pub fn class(self) -> Option<SlotClass> {
        if DIGIT_SLOTS.contains(&self.0) {
            Some(SlotClass::Digit)
        } else if LETTER_SLOTS.contains(&self.0) {
            Some(SlotClass::Letter)
        } else if FUNCTION_SLOTS.contains(&self.0) {
            Some(SlotClass::Function)
        } else {
            None
        }
    }

    /// Label of the key that reaches this slot ("1", "A", "F3")
    pub fn label(self) -> Option<String> {
        match self.class()? {
            SlotClass::Digit => Some((self.0 + 1).to_string()),
            SlotClass::Letter => Some(((b'A' + (self.0 - LETTER_SLOTS.start) as u8) as char).to_string()),
            SlotClass::Function => Some(format!("F{}", self.0 - FUNCTION_SLOTS.start + 1)),
        }
    }
}

/// Named non-selection actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlAction {
    Settings,
    Quit,
    Escape,
    Tab,
    LeftArrow,
    RightArrow,
}

/// Outcome of resolving one key-down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedEvent {
    Control(ControlAction),
    SetSelection(KeySlot),
    /// Trigger held but the code reaches no slot
    Unhandled,
    /// Trigger not held and no control matched
    Dropped,
}

/// Stateless resolver over an injectable key-code table
#[derive(Clone)]
pub struct KeyCodeResolver {
    table: Arc<dyn KeyCodeTable>,
    control_modifier: ModifierKey,
}

impl KeyCodeResolver {
    pub fn new(table: Arc<dyn KeyCodeTable>, control_modifier: ModifierKey) -> Self {
        Self {
            table,
            control_modifier,
        }
    }

    /// Resolver over the macOS table with Command as the control modifier
    pub fn macos() -> Self {
        Self::new(Arc::new(StaticKeyCodeTable::macos()), ModifierKey::Command)
    }

    pub fn control_modifier(&self) -> ModifierKey {
        self.control_modifier
    }

    /// Resolve a key-down
    ///
    /// Controls are checked first, in priority order, regardless of the trigger.
    /// Everything else requires the trigger to be held.
    pub fn resolve(&self, key_code: KeyCode, modifiers: ModifierSet, trigger_held: bool) -> ResolvedEvent {
        let controls = self.table.controls();
        let combo = modifiers.contains(self.control_modifier);

        if combo && key_code == controls.settings {
            return ResolvedEvent::Control(ControlAction::Settings);
        }
        if combo && key_code == controls.quit {
            return ResolvedEvent::Control(ControlAction::Quit);
        }
        if key_code == controls.escape {
            return ResolvedEvent::Control(ControlAction::Escape);
        }
        if key_code == controls.tab {
            return ResolvedEvent::Control(ControlAction::Tab);
        }
        if key_code == controls.left {
            return ResolvedEvent::Control(ControlAction::LeftArrow);
        }
        if key_code == controls.right {
            return ResolvedEvent::Control(ControlAction::RightArrow);
        }

        if !trigger_held {
            return ResolvedEvent::Dropped;
        }

        match self.table.slot_for(key_code) {
            Some(slot) => ResolvedEvent::SetSelection(slot),
            None => ResolvedEvent::Unhandled,
        }
    }
}

impl Default for KeyCodeResolver {
    fn default() -> Self {
        Self::macos()
    }
}

impl std::fmt::Debug for KeyCodeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyCodeResolver")
            .field("controls", self.table.controls())
            .field("control_modifier", &self.control_modifier)
            .finish()
    }
}

#[cfg(test)]
#[path = "keymap_test.rs"]
mod tests;
