// Tests for CGEventTap event conversion
// Tap creation itself needs Accessibility permission and is not exercised here

use super::*;
use crate::keyboard_capture::modifiers::{CG_EVENT_FLAG_MASK_ALTERNATE, CG_EVENT_FLAG_MASK_COMMAND};
use crate::keyboard_capture::{KeyEvent, ModifierKey, ModifierSet};

#[test]
fn test_flags_changed_becomes_modifier_event() {
    let event = convert_event(12, 58, CG_EVENT_FLAG_MASK_ALTERNATE);
    assert_eq!(
        event,
        Some(KeyEvent::ModifierChanged {
            modifiers: ModifierSet::only(ModifierKey::Option)
        })
    );
}

#[test]
fn test_key_down_carries_code_and_modifiers() {
    let event = convert_event(10, 20, CG_EVENT_FLAG_MASK_ALTERNATE | CG_EVENT_FLAG_MASK_COMMAND);
    assert_eq!(
        event,
        Some(KeyEvent::KeyDown {
            key_code: 20,
            modifiers: ModifierSet::only(ModifierKey::Option).with(ModifierKey::Command),
        })
    );
}

#[test]
fn test_key_up_is_ignored() {
    assert_eq!(convert_event(11, 20, 0), None);
}

#[test]
fn test_release_reports_empty_set() {
    assert_eq!(
        convert_event(12, 58, 0x100),
        Some(KeyEvent::ModifierChanged {
            modifiers: ModifierSet::empty()
        })
    );
}

#[test]
fn test_event_masks() {
    assert_eq!(mask_for(12), 0x1000);
    assert_eq!(mask_for(10), 0x400);
}
