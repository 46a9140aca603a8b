use super::*;
use crate::keyboard_capture::keycodes::{self, FUNCTION_CODES, LETTER_CODES};

fn option() -> ModifierSet {
    ModifierSet::only(ModifierKey::Option)
}

fn resolver() -> KeyCodeResolver {
    KeyCodeResolver::macos()
}

#[test]
fn test_digit_codes_map_to_first_nine_slots() {
    let r = resolver();
    for code in 18..=26u16 {
        assert_eq!(
            r.resolve(code, option(), true),
            ResolvedEvent::SetSelection(KeySlot(code as usize - 18)),
            "code {}",
            code
        );
    }
}

#[test]
fn test_letters_map_alphabetically() {
    let r = resolver();
    assert_eq!(r.resolve(keycodes::KEY_A, option(), true), ResolvedEvent::SetSelection(KeySlot(9)));
    assert_eq!(r.resolve(keycodes::KEY_B, option(), true), ResolvedEvent::SetSelection(KeySlot(10)));
    assert_eq!(r.resolve(keycodes::KEY_Z, option(), true), ResolvedEvent::SetSelection(KeySlot(34)));
}

#[test]
fn test_code_seven_is_the_letter_x() {
    assert_eq!(
        resolver().resolve(7, option(), true),
        ResolvedEvent::SetSelection(KeySlot(32))
    );
}

#[test]
fn test_function_keys_map_to_last_block() {
    let r = resolver();
    assert_eq!(r.resolve(122, option(), true), ResolvedEvent::SetSelection(KeySlot(35)));
    assert_eq!(r.resolve(111, option(), true), ResolvedEvent::SetSelection(KeySlot(46)));
}

#[test]
fn test_every_slot_reached_exactly_once() {
    let table = StaticKeyCodeTable::macos();
    let mut hits = vec![0usize; SLOT_COUNT];
    for code in 0..=200u16 {
        if let Some(slot) = table.slot_for(code) {
            hits[slot.index()] += 1;
        }
    }
    assert!(hits.iter().all(|&n| n == 1), "slot coverage: {:?}", hits);
}

#[test]
fn test_macos_table_passes_validation() {
    let digits: Vec<KeyCode> = (18..=26).collect();
    let table = StaticKeyCodeTable::new(
        &digits,
        &LETTER_CODES,
        &FUNCTION_CODES,
        StaticKeyCodeTable::macos_controls(),
    );
    assert!(table.is_ok());
}

#[test]
fn test_controls_win_regardless_of_trigger() {
    let r = resolver();
    for held in [true, false] {
        assert_eq!(r.resolve(53, option(), held), ResolvedEvent::Control(ControlAction::Escape));
        assert_eq!(r.resolve(48, option(), held), ResolvedEvent::Control(ControlAction::Tab));
        assert_eq!(r.resolve(123, ModifierSet::empty(), held), ResolvedEvent::Control(ControlAction::LeftArrow));
        assert_eq!(r.resolve(124, ModifierSet::empty(), held), ResolvedEvent::Control(ControlAction::RightArrow));
    }
}

#[test]
fn test_settings_and_quit_need_control_modifier() {
    let r = resolver();
    let cmd = ModifierSet::only(ModifierKey::Command);

    assert_eq!(r.resolve(keycodes::KEY_COMMA, cmd, false), ResolvedEvent::Control(ControlAction::Settings));
    assert_eq!(r.resolve(keycodes::KEY_Q, cmd, false), ResolvedEvent::Control(ControlAction::Quit));
    assert_eq!(
        r.resolve(keycodes::KEY_Q, cmd.with(ModifierKey::Option), true),
        ResolvedEvent::Control(ControlAction::Quit)
    );

    // Without the control modifier, Q is just a letter slot
    assert_eq!(r.resolve(keycodes::KEY_Q, option(), true), ResolvedEvent::SetSelection(KeySlot(25)));
    assert_eq!(r.resolve(keycodes::KEY_COMMA, option(), true), ResolvedEvent::Unhandled);
}

#[test]
fn test_slots_dropped_without_trigger() {
    let r = resolver();
    assert_eq!(r.resolve(20, ModifierSet::empty(), false), ResolvedEvent::Dropped);
    assert_eq!(r.resolve(999, ModifierSet::empty(), false), ResolvedEvent::Dropped);
}

#[test]
fn test_unknown_code_with_trigger_is_unhandled() {
    assert_eq!(resolver().resolve(36, option(), true), ResolvedEvent::Unhandled);
}

#[test]
fn test_synthetic_table() {
    let digits: Vec<KeyCode> = (1000..1009).collect();
    let letters: Vec<KeyCode> = (2000..2026).collect();
    let functions: Vec<KeyCode> = (3000..3012).collect();
    let controls = ControlCodes {
        escape: 1,
        tab: 2,
        left: 3,
        right: 4,
        settings: 5,
        quit: 6,
    };
    let table = StaticKeyCodeTable::new(&digits, &letters, &functions, controls).unwrap();
    let r = KeyCodeResolver::new(Arc::new(table), ModifierKey::Control);

    assert_eq!(r.resolve(1004, option(), true), ResolvedEvent::SetSelection(KeySlot(4)));
    assert_eq!(r.resolve(3011, option(), true), ResolvedEvent::SetSelection(KeySlot(46)));
    assert_eq!(r.resolve(1, option(), false), ResolvedEvent::Control(ControlAction::Escape));
    assert_eq!(
        r.resolve(6, ModifierSet::only(ModifierKey::Control), false),
        ResolvedEvent::Control(ControlAction::Quit)
    );
}

#[test]
fn test_table_rejects_overlaps() {
    let digits: Vec<KeyCode> = (18..=26).collect();
    let mut letters = LETTER_CODES;
    letters[0] = 18;
    assert_eq!(
        StaticKeyCodeTable::new(&digits, &letters, &FUNCTION_CODES, StaticKeyCodeTable::macos_controls())
            .unwrap_err(),
        KeyTableError::DuplicateCode(18)
    );

    let mut controls = StaticKeyCodeTable::macos_controls();
    controls.tab = 18;
    assert_eq!(
        StaticKeyCodeTable::new(&digits, &LETTER_CODES, &FUNCTION_CODES, controls).unwrap_err(),
        KeyTableError::ControlOverlapsSlot(18)
    );
}

#[test]
fn test_table_rejects_wrong_block_length() {
    let digits: Vec<KeyCode> = (18..=25).collect();
    let err = StaticKeyCodeTable::new(&digits, &LETTER_CODES, &FUNCTION_CODES, StaticKeyCodeTable::macos_controls())
        .unwrap_err();
    assert!(matches!(err, KeyTableError::WrongLength { class: "digit", expected: 9, actual: 8 }));
}

#[test]
fn test_slot_classes_and_labels() {
    assert_eq!(KeySlot(0).class(), Some(SlotClass::Digit));
    assert_eq!(KeySlot(9).class(), Some(SlotClass::Letter));
    assert_eq!(KeySlot(46).class(), Some(SlotClass::Function));
    assert_eq!(KeySlot(47).class(), None);

    assert_eq!(KeySlot(2).label().as_deref(), Some("3"));
    assert_eq!(KeySlot(32).label().as_deref(), Some("X"));
    assert_eq!(KeySlot(35).label().as_deref(), Some("F1"));
}
