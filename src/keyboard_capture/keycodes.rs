//! macOS virtual key codes.
//!
//! The engine's canonical key-code space is the macOS one (`kVK_*`). Other
//! backends translate into it before events reach the dispatcher.

/// Raw platform key code
pub type KeyCode = u16;

pub const KEY_A: KeyCode = 0;
pub const KEY_S: KeyCode = 1;
pub const KEY_D: KeyCode = 2;
pub const KEY_F: KeyCode = 3;
pub const KEY_H: KeyCode = 4;
pub const KEY_G: KeyCode = 5;
pub const KEY_Z: KeyCode = 6;
pub const KEY_X: KeyCode = 7;
pub const KEY_C: KeyCode = 8;
pub const KEY_V: KeyCode = 9;
pub const KEY_B: KeyCode = 11;
pub const KEY_Q: KeyCode = 12;
pub const KEY_W: KeyCode = 13;
pub const KEY_E: KeyCode = 14;
pub const KEY_R: KeyCode = 15;
pub const KEY_Y: KeyCode = 16;
pub const KEY_T: KeyCode = 17;
pub const KEY_O: KeyCode = 31;
pub const KEY_U: KeyCode = 32;
pub const KEY_I: KeyCode = 34;
pub const KEY_P: KeyCode = 35;
pub const KEY_L: KeyCode = 37;
pub const KEY_J: KeyCode = 38;
pub const KEY_K: KeyCode = 40;
pub const KEY_N: KeyCode = 45;
pub const KEY_M: KeyCode = 46;

/// First and last codes of the top-row digit block
pub const DIGIT_FIRST: KeyCode = 18;
pub const DIGIT_LAST: KeyCode = 26;

pub const KEY_3: KeyCode = 20;
pub const KEY_4: KeyCode = 21;
pub const KEY_5: KeyCode = 23;

pub const KEY_COMMA: KeyCode = 43;
pub const KEY_GRAVE: KeyCode = 50;

pub const KEY_TAB: KeyCode = 48;
pub const KEY_SPACE: KeyCode = 49;
pub const KEY_ESCAPE: KeyCode = 53;

pub const KEY_LEFT: KeyCode = 123;
pub const KEY_RIGHT: KeyCode = 124;
pub const KEY_DOWN: KeyCode = 125;
pub const KEY_UP: KeyCode = 126;

/// Letter key codes in alphabetical order (A..Z)
pub const LETTER_CODES: [KeyCode; 26] = [
    KEY_A, KEY_B, KEY_C, KEY_D, KEY_E, KEY_F, KEY_G, KEY_H, KEY_I, KEY_J, KEY_K, KEY_L, KEY_M,
    KEY_N, KEY_O, KEY_P, KEY_Q, KEY_R, KEY_S, KEY_T, KEY_U, KEY_V, KEY_W, KEY_X, KEY_Y, KEY_Z,
];

/// Function key codes in order (F1..F12)
pub const FUNCTION_CODES: [KeyCode; 12] = [122, 120, 99, 118, 96, 97, 98, 100, 101, 109, 103, 111];

/// Convert a macOS key code to a human-readable key name
pub fn keycode_to_name(key_code: KeyCode) -> String {
    if let Some(i) = LETTER_CODES.iter().position(|&c| c == key_code) {
        return ((b'A' + i as u8) as char).to_string();
    }
    if let Some(i) = FUNCTION_CODES.iter().position(|&c| c == key_code) {
        return format!("F{}", i + 1);
    }

    match key_code {
        // Numbers (top row)
        18 => "1".to_string(),
        19 => "2".to_string(),
        20 => "3".to_string(),
        21 => "4".to_string(),
        22 => "6".to_string(),
        23 => "5".to_string(),
        24 => "=".to_string(),
        25 => "9".to_string(),
        26 => "7".to_string(),
        27 => "-".to_string(),
        28 => "8".to_string(),
        29 => "0".to_string(),

        // Punctuation and symbols
        30 => "]".to_string(),
        33 => "[".to_string(),
        39 => "'".to_string(),
        41 => ";".to_string(),
        42 => "\\".to_string(),
        43 => ",".to_string(),
        44 => "/".to_string(),
        47 => ".".to_string(),
        50 => "`".to_string(),

        // Special keys
        36 => "Enter".to_string(),
        48 => "Tab".to_string(),
        49 => "Space".to_string(),
        51 => "Backspace".to_string(),
        53 => "Escape".to_string(),

        // Modifier keys
        54 | 55 => "Command".to_string(),
        56 | 60 => "Shift".to_string(),
        57 => "CapsLock".to_string(),
        58 | 61 => "Option".to_string(),
        59 | 62 => "Control".to_string(),

        // Navigation keys
        123 => "Left".to_string(),
        124 => "Right".to_string(),
        125 => "Down".to_string(),
        126 => "Up".to_string(),

        _ => format!("Key({})", key_code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_names() {
        assert_eq!(keycode_to_name(KEY_A), "A");
        assert_eq!(keycode_to_name(KEY_X), "X");
        assert_eq!(keycode_to_name(KEY_Q), "Q");
    }

    #[test]
    fn test_function_key_names() {
        assert_eq!(keycode_to_name(122), "F1");
        assert_eq!(keycode_to_name(111), "F12");
    }

    #[test]
    fn test_special_and_unknown() {
        assert_eq!(keycode_to_name(KEY_ESCAPE), "Escape");
        assert_eq!(keycode_to_name(KEY_TAB), "Tab");
        assert_eq!(keycode_to_name(999), "Key(999)");
    }

    #[test]
    fn test_letter_codes_are_disjoint_from_digit_block() {
        assert!(LETTER_CODES
            .iter()
            .all(|c| !(DIGIT_FIRST..=DIGIT_LAST).contains(c)));
    }
}
