//! HID usages (US layout) used to author scripts.
//!
//! Keycodes are from the HID "Keyboard/Keypad" usage page, modifiers are the bits of the
//! first report byte. Only usages inside the descriptor's logical range (0..=101) can be
//! reported.

// Modifier bits
pub const MOD_NONE: u8 = 0x00;
pub const MOD_CTRL: u8 = 0x01;
pub const MOD_SHIFT: u8 = 0x02;
pub const MOD_ALT: u8 = 0x04;
pub const MOD_GUI: u8 = 0x08;
pub const MOD_RIGHT_CTRL: u8 = 0x10;
pub const MOD_RIGHT_SHIFT: u8 = 0x20;
pub const MOD_RIGHT_ALT: u8 = 0x40;
pub const MOD_RIGHT_GUI: u8 = 0x80;

/// "No event indicated", i.e. no key down
pub const NONE: u8 = 0;

// Letters: 'a' is 4, 'z' is 29
pub const A: u8 = 4;
pub const B: u8 = 5;
pub const C: u8 = 6;
pub const D: u8 = 7;
pub const E: u8 = 8;
pub const F: u8 = 9;
pub const G: u8 = 10;
pub const H: u8 = 11;
pub const I: u8 = 12;
pub const J: u8 = 13;
pub const K: u8 = 14;
pub const L: u8 = 15;
pub const M: u8 = 16;
pub const N: u8 = 17;
pub const O: u8 = 18;
pub const P: u8 = 19;
pub const Q: u8 = 20;
pub const R: u8 = 21;
pub const S: u8 = 22;
pub const T: u8 = 23;
pub const U: u8 = 24;
pub const V: u8 = 25;
pub const W: u8 = 26;
pub const X: u8 = 27;
pub const Y: u8 = 28;
pub const Z: u8 = 29;

// Digits: '1' is 30, '0' is 39
pub const N1: u8 = 30;
pub const N2: u8 = 31;
pub const N3: u8 = 32;
pub const N4: u8 = 33;
pub const N5: u8 = 34;
pub const N6: u8 = 35;
pub const N7: u8 = 36;
pub const N8: u8 = 37;
pub const N9: u8 = 38;
pub const N0: u8 = 39;

pub const ENTER: u8 = 40;
pub const ESCAPE: u8 = 41;
pub const BACKSPACE: u8 = 42;
pub const TAB: u8 = 43;
pub const SPACE: u8 = 44;
pub const MINUS: u8 = 45;
pub const EQUAL: u8 = 46;
pub const SEMICOLON: u8 = 51;
pub const QUOTE: u8 = 52;
pub const COMMA: u8 = 54;
pub const PERIOD: u8 = 55;
pub const SLASH: u8 = 56;
pub const CAPS_LOCK: u8 = 57;

pub const F1: u8 = 58;
pub const F2: u8 = 59;
pub const F3: u8 = 60;
pub const F4: u8 = 61;
pub const F5: u8 = 62;
pub const F6: u8 = 63;
pub const F7: u8 = 64;
pub const F8: u8 = 65;
pub const F9: u8 = 66;
pub const F10: u8 = 67;
pub const F11: u8 = 68;
pub const F12: u8 = 69;

pub const PRINT_SCREEN: u8 = 70;
pub const SCROLL_LOCK: u8 = 71;
pub const PAUSE: u8 = 72;
pub const INSERT: u8 = 73;
pub const HOME: u8 = 74;
pub const PAGE_UP: u8 = 75;
pub const DELETE: u8 = 76;
pub const END: u8 = 77;
pub const PAGE_DOWN: u8 = 78;
pub const RIGHT: u8 = 79;
pub const LEFT: u8 = 80;
pub const DOWN: u8 = 81;
pub const UP: u8 = 82;

/// Highest usage the report descriptor allows ("Keyboard Application")
pub const APPLICATION: u8 = 101;

/// Map an ASCII char to a (modifier, keycode) pair.
///
/// NOTE: this assumes a US layout. Anything unknown maps to a question mark.
pub const fn ascii(chr: u8) -> (u8, u8) {
    match chr {
        b'a'..=b'z' => (MOD_NONE, chr - b'a' + A),
        b'A'..=b'Z' => (MOD_SHIFT, chr - b'A' + A),
        b'1'..=b'9' => (MOD_NONE, chr - b'1' + N1),
        b'0' => (MOD_NONE, N0),
        b'\n' => (MOD_NONE, ENTER),
        b'\t' => (MOD_NONE, TAB),
        b' ' => (MOD_NONE, SPACE),
        b'!' => (MOD_SHIFT, N1),
        b'-' => (MOD_NONE, MINUS),
        b'=' => (MOD_NONE, EQUAL),
        b';' => (MOD_NONE, SEMICOLON),
        b':' => (MOD_SHIFT, SEMICOLON),
        b'\'' => (MOD_NONE, QUOTE),
        b'"' => (MOD_SHIFT, QUOTE),
        b',' => (MOD_NONE, COMMA),
        b'.' => (MOD_NONE, PERIOD),
        b'>' => (MOD_SHIFT, PERIOD),
        b'/' => (MOD_NONE, SLASH),
        _ => (MOD_SHIFT, SLASH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_map_letters() {
        assert_eq!(ascii(b'a'), (MOD_NONE, A));
        assert_eq!(ascii(b'z'), (MOD_NONE, Z));
        assert_eq!(ascii(b'Q'), (MOD_SHIFT, Q));
    }

    #[test]
    fn can_map_digits_and_punctuation() {
        assert_eq!(ascii(b'1'), (MOD_NONE, N1));
        assert_eq!(ascii(b'0'), (MOD_NONE, N0));
        assert_eq!(ascii(b'!'), (MOD_SHIFT, N1));
        assert_eq!(ascii(b'\n'), (MOD_NONE, ENTER));
        assert_eq!(ascii(b'.'), (MOD_NONE, PERIOD));
    }

    #[test]
    fn unknown_chars_become_question_marks() {
        assert_eq!(ascii(b'~'), (MOD_SHIFT, SLASH));
        assert_eq!(ascii(0x7f), ascii(b'?'));
    }

    #[test]
    fn all_usages_fit_the_descriptor() {
        for chr in 0..=127u8 {
            let (_, keycode) = ascii(chr);
            assert!(keycode <= APPLICATION);
        }
    }
}
