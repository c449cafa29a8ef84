//! The compiled-in keystroke script.
//!
//! A script is a flat byte sequence of `(modifier, keycode, hold_ticks)` triples. It is a
//! build-time constant: the firmware only ever reads it.

use crate::keys;

/// Bytes per script entry
pub const ENTRY_LEN: usize = 3;

/// One keystroke of the script.
///
/// `hold_ticks == 0` means "no extra wait": the next entry plays as soon as the link layer
/// takes another report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScriptEntry {
    pub modifier: u8,
    pub keycode: u8,
    pub hold_ticks: u8,
}

impl ScriptEntry {
    pub const fn new(modifier: u8, keycode: u8, hold_ticks: u8) -> Self {
        ScriptEntry {
            modifier,
            keycode,
            hold_ticks,
        }
    }

    pub const fn to_bytes(self) -> [u8; ENTRY_LEN] {
        [self.modifier, self.keycode, self.hold_ticks]
    }
}

/// Read-only view over the script bytes
#[derive(Clone, Copy, Debug)]
pub struct Script<'a> {
    bytes: &'a [u8],
}

impl<'a> Script<'a> {
    /// Wrap a byte sequence. Used in a `const` this rejects truncated scripts at build time.
    pub const fn new(bytes: &'a [u8]) -> Self {
        assert!(
            bytes.len() % ENTRY_LEN == 0,
            "script length must be a multiple of 3"
        );
        Script { bytes }
    }

    /// Length in bytes (three per entry)
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub const fn n_entries(&self) -> usize {
        self.bytes.len() / ENTRY_LEN
    }

    /// The entry starting at byte `offset`, if there is a whole one there
    pub fn entry_at(&self, offset: usize) -> Option<ScriptEntry> {
        match self.bytes.get(offset..offset + ENTRY_LEN) {
            Some(&[modifier, keycode, hold_ticks]) => {
                Some(ScriptEntry::new(modifier, keycode, hold_ticks))
            }
            _ => None,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = ScriptEntry> + 'a {
        self.bytes
            .chunks_exact(ENTRY_LEN)
            .map(|e| ScriptEntry::new(e[0], e[1], e[2]))
    }
}

/// Flatten `(modifier, keycode, hold_ticks)` triples into script bytes.
///
/// ```
/// use keyscript::keys::*;
/// const OPEN_RUN: [u8; 6] = keyscript::script![(MOD_GUI, R, 20), (MOD_NONE, NONE, 0)];
/// assert_eq!(OPEN_RUN, [MOD_GUI, R, 20, 0, 0, 0]);
/// ```
#[macro_export]
macro_rules! script {
    ($( ($modifier:expr, $keycode:expr, $hold:expr) ),* $(,)?) => {
        [ $( $modifier, $keycode, $hold ),* ]
    };
}

/// Script bytes typing `text` (US layout), one entry per char and no holds.
///
/// `M` must be three times the text length; the mismatch fails the const evaluation.
pub const fn typed<const N: usize, const M: usize>(text: &[u8; N]) -> [u8; M] {
    assert!(M == N * ENTRY_LEN, "typed text needs three bytes per char");

    let mut out = [0u8; M];
    let mut ix = 0;
    while ix < N {
        let (modifier, keycode) = keys::ascii(text[ix]);
        out[ix * ENTRY_LEN] = modifier;
        out[ix * ENTRY_LEN + 1] = keycode;
        ix += 1;
    }
    out
}

/// Concatenate two script fragments at compile time (`C == A + B`).
pub const fn join<const A: usize, const B: usize, const C: usize>(
    a: &[u8; A],
    b: &[u8; B],
) -> [u8; C] {
    assert!(C == A + B, "joined script has the wrong length");

    let mut out = [0u8; C];
    let mut ix = 0;
    while ix < A {
        out[ix] = a[ix];
        ix += 1;
    }
    while ix < C {
        out[ix] = b[ix - A];
        ix += 1;
    }
    out
}
