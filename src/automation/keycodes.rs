//! Android keycodes used by the suite
//!
//! Date pickers on Android expose a digit keypad; typing into them goes
//! through raw keycodes instead of text input.

use crate::common::{Error, Result};

pub const KEYCODE_BACK: u32 = 4;
pub const KEYCODE_ENTER: u32 = 66;

/// `0`-`9` map to KEYCODE_0..KEYCODE_9, `/` to KEYCODE_SLASH
const KEYPAD: [(char, u32); 11] = [
    ('0', 7),
    ('1', 8),
    ('2', 9),
    ('3', 10),
    ('4', 11),
    ('5', 12),
    ('6', 13),
    ('7', 14),
    ('8', 15),
    ('9', 16),
    ('/', 76),
];

/// Keycode for a single keypad character
pub fn keycode_for(c: char) -> Option<u32> {
    KEYPAD.iter().find(|(k, _)| *k == c).map(|(_, code)| *code)
}

/// Map a digit/slash string to keycodes, failing on the first character
/// without one
pub fn to_keycodes(value: &str) -> Result<Vec<u32>> {
    value
        .chars()
        .map(|c| {
            keycode_for(c).ok_or_else(|| Error::UnmappableKeycode {
                value: value.to_string(),
                character: c,
            })
        })
        .collect()
}
