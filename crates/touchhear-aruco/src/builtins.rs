//! Dictionaries compiled into the binary.

use crate::Dictionary;

/// Convert one OpenCV byte-list word (MSB = top-left bit, `1` = white) into
/// the packed black=1, LSB = top-left layout used by [`Dictionary`].
const fn from_opencv_word(word: u16) -> u64 {
    let mut code = 0u64;
    let mut i = 0;
    while i < 16 {
        if (word >> (15 - i)) & 1 == 0 {
            code |= 1 << i;
        }
        i += 1;
    }
    code
}

/// Leading ids of OpenCV's `DICT_4X4_50`.
///
/// Only the first ten symbols are embedded; the sheet uses ids 0..=3, and
/// codes of ids beyond the table are never reported.
static DICT_4X4_50_CODES: [u64; 10] = [
    from_opencv_word(0xB532),
    from_opencv_word(0x0F9A),
    from_opencv_word(0x332D),
    from_opencv_word(0x9946),
    from_opencv_word(0x54F5),
    from_opencv_word(0x79CD),
    from_opencv_word(0x9E2E),
    from_opencv_word(0xC4F2),
    from_opencv_word(0xFEDA),
    from_opencv_word(0xCF56),
];

pub const DICT_4X4_50: Dictionary = Dictionary {
    name: "DICT_4X4_50",
    marker_size: 4,
    max_correction_bits: 1,
    codes: &DICT_4X4_50_CODES,
};

/// Names of all embedded dictionaries.
pub const BUILTIN_DICTIONARY_NAMES: &[&str] = &["DICT_4X4_50"];

/// Look up a built-in dictionary by name.
pub fn builtin_dictionary(name: &str) -> Option<Dictionary> {
    match name {
        "DICT_4X4_50" => Some(DICT_4X4_50),
        _ => None,
    }
}
