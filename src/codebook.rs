/*! Morse codebook.

A static ordered table of element strings to text. Lookup is linear and
the first match wins, which is how the handful of code points shared
between punctuation and prosigns resolve.

Strings that match nothing decode to [`UNKNOWN`], so garbled characters
stay visible instead of silently disappearing. Long runs of identical
elements are almost always noise, not sending, and are deliberately
mapped to [`ERROR`].
*/

/// Visible marker for an element string with no table entry.
pub const UNKNOWN: &str = "*";

/// Visible marker for an implausible, noise-like element run.
pub const ERROR: &str = "#";

/// One immutable codebook mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MorseTableEntry {
    /// Element string, e.g. `".-."`.
    pub code: &'static str,
    /// Decoded text, e.g. `"R"`.
    pub text: &'static str,
}

const fn e(code: &'static str, text: &'static str) -> MorseTableEntry {
    MorseTableEntry { code, text }
}

/// The codebook, in lookup order.
pub static MORSE_TABLE: &[MorseTableEntry] = &[
    // Letters.
    e(".-", "A"),
    e("-...", "B"),
    e("-.-.", "C"),
    e("-..", "D"),
    e(".", "E"),
    e("..-.", "F"),
    e("--.", "G"),
    e("....", "H"),
    e("..", "I"),
    e(".---", "J"),
    e("-.-", "K"),
    e(".-..", "L"),
    e("--", "M"),
    e("-.", "N"),
    e("---", "O"),
    e(".--.", "P"),
    e("--.-", "Q"),
    e(".-.", "R"),
    e("...", "S"),
    e("-", "T"),
    e("..-", "U"),
    e("...-", "V"),
    e(".--", "W"),
    e("-..-", "X"),
    e("-.--", "Y"),
    e("--..", "Z"),
    // Digits.
    e("-----", "0"),
    e(".----", "1"),
    e("..---", "2"),
    e("...--", "3"),
    e("....-", "4"),
    e(".....", "5"),
    e("-....", "6"),
    e("--...", "7"),
    e("---..", "8"),
    e("----.", "9"),
    // Prosigns. Listed before punctuation so that shared code points
    // (e.g. AR / "+") decode as the prosign.
    e("...---...", "SOS"),
    e("...-.-", "<SK>"),
    e(".-.-.", "<AR>"),
    e("-...-", "<BT>"),
    e(".-...", "<AS>"),
    e("-.-.-", "<KA>"),
    e("...-.", "<SN>"),
    // Punctuation.
    e(".-.-.-", "."),
    e("--..--", ","),
    e("..--..", "?"),
    e(".----.", "'"),
    e("-.-.--", "!"),
    e("-..-.", "/"),
    e("-.--.", "("),
    e("-.--.-", ")"),
    e("---...", ":"),
    e("-.-.-.", ";"),
    e("-....-", "-"),
    e("..--.-", "_"),
    e(".-..-.", "\""),
    e("...-..-", "$"),
    e(".--.-.", "@"),
    // Noise-like runs of one element. A human fist does not send these.
    e("......", ERROR),
    e(".......", ERROR),
    e("........", ERROR),
    e("------", ERROR),
    e("-------", ERROR),
    e("--------", ERROR),
];

/// Look up an element string. First exact match wins; unmatched strings
/// decode to [`UNKNOWN`].
#[must_use]
pub fn lookup(code: &str) -> &'static str {
    MORSE_TABLE
        .iter()
        .find(|entry| entry.code == code)
        .map(|entry| entry.text)
        .unwrap_or(UNKNOWN)
}

/// Reverse lookup for the transmit side: the element string for a
/// single character, if it has one.
#[must_use]
pub fn code_for(text: char) -> Option<&'static str> {
    let mut buf = [0u8; 4];
    let s: &str = text.to_ascii_uppercase().encode_utf8(&mut buf);
    MORSE_TABLE
        .iter()
        .find(|entry| entry.text == s && entry.text != ERROR)
        .map(|entry| entry.code)
}

/* vim: textwidth=80
 */
