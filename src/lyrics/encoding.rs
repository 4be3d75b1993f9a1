//! Repair of double-encoded UTF-8 text.
//!
//! Lyrics stored by the generator and words echoed back by the API
//! occasionally arrive as UTF-8 bytes that were decoded a second time as
//! Latin-1 / Windows-1252, e.g. `"Ã©tÃ©"` instead of `"été"`.

/// Known Windows-1252 mis-decodings that a Latin-1 reinterpretation cannot
/// undo (the middle character lies outside U+0000..=U+00FF).
const MOJIBAKE: &[(&str, &str)] = &[
    ("Ã¡", "á"),
    ("Ã©", "é"),
    ("Ã\u{ad}", "í"),
    ("Ã³", "ó"),
    ("Ãº", "ú"),
    ("Ã\u{a0}", "à"),
    ("Ã¨", "è"),
    ("Ã¬", "ì"),
    ("Ã²", "ò"),
    ("Ã¹", "ù"),
    ("Ã¢", "â"),
    ("Ãª", "ê"),
    ("Ã®", "î"),
    ("Ã´", "ô"),
    ("Ã»", "û"),
    ("Ã£", "ã"),
    ("Ã±", "ñ"),
    ("Ã§", "ç"),
    ("Ã¤", "ä"),
    ("Ã¶", "ö"),
    ("Ã¼", "ü"),
    ("Ã¿", "ÿ"),
    ("Ã…", "Å"),
    ("Ã†", "Æ"),
    ("Ã˜", "Ø"),
];

/// Undo one level of double UTF-8 encoding.
///
/// First every char is taken as a single byte and the bytes are re-decoded
/// as UTF-8. When that is impossible (a char above U+00FF, or the bytes are
/// not valid UTF-8) the fixed [`MOJIBAKE`] table is applied instead, which
/// leaves clean text untouched.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    if let Some(fixed) = reinterpret_latin1(text) {
        return fixed;
    }

    MOJIBAKE
        .iter()
        .fold(text.to_string(), |acc, (bad, good)| {
            if acc.contains(bad) {
                acc.replace(bad, good)
            } else {
                acc
            }
        })
}

fn reinterpret_latin1(text: &str) -> Option<String> {
    let bytes = text
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect::<Option<Vec<u8>>>()?;
    String::from_utf8(bytes).ok()
}
