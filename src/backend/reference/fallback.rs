//! Built-in language names
//!
//! Served whenever the backing reference store has never been reachable or
//! does not know a code. Keys are lower-case ISO 639-1 codes.

/// Static `code -> display name` table
pub const STATIC_LANGUAGES: &[(&str, &str)] = &[
    ("af", "Afrikaans"),
    ("ak", "Akan"),
    ("am", "Amharic"),
    ("ar", "Arabic"),
    ("de", "German"),
    ("ee", "Ewe"),
    ("en", "English"),
    ("es", "Spanish"),
    ("ff", "Fula"),
    ("fr", "French"),
    ("ha", "Hausa"),
    ("hi", "Hindi"),
    ("ig", "Igbo"),
    ("kg", "Kongo"),
    ("ki", "Kikuyu"),
    ("lg", "Luganda"),
    ("ln", "Lingala"),
    ("mg", "Malagasy"),
    ("ny", "Chichewa"),
    ("om", "Oromo"),
    ("pt", "Portuguese"),
    ("rw", "Kinyarwanda"),
    ("sn", "Shona"),
    ("so", "Somali"),
    ("st", "Sesotho"),
    ("sw", "Swahili"),
    ("ti", "Tigrinya"),
    ("tn", "Setswana"),
    ("tw", "Twi"),
    ("wo", "Wolof"),
    ("xh", "Xhosa"),
    ("yo", "Yoruba"),
    ("zh", "Chinese"),
    ("zu", "Zulu"),
];

/// Look up a code in the static table
pub fn static_language_name(code: &str) -> Option<&'static str> {
    STATIC_LANGUAGES
        .binary_search_by(|(known, _)| (*known).cmp(code))
        .ok()
        .map(|index| STATIC_LANGUAGES[index].1)
}
