//! Upstream language codes to served codes.
//!
//! The upstream catalog reports ISO 639-2 style codes; players want the
//! short form. Codes without a mapping pass through unchanged. Only the
//! literal "other" bucket maps to the undetermined sentinel.

/// Fixed mapping table, editable without touching lookup logic.
const LANGUAGE_MAP: &[(&str, &str)] = &[
    ("eng", "en"),
    ("rum", "ro"),
    ("ron", "ro"),
    ("fre", "fr"),
    ("fra", "fr"),
    ("ger", "de"),
    ("deu", "de"),
    ("spa", "es"),
    ("ita", "it"),
    ("por", "pt"),
    ("pob", "pt-BR"),
    ("dut", "nl"),
    ("nld", "nl"),
    ("gre", "el"),
    ("ell", "el"),
    ("hun", "hu"),
    ("cze", "cs"),
    ("ces", "cs"),
    ("slo", "sk"),
    ("slk", "sk"),
    ("pol", "pl"),
    ("rus", "ru"),
    ("tur", "tr"),
    ("ara", "ar"),
    ("heb", "he"),
    ("jpn", "ja"),
    ("chi", "zh"),
    ("zho", "zh"),
    ("kor", "ko"),
    ("swe", "sv"),
    ("nor", "no"),
    ("dan", "da"),
    ("fin", "fi"),
    ("srp", "sr"),
    ("hrv", "hr"),
    ("bul", "bg"),
    ("ukr", "uk"),
    ("vie", "vi"),
    ("tha", "th"),
    ("ind", "id"),
    ("may", "ms"),
    ("msa", "ms"),
    ("per", "fa"),
    ("fas", "fa"),
    ("other", "und"),
];

/// Map an upstream language code to the code served on tracks.
pub fn serve_code(upstream: &str) -> String {
    let lower = upstream.to_lowercase();
    LANGUAGE_MAP
        .iter()
        .find(|(from, _)| *from == lower)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or(lower)
}
