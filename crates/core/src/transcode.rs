//! Legacy caption bytes to WebVTT text.
//!
//! Upstream archives carry SRT files in whatever 8-bit encoding the uploader
//! used. Detection is statistical; windows-1252 verdicts and low-confidence
//! verdicts are both overridden to windows-1250, since Romanian-language
//! captions overwhelmingly use the Central European code page and detectors
//! routinely confuse the two Western-range encodings.

use encoding_rs::{Encoding, WINDOWS_1250};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::debug;

/// Detection verdicts below this confidence are not trusted.
const CONFIDENCE_FLOOR: f32 = 0.8;

/// The one encoding detectors confuse with the Central European page.
const OVERRIDDEN_ENCODING: &str = "windows-1252";

/// `HH:MM:SS,mmm` as SRT writes it; WebVTT wants a dot.
static SRT_TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2}:\d{2}:\d{2}),(\d{3})").expect("timestamp pattern"));

/// Convert raw SRT bytes into WebVTT text.
///
/// Never fails: undecodable byte sequences degrade to replacement
/// characters rather than erroring out of the delivery path.
pub fn to_vtt(bytes: &[u8]) -> String {
    let text = decode(bytes);
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = SRT_TIMESTAMP_RE.replace_all(&text, "${1}.${2}");
    format!("WEBVTT\n\n{}", text.trim_start_matches('\u{feff}').trim_start_matches('\n'))
}

fn decode(bytes: &[u8]) -> String {
    let (charset, confidence, _language) = chardet::detect(bytes);
    let label = chardet::charset2encoding(&charset);

    let encoding = if confidence < CONFIDENCE_FLOOR || label.eq_ignore_ascii_case(OVERRIDDEN_ENCODING)
    {
        debug!(detected = label, confidence, "forcing windows-1250");
        WINDOWS_1250
    } else {
        Encoding::for_label(label.as_bytes()).unwrap_or(WINDOWS_1250)
    };

    // decode() sniffs BOMs first, so UTF-8/UTF-16 marked files win over the
    // statistical verdict.
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}
