//! Season/episode matching over free text.
//!
//! Decides whether a catalog entry title, a description or an intra-archive
//! path refers to a given season/episode. Text that mentions a season in any
//! recognized form gets a strict season+episode check; text with no season
//! indicator at all is matched on the episode alone, which keeps
//! single-season and anime-style releases ("Show - 05") from being rejected
//! while still refusing wrong-season captions on multi-season titles.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::tables::{EPISODE_WORDS, SEASON_WORDS};

/// `S02E05`, `s2.e5` and friends. Input is lowercased before matching.
static SEASON_EPISODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bs\d{1,2}[\s._-]?e\d{1,3}\b").expect("season-episode pattern"));

/// `2x05` notation.
static CROSS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,2}x\d{1,3}\b").expect("cross pattern"));

/// A season word followed by a number, in any supported language.
static SEASON_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:{})[\s._:#-]*\d{{1,2}}\b",
        SEASON_WORDS.join("|")
    ))
    .expect("season word pattern")
});

/// Whether `text` names the given episode (and season, when the text makes
/// one recognizable).
///
/// `season` is `None` for requests without a season context, e.g. absolute
/// episode numbering. Text that carries a season marker the request cannot
/// verify is rejected rather than guessed at.
pub fn matches_episode(text: &str, season: Option<u32>, episode: u32) -> bool {
    let text = text.to_lowercase();
    if has_season_indicator(&text) {
        match season {
            Some(season) => strict_match(&text, season, episode),
            None => false,
        }
    } else {
        episode_only_match(&text, episode)
    }
}

fn has_season_indicator(text: &str) -> bool {
    SEASON_EPISODE_RE.is_match(text) || CROSS_RE.is_match(text) || SEASON_WORD_RE.is_match(text)
}

/// Both numbers must appear through a recognized notation, zero-padded or
/// not.
fn strict_match(text: &str, season: u32, episode: u32) -> bool {
    let notations = [
        format!(r"\bs0*{season}[\s._-]?e0*{episode}\b"),
        format!(r"\b0*{season}x0*{episode}\b"),
        format!(
            r"\b(?:{season_words})[\s._:#-]*0*{season}\b.*\b(?:{episode_words})[\s._:#-]*0*{episode}\b",
            season_words = SEASON_WORDS.join("|"),
            episode_words = EPISODE_WORDS.join("|"),
        ),
    ];
    notations.iter().any(|pattern| {
        Regex::new(pattern)
            .map(|re| re.is_match(text))
            .unwrap_or(false)
    })
}

/// Episode-only notations for text that never mentions a season: `E05`,
/// `Ep.5`, an episode word, or a bare number between separators.
fn episode_only_match(text: &str, episode: u32) -> bool {
    let notations = [
        format!(r"\bep?\.?\s*0*{episode}\b"),
        format!(
            r"\b(?:{episode_words})[\s._:#-]*0*{episode}\b",
            episode_words = EPISODE_WORDS.join("|"),
        ),
        format!(r"(?:^|[\s._\-\(\[#])0*{episode}(?:[\s._\-\)\]]|$)"),
    ];
    notations.iter().any(|pattern| {
        Regex::new(pattern)
            .map(|re| re.is_match(text))
            .unwrap_or(false)
    })
}
