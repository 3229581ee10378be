//! Compatibility scoring between a video filename and a caption filename.
//!
//! Release-group identity is the strongest predictor of frame-accurate
//! synchronization, the source tag is second, and plain text similarity is
//! noise-prone, so it only breaks ties. The final score is an integer in
//! [0, 100].

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::tables::{SOURCE_TAG_GROUPS, TECHNICAL_TAGS};

const RELEASE_GROUP_BONUS: u32 = 50;
const SOURCE_TAG_BONUS: u32 = 30;
const SIMILARITY_WEIGHT: f32 = 0.2;

/// Token after the last hyphen, up to a bracket, a space or the end,
/// with an optional file extension trailing it.
static HYPHEN_GROUP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-([a-z0-9]+)(?:\.[a-z0-9]{2,4})?\s*(?:[\[\(][^\]\)]*[\]\)])?\s*$")
        .expect("hyphen group pattern")
});

/// Bracketed token at the start of the name.
static LEADING_BRACKET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([a-z0-9][^\]\[]*)\]").expect("leading bracket pattern"));

/// Bracketed token at the end of the name, extension allowed after.
static TRAILING_BRACKET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([a-z0-9][^\]\[]*)\](?:\.[a-z0-9]{2,4})?\s*$").expect("trailing bracket pattern")
});

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(19|20)\d{2}$").expect("year pattern"));

/// Score `candidate_filename` against `video_filename`.
///
/// Empty input on either side scores 0.
pub fn score_filenames(video_filename: &str, candidate_filename: &str) -> u32 {
    if video_filename.is_empty() || candidate_filename.is_empty() {
        return 0;
    }
    let video = video_filename.to_lowercase();
    let candidate = candidate_filename.to_lowercase();

    let mut total = 0u32;

    if let Some(group) = release_group(&video) {
        let matched = release_group(&candidate)
            .map(|other| other == group)
            .unwrap_or(false)
            || candidate.contains(&group);
        if matched {
            total += RELEASE_GROUP_BONUS;
        }
    }

    let video_sources = source_tag_groups(&video);
    if !video_sources.is_empty() {
        let candidate_sources = source_tag_groups(&candidate);
        if video_sources.iter().any(|g| candidate_sources.contains(g)) {
            total += SOURCE_TAG_BONUS;
        }
    }

    let similarity = token_sort_similarity(&video, &candidate);
    total += (similarity as f32 * SIMILARITY_WEIGHT).round() as u32;

    total.min(100)
}

/// Extract the probable release group from a lowercased filename.
///
/// Tried in order: token after the last hyphen, bracketed token at either
/// end, then the trailing one or two words skipping anything that is a known
/// technical tag or a bare year.
fn release_group(name: &str) -> Option<String> {
    if let Some(caps) = HYPHEN_GROUP_RE.captures(name) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    if let Some(caps) = LEADING_BRACKET_RE
        .captures(name)
        .or_else(|| TRAILING_BRACKET_RE.captures(name))
    {
        return caps.get(1).map(|m| m.as_str().to_string());
    }

    let cleaned = name.replace(['.', '_'], " ");
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    words
        .iter()
        .rev()
        .take(2)
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .find(|word| {
            word.len() >= 2 && !TECHNICAL_TAGS.contains(word) && !YEAR_RE.is_match(word)
        })
        .map(|word| word.to_string())
}

/// Indices of the source tag groups present in a lowercased filename.
fn source_tag_groups(name: &str) -> Vec<usize> {
    let tokens: Vec<&str> = name
        .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '.'))
        .flat_map(|t| t.split('.'))
        .filter(|t| !t.is_empty())
        .collect();

    SOURCE_TAG_GROUPS
        .iter()
        .enumerate()
        .filter(|(_, group)| group.iter().any(|tag| tokens.contains(tag)))
        .map(|(index, _)| index)
        .collect()
}

/// Token-order-insensitive similarity in [0, 100].
///
/// Both names are tokenized, the tokens sorted and rejoined, and the result
/// compared by edit distance, which makes "Show 2024 GROUP" and
/// "GROUP Show 2024" compare equal.
fn token_sort_similarity(a: &str, b: &str) -> u32 {
    let sorted_a = sorted_tokens(a);
    let sorted_b = sorted_tokens(b);
    if sorted_a.is_empty() && sorted_b.is_empty() {
        return 0;
    }
    let longest = sorted_a.chars().count().max(sorted_b.chars().count());
    if longest == 0 {
        return 0;
    }
    let distance = levenshtein_distance(&sorted_a, &sorted_b);
    ((longest.saturating_sub(distance)) * 100 / longest) as u32
}

fn sorted_tokens(name: &str) -> String {
    let mut tokens: Vec<&str> = name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Edit distance over chars, two-row formulation.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0usize; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_range_and_empty_inputs() {
        assert_eq!(score_filenames("", ""), 0);
        assert_eq!(score_filenames("Some.Movie.2020.mkv", ""), 0);
        assert_eq!(score_filenames("", "Some.Movie.srt"), 0);

        let pairs = [
            ("Movie.2020.1080p.BluRay.x264-SPARKS.mkv", "Movie.2020.BluRay-SPARKS.srt"),
            ("a", "b"),
            ("[group] show - 05", "show 05 [group]"),
        ];
        for (video, candidate) in pairs {
            let score = score_filenames(video, candidate);
            assert!(score <= 100, "score {score} out of range for {video} / {candidate}");
        }
    }

    #[test]
    fn test_release_group_after_hyphen() {
        assert_eq!(
            release_group("movie.2020.1080p.bluray.x264-sparks.mkv"),
            Some("sparks".to_string())
        );
        assert_eq!(
            release_group("show.s01e01.720p.web.h264-cakes"),
            Some("cakes".to_string())
        );
    }

    #[test]
    fn test_release_group_brackets() {
        assert_eq!(
            release_group("[subsplease] anime show - 05 (1080p)"),
            Some("subsplease".to_string())
        );
        assert_eq!(
            release_group("anime show - 05 [erai-raws].mkv"),
            Some("erai-raws".to_string())
        );
    }

    #[test]
    fn test_release_group_fallback_skips_technical_tags() {
        // "1080p" and "bluray" are technical, "sparks" is not.
        assert_eq!(
            release_group("movie 2020 sparks 1080p"),
            Some("sparks".to_string())
        );
        // A bare year is not a group either.
        assert_eq!(release_group("movie sparks 2020"), Some("sparks".to_string()));
        assert_eq!(release_group("movie 1080p bluray"), None);
    }

    #[test]
    fn test_release_group_bonus_awarded() {
        let same = score_filenames(
            "Movie.2020.1080p.BluRay.x264-SPARKS.mkv",
            "Movie.2020.BluRay.x264-SPARKS.srt",
        );
        let different = score_filenames(
            "Movie.2020.1080p.BluRay.x264-SPARKS.mkv",
            "Movie.2020.BluRay.x264-DRONES.srt",
        );
        assert!(same >= 50, "expected group bonus, got {same}");
        assert!(same > different);
    }

    #[test]
    fn test_release_group_literal_containment() {
        // Candidate has no extractable group but contains the video's group.
        let score = score_filenames(
            "Movie.2020.x264-SPARKS.mkv",
            "movie 2020 sparks subs pack fixed",
        );
        assert!(score >= 50, "expected containment bonus, got {score}");
    }

    #[test]
    fn test_source_tag_bonus() {
        let matching = score_filenames(
            "Movie.2020.1080p.WEB-DL.x264.mkv",
            "Movie.2020.WEBRip.srt",
        );
        let conflicting = score_filenames(
            "Movie.2020.1080p.WEB-DL.x264.mkv",
            "Movie.2020.DVDRip.srt",
        );
        assert!(matching > conflicting);
    }

    #[test]
    fn test_source_tag_groups_aliases() {
        assert_eq!(source_tag_groups("movie.2020.bdrip"), source_tag_groups("movie.2020.blu-ray"));
        assert!(source_tag_groups("plain.title").is_empty());
    }

    #[test]
    fn test_token_sort_similarity_order_insensitive() {
        let forward = token_sort_similarity("the big show 2020", "2020 show big the");
        assert_eq!(forward, 100);
        assert!(token_sort_similarity("alpha beta", "gamma delta") < 50);
    }

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("same", "same"), 0);
    }

    #[test]
    fn test_full_agreement_scores_high() {
        let score = score_filenames(
            "Show.S02E05.1080p.BluRay.x264-GROUP.mkv",
            "Show.S02E05.BluRay.x264-GROUP.srt",
        );
        assert!(score >= 90, "expected near-perfect score, got {score}");
    }
}
