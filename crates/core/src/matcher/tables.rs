//! Vocabulary tables for episode matching and filename scoring.
//!
//! These are plain data so that new languages or release conventions can be
//! added without touching the matching logic.

/// Words meaning "season" in the languages the upstream catalog serves.
pub(crate) const SEASON_WORDS: &[&str] = &[
    "season",    // en
    "sezonul",   // ro (definite form)
    "sezon",     // ro / pl / tr
    "saison",    // fr
    "temporada", // es / pt
    "stagione",  // it
    "staffel",   // de
    "seizoen",   // nl
    "sezona",    // hr / sr
];

/// Words meaning "episode" in the same languages.
pub(crate) const EPISODE_WORDS: &[&str] = &[
    "episode",   // en
    "episodul",  // ro (definite form)
    "episod",    // ro
    "episodio",  // es / it / pt
    "folge",     // de
    "aflevering",// nl
    "epizoda",   // hr / sr
    "odcinek",   // pl
    "ep",
];

/// Source/quality tags that predict synchronization compatibility.
///
/// Tags within one group are treated as the same source; "bdrip" in the
/// video name matches "blu-ray" in the candidate.
pub(crate) const SOURCE_TAG_GROUPS: &[&[&str]] = &[
    &["remux"],
    &["bluray", "blu-ray", "bdrip", "brrip", "bd-rip", "br-rip"],
    &["web-dl", "webdl", "webrip", "web-rip", "web"],
    &["hdtv", "pdtv", "sdtv", "tvrip", "dsr", "dsrip"],
    &["dvdrip", "dvd-rip", "dvd"],
    &["hdrip", "hd-rip"],
    &["cam", "camrip", "hdcam"],
    &["telesync", "hdts"],
    &["telecine", "hdtc"],
    &["screener", "dvdscr", "bdscr", "scr"],
];

/// Technical tokens that are never a release group.
///
/// Used when falling back to the trailing words of a filename: resolutions,
/// codecs, sources, audio layouts, language codes and release qualifiers all
/// get skipped before a token is accepted as a group name.
pub(crate) const TECHNICAL_TAGS: &[&str] = &[
    // resolution
    "480p", "576p", "720p", "1080p", "1080i", "2160p", "4k", "uhd",
    // video codec
    "x264", "x265", "h264", "h265", "h.264", "h.265", "hevc", "avc", "av1",
    "xvid", "divx", "10bit",
    // source
    "remux", "bluray", "blu-ray", "bdrip", "brrip", "bd-rip", "br-rip",
    "web-dl", "webdl", "webrip", "web-rip", "web", "hdtv", "pdtv", "sdtv",
    "tvrip", "dvdrip", "dvd-rip", "dvd", "hdrip", "hd-rip", "cam", "camrip",
    "hdcam", "telesync", "hdts", "telecine", "hdtc", "screener", "dvdscr",
    "bdscr", "scr",
    // audio
    "aac", "ac3", "eac3", "dts", "dts-hd", "truehd", "atmos", "flac", "mp3",
    "dd5", "ddp5", "5.1", "7.1", "2.0",
    // language markers
    "multi", "dual", "vostfr", "subbed", "dubbed",
    "en", "eng", "ro", "rum", "fr", "fre", "es", "spa", "de", "ger", "it",
    "ita", "hu", "hun", "pl", "pol",
    // release qualifiers
    "proper", "repack", "rerip", "extended", "unrated", "limited", "internal",
    "complete", "remastered", "retail", "hdr", "hdr10", "sdr", "imax",
    // container / caption extensions
    "mkv", "mp4", "avi", "mov", "wmv", "m2ts", "srt", "sub", "idx", "vtt",
];
