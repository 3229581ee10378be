//! Archive container sniffing, caption entry listing and extraction.
//!
//! Entries are enumerated as plain path strings without materializing any
//! content; a single entry's bytes are materialized on demand. Both
//! container kinds go through the same two operations, so adding a third
//! kind only touches the dispatch here.

use std::io::{Cursor, Read, Write};

use thiserror::Error;

/// File suffix that marks a caption entry.
pub const CAPTION_SUFFIX: &str = ".srt";

/// Folder macOS zip tools inject; never holds real captions.
const MACOS_METADATA_DIR: &str = "__MACOSX";

/// Container families the upstream catalog serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    Zip,
    Rar,
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    #[error("malformed archive: {0}")]
    Parse(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Sniff the container family from the leading signature bytes.
///
/// This is a best-effort heuristic, not a format validator: anything that is
/// neither `PK` nor `Rar!` is handed to the zip parser, which reports the
/// malformation instead.
pub fn detect_kind(bytes: &[u8]) -> ArchiveKind {
    if bytes.starts_with(b"PK") {
        ArchiveKind::Zip
    } else if bytes.starts_with(b"Rar!") {
        ArchiveKind::Rar
    } else {
        ArchiveKind::Zip
    }
}

/// List every non-directory caption entry, excluding macOS metadata folders.
pub fn list_entries(bytes: &[u8]) -> Result<Vec<String>, ArchiveError> {
    match detect_kind(bytes) {
        ArchiveKind::Zip => list_zip(bytes),
        ArchiveKind::Rar => list_rar(bytes),
    }
}

/// Extract the raw bytes of exactly one entry.
pub fn extract_entry(bytes: &[u8], path: &str) -> Result<Vec<u8>, ArchiveError> {
    match detect_kind(bytes) {
        ArchiveKind::Zip => extract_zip(bytes, path),
        ArchiveKind::Rar => extract_rar(bytes, path),
    }
}

fn is_caption_entry(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.ends_with(CAPTION_SUFFIX)
        && !lower
            .split('/')
            .any(|segment| segment.eq_ignore_ascii_case(MACOS_METADATA_DIR))
}

fn list_zip(bytes: &[u8]) -> Result<Vec<String>, ArchiveError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ArchiveError::Parse(e.to_string()))?;
    let mut entries = Vec::new();
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .map_err(|e| ArchiveError::Parse(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if is_caption_entry(&name) {
            entries.push(name);
        }
    }
    Ok(entries)
}

fn extract_zip(bytes: &[u8], path: &str) -> Result<Vec<u8>, ArchiveError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ArchiveError::Parse(e.to_string()))?;
    let mut entry = match archive.by_name(path) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(ArchiveError::EntryNotFound(path.to_string()))
        }
        Err(e) => return Err(ArchiveError::Parse(e.to_string())),
    };
    let mut content = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut content)?;
    Ok(content)
}

/// The rar reader only works on paths, so the bytes spill to a temp file.
fn spill_to_temp(bytes: &[u8]) -> Result<tempfile::NamedTempFile, ArchiveError> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

fn list_rar(bytes: &[u8]) -> Result<Vec<String>, ArchiveError> {
    let file = spill_to_temp(bytes)?;
    let path = file.path().to_path_buf();
    let archive = unrar::Archive::new(&path)
        .open_for_listing()
        .map_err(|e| ArchiveError::Parse(e.to_string()))?;

    let mut entries = Vec::new();
    for header in archive {
        let header = header.map_err(|e| ArchiveError::Parse(e.to_string()))?;
        if !header.is_file() {
            continue;
        }
        let name = header.filename.to_string_lossy().replace('\\', "/");
        if is_caption_entry(&name) {
            entries.push(name);
        }
    }
    Ok(entries)
}

fn extract_rar(bytes: &[u8], wanted: &str) -> Result<Vec<u8>, ArchiveError> {
    let file = spill_to_temp(bytes)?;
    let path = file.path().to_path_buf();
    let mut archive = unrar::Archive::new(&path)
        .open_for_processing()
        .map_err(|e| ArchiveError::Parse(e.to_string()))?;

    while let Some(header) = archive
        .read_header()
        .map_err(|e| ArchiveError::Parse(e.to_string()))?
    {
        let name = header.entry().filename.to_string_lossy().replace('\\', "/");
        archive = if name == wanted {
            let (content, _rest) = header
                .read()
                .map_err(|e| ArchiveError::Parse(e.to_string()))?;
            return Ok(content);
        } else {
            header
                .skip()
                .map_err(|e| ArchiveError::Parse(e.to_string()))?
        };
    }
    Err(ArchiveError::EntryNotFound(wanted.to_string()))
}
