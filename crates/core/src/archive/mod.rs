//! Compressed caption archives: container codec and shared TTL store.

mod codec;
mod store;

pub use codec::{detect_kind, extract_entry, list_entries, ArchiveError, ArchiveKind, CAPTION_SUFFIX};
pub use store::{ArchiveBundle, ArchiveStore};
