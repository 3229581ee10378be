//! Testing utilities and mock implementations.
//!
//! `MockCatalog` stands in for the upstream catalog so pipeline tests run
//! without real infrastructure; `fixtures` builds in-memory archives and
//! caption bytes.

mod mock_catalog;

pub use mock_catalog::MockCatalog;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::io::{Cursor, Write};

    use crate::catalog::CatalogEntry;

    /// Build an in-memory zip archive from `(path, content)` pairs.
    pub fn zip_fixture(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (path, content) in entries {
            writer
                .start_file(path.to_string(), options)
                .expect("start zip entry");
            writer.write_all(content).expect("write zip entry");
        }
        writer.finish().expect("finish zip").into_inner()
    }

    /// A minimal SRT body with one cue.
    pub fn srt_fixture(line: &str) -> Vec<u8> {
        format!("1\n00:01:02,345 --> 00:01:04,000\n{line}\n").into_bytes()
    }

    /// Create a test catalog entry with reasonable defaults.
    pub fn catalog_entry(id: &str, language: &str, title: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            language: language.to_string(),
            title: title.to_string(),
            description: String::new(),
        }
    }
}
