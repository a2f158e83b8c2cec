//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use gridlink::csv::Delimiter;
use gridlink::grid::{DocumentSession, GridDocument};

/// Parse comma-separated text into a document
pub fn test_document(text: &str) -> GridDocument {
    GridDocument::parse(text, Delimiter::Comma).unwrap()
}

/// Open a session over comma-separated text
pub fn test_session(text: &str) -> DocumentSession {
    DocumentSession::new(test_document(text))
}

/// Current raw text of a session's document
pub fn text_of(session: &DocumentSession) -> String {
    session.read().to_text().unwrap()
}

/// Every row of a session's document, header first
pub fn rows_of(session: &DocumentSession) -> Vec<Vec<String>> {
    session.read().grid().rows().to_vec()
}

/// Assert every row has the header's length
pub fn assert_rectangular(session: &DocumentSession) {
    let doc = session.read();
    let width = doc.column_count();
    for (i, row) in doc.grid().rows().iter().enumerate() {
        assert_eq!(
            row.len(),
            width,
            "row {} has {} fields, header has {}",
            i,
            row.len(),
            width
        );
    }
}

/// Write `content` to `dir/name`, creating parent directories
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// Tiny deterministic generator for pseudo-random edit sequences
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Next value in `0..bound` (`bound` > 0)
    pub fn below(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound
    }
}
