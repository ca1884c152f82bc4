use crate::page::ReviewBlock;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of leading characters of page content that take part in a fingerprint.
pub const FINGERPRINT_CONTENT_CHARS: usize = 1000;

/// Comparable token identifying the visible content of a review page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Concatenated, trimmed block text in document order, cut to the first
/// [`FINGERPRINT_CONTENT_CHARS`] characters.
pub fn page_content(blocks: &[ReviewBlock]) -> String {
    blocks
        .iter()
        .flat_map(|block| block.text.trim().chars())
        .take(FINGERPRINT_CONTENT_CHARS)
        .collect()
}

/// Digest used by the pagination driver to notice repeated pages.
///
/// Loop-breaker only. Collisions between genuinely different pages just end a
/// run early.
pub trait ContentFingerprinter: Send + Sync {
    fn fingerprint(&self, content: &[u8]) -> Fingerprint;

    fn fingerprint_page(&self, blocks: &[ReviewBlock]) -> Fingerprint {
        self.fingerprint(page_content(blocks).as_bytes())
    }
}

/// Base64 of the UTF-8 content. Reversible and cheap enough to run on every poll.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Fingerprinter;

impl ContentFingerprinter for Base64Fingerprinter {
    fn fingerprint(&self, content: &[u8]) -> Fingerprint {
        Fingerprint(STANDARD.encode(content))
    }
}

/// Hex SHA-256 of the same content, for callers that want fixed-size tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Fingerprinter;

impl ContentFingerprinter for Sha256Fingerprinter {
    fn fingerprint(&self, content: &[u8]) -> Fingerprint {
        Fingerprint(hex::encode(Sha256::digest(content)))
    }
}
