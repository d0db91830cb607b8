//! Markdown codec: parsing documents into outlines and serializing them
//! back under the dialect's fidelity rules.

mod metadata;
mod parse;
mod render;

pub use parse::{parse_outline, read_outline};
pub use render::render_outline;

pub(crate) use metadata::MetadataBlock;

/// Hex SHA-256 of a document's text. Captured at parse time and compared
/// at save time so unmodified files are never rewritten.
pub(crate) fn compute_digest(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable_and_content_sensitive() {
        let a = compute_digest("Content A");
        let b = compute_digest("Content A");
        let c = compute_digest("Content B");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64); // SHA256 hex string length
    }
}
