use sha2::{Digest, Sha256};

/// Hex encoded SHA-256 of `text`.
pub fn fingerprint(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Fingerprint of an article's content, independent of its link.
pub fn content_fingerprint(title: &str, summary: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(summary.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(fingerprint("hello"), fingerprint("hello"));
        assert_eq!(fingerprint("hello").len(), 64);
        assert_ne!(fingerprint("hello"), fingerprint("hello "));
    }

    #[test]
    fn test_content_fingerprint_matches_concatenation() {
        assert_eq!(content_fingerprint("ab", "cd"), fingerprint("abcd"));
        assert_ne!(
            content_fingerprint("Title", "old summary"),
            content_fingerprint("Title", "new summary")
        );
    }
}
