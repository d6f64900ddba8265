//! Content-addressed entry key generation.

use sha2::{Digest, Sha256};

/// Compute the storage key for a request identity.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("GET", "https://example.com/");
        let hash2 = compute_cache_key("GET", "https://example.com/");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_different_method() {
        assert_ne!(compute_cache_key("GET", "https://example.com/"), compute_cache_key("HEAD", "https://example.com/"));
    }

    #[test]
    fn test_hash_no_boundary_collision() {
        assert_ne!(compute_cache_key("GE", "Thttps://a/"), compute_cache_key("GET", "https://a/"));
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("GET", "https://example.com/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
