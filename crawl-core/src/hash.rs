//! Deterministic 32-bit hashing.
//!
//! Every seed the engine derives goes through these functions, so the
//! arithmetic is fixed: signed 32-bit with wrapping overflow, over UTF-16
//! code units. Changing any of it breaks old saves.

use serde::Serialize;

/// djb2-style string hash.
pub fn hash_string(s: &str) -> i32 {
    let mut hash: i32 = 5381;
    for unit in s.encode_utf16() {
        hash = (hash << 5).wrapping_add(hash).wrapping_add(unit as i32);
    }
    hash
}

/// Fold several hashes into one with an XOR and a x33 mix per step.
pub fn combine_hashes(hashes: &[i32]) -> i32 {
    let Some((&first, rest)) = hashes.split_first() else {
        return 0;
    };

    rest.iter().fold(first, |combined, &h| {
        let mixed = combined ^ h;
        (mixed << 5).wrapping_add(mixed)
    })
}

/// Hash a string together with a numeric seed.
pub fn hash_with_seed(s: &str, seed: i32) -> i32 {
    combine_hashes(&[hash_string(s), seed])
}

/// Hash any serializable value through its JSON form.
///
/// Values that fail to serialize hash like the empty string.
pub fn hash_value<T: Serialize>(value: &T) -> i32 {
    let json = serde_json::to_string(value).unwrap_or_default();
    hash_string(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_string_known_values() {
        assert_eq!(hash_string(""), 5381);
        assert_eq!(hash_string("a"), 177670);
        assert_eq!(hash_string("hello"), 261238937);
        assert_eq!(hash_string("t1"), 5863786);
    }

    #[test]
    fn test_hash_string_case_sensitive() {
        assert_ne!(hash_string("Hello"), hash_string("hello"));
    }

    #[test]
    fn test_hash_string_wraps_on_long_input() {
        let long = "x".repeat(10_000);
        assert_eq!(hash_string(&long), hash_string(&long));
    }

    #[test]
    fn test_combine_hashes() {
        assert_eq!(combine_hashes(&[]), 0);
        assert_eq!(combine_hashes(&[42]), 42);
        assert_eq!(combine_hashes(&[1, 2]), 99);
    }

    #[test]
    fn test_combine_is_order_sensitive_after_mixing() {
        assert_ne!(combine_hashes(&[1, 2, 3]), combine_hashes(&[3, 1, 2]));
    }

    #[test]
    fn test_hash_with_seed() {
        assert_eq!(hash_with_seed("t1", 0), 193504938);
        assert_eq!(hash_with_seed("t1", 1), 193504971);
    }

    #[test]
    fn test_hash_value_matches_json() {
        assert_eq!(hash_value(&"abc"), hash_string("\"abc\""));
        assert_eq!(hash_value(&vec![1, 2]), hash_string("[1,2]"));
    }
}
