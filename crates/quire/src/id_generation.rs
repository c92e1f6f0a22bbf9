//! Content-derived issue ids.
//!
//! An issue id is the SHA-256 of the moment of creation, a random nonce, and
//! the issue's creation time, reporter, title and description, written as
//! lowercase hex and truncated to [`ID_LENGTH`] characters. Ids are
//! informational identifiers, not a security boundary: nothing checks them
//! for collisions beyond what the hash and the nonce give.
//!
//! # Example
//!
//! ```
//! use quire::id_generation::{IdSeed, generate_issue_id, validate_id};
//!
//! let id = generate_issue_id(&IdSeed {
//!     creation_time: None,
//!     reporter: "Ann <ann@example.com>",
//!     title: "Crash on empty input",
//!     desc: "Reading an empty file panics.",
//! });
//! assert!(validate_id(&id));
//! ```

use quire_record::Timestamp;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Number of hex digits kept from the hash.
pub const ID_LENGTH: usize = 40;

/// The issue content an id is derived from.
#[derive(Debug, Clone, Copy)]
pub struct IdSeed<'a> {
    /// When the issue was created, if known yet.
    pub creation_time: Option<Timestamp>,
    /// Who reported it.
    pub reporter: &'a str,
    /// Its title.
    pub title: &'a str,
    /// Its description.
    pub desc: &'a str,
}

/// Generate a fresh id for an issue with this content.
#[must_use]
pub fn generate_issue_id(seed: &IdSeed<'_>) -> String {
    hash_id(seed, Timestamp::now(), rand::random())
}

fn hash_id(seed: &IdSeed<'_>, now: Timestamp, nonce: u64) -> String {
    let creation_time = seed
        .creation_time
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();
    let content = format!(
        "{}|{}|{}|{}|{}|{}",
        now.to_rfc3339(),
        nonce,
        creation_time,
        seed.reporter,
        seed.title,
        seed.desc
    );

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();

    let mut id = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(id, "{byte:02x}");
    }
    id.truncate(ID_LENGTH);
    id
}

/// Check that `id` has the shape of a generated id: [`ID_LENGTH`]
/// lowercase hex digits.
#[must_use]
pub fn validate_id(id: &str) -> bool {
    id.len() == ID_LENGTH && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> IdSeed<'static> {
        IdSeed {
            creation_time: Some("2024-03-01T10:00:00Z".parse().unwrap()),
            reporter: "Ann <ann@example.com>",
            title: "Crash on empty input",
            desc: "",
        }
    }

    #[test]
    fn test_same_inputs_same_id() {
        let now: Timestamp = "2024-03-01T10:00:01Z".parse().unwrap();
        assert_eq!(hash_id(&seed(), now, 7), hash_id(&seed(), now, 7));
    }

    #[test]
    fn test_nonce_changes_id() {
        let now: Timestamp = "2024-03-01T10:00:01Z".parse().unwrap();
        assert_ne!(hash_id(&seed(), now, 7), hash_id(&seed(), now, 8));
    }

    #[test]
    fn test_content_changes_id() {
        let now: Timestamp = "2024-03-01T10:00:01Z".parse().unwrap();
        let other = IdSeed {
            title: "Crash on empty output",
            ..seed()
        };
        assert_ne!(hash_id(&seed(), now, 7), hash_id(&other, now, 7));
    }

    #[test]
    fn test_generated_ids_are_valid_and_distinct() {
        let a = generate_issue_id(&seed());
        let b = generate_issue_id(&seed());
        assert!(validate_id(&a));
        assert!(validate_id(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_validation() {
        assert!(validate_id(&"a".repeat(ID_LENGTH)));
        assert!(!validate_id("abc"));
        assert!(!validate_id(&"g".repeat(ID_LENGTH)));
        assert!(!validate_id(&"A".repeat(ID_LENGTH)));
    }
}
