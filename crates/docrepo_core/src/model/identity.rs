//! Collection-scoped, human-readable identifier generation.
//!
//! Format: `<COLLECTION_UPPER>-<YYMMDDHHmmss>-<6 chars of [A-Z0-9]>`.
//!
//! There is no collision detection: two ids for the same collection collide
//! only when generated in the same second with the same 6-char suffix
//! (1 in 36^6). Callers needing a hard guarantee must rely on the store's
//! unique id constraint.

use chrono::Local;
use rand::Rng;

const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890";
const ID_SUFFIX_LEN: usize = 6;

/// Generates a new identifier for `collection`.
pub fn generate_id(collection: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| char::from(ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())]))
        .collect();
    let timestamp = Local::now().format("%y%m%d%H%M%S");

    format!("{}-{timestamp}-{suffix}", collection.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::generate_id;
    use regex::Regex;

    #[test]
    fn id_has_collection_timestamp_and_suffix() {
        let pattern = Regex::new(r"^PERSONS-\d{12}-[A-Z0-9]{6}$").unwrap();
        let id = generate_id("Persons");
        assert!(pattern.is_match(&id), "unexpected id {id}");
    }

    #[test]
    fn consecutive_ids_differ() {
        let first = generate_id("companies");
        let second = generate_id("companies");
        assert_ne!(first, second);
    }
}
