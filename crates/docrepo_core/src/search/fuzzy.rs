//! Edit-distance similarity used by fuzzy equality.
//!
//! Similarity follows the classic Lucene definition:
//! `1 - distance / min(len(a), len(b))`, computed over lowercase characters.

/// Default similarity threshold for `with_fuzzy`.
pub const DEFAULT_FUZZY_SIMILARITY: f64 = 0.5;

/// Levenshtein distance over Unicode scalar values.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev_row: Vec<usize> = (0..=b.len()).collect();
    let mut curr_row = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr_row[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr_row[j] = (prev_row[j] + 1)
                .min(curr_row[j - 1] + 1)
                .min(prev_row[j - 1] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b.len()]
}

/// Case-insensitive similarity in `(-inf, 1]`; identical strings score `1.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a == b {
        return 1.0;
    }

    let shortest = a.chars().count().min(b.chars().count());
    if shortest == 0 {
        return 0.0;
    }

    1.0 - edit_distance(&a, &b) as f64 / shortest as f64
}

/// Whether `candidate` is within the similarity `threshold` of `term`.
pub fn is_similar(term: &str, candidate: &str, threshold: f64) -> bool {
    similarity(term, candidate) >= threshold
}
