//! Fuzzy comparison of counterparty identifiers

use crate::config::DEFAULT_SIMILARITY_THRESHOLD;

/// Shortest normalized length eligible for the edit-distance test
const MIN_FUZZY_LEN: usize = 3;

/// Uppercase and keep only ASCII letters and digits
pub fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Classic Levenshtein distance over chars, two-row dynamic programming
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

pub fn similar(a: &str, b: &str) -> bool {
    similar_with_threshold(a, b, DEFAULT_SIMILARITY_THRESHOLD)
}

/// Containment either way, or normalized edit similarity at or above `threshold`
pub fn similar_with_threshold(a: &str, b: &str, threshold: f64) -> bool {
    let a = normalize(a);
    let b = normalize(b);

    if a.contains(b.as_str()) || b.contains(a.as_str()) {
        return true;
    }

    if a.len() < MIN_FUZZY_LEN || b.len() < MIN_FUZZY_LEN {
        return false;
    }

    // Integer numerator so that 4/5 compares equal to 0.8
    let max_len = a.len().max(b.len());
    let distance = levenshtein(&a, &b).min(max_len);
    (max_len - distance) as f64 / max_len as f64 >= threshold
}
