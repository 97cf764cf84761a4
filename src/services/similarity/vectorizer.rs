//! Term-frequency vectorization and cosine similarity.
//!
//! A deliberately lightweight encoding, not TF-IDF: tokens are counted in
//! first-seen order and emitted as `ln(1 + count)`. Vectors from
//! different texts usually differ in length and are then treated as
//! incomparable (similarity 0) rather than as an error.

use std::collections::HashMap;

use crate::models::ContentItem;

/// Tokens this short carry no signal and are discarded.
const MIN_TOKEN_CHARS: usize = 3;

/// Build the term-frequency vector for an item's title and body.
/// Deterministic for identical text.
pub fn vectorize(item: &ContentItem) -> Vec<f64> {
    vectorize_text(&item.title, &item.body)
}

pub(crate) fn vectorize_text(title: &str, body: &str) -> Vec<f64> {
    let text = format!("{} {}", title, body).to_lowercase();

    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for token in text.split(|c: char| !c.is_alphanumeric() && c != '_') {
        if token.chars().count() < MIN_TOKEN_CHARS {
            continue;
        }
        match counts.get_mut(token) {
            Some(count) => *count += 1,
            None => {
                counts.insert(token.to_string(), 1);
                order.push(token.to_string());
            }
        }
    }

    order
        .iter()
        .map(|token| {
            counts
                .get(token)
                .map(|count| (1.0 + *count as f64).ln())
                .unwrap_or(0.0)
        })
        .collect()
}

/// Standard cosine similarity. Returns 0 when either vector has zero
/// magnitude or when the lengths differ.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectorize_counts_and_order() {
        // "is" is too short; "great" repeats
        let vector = vectorize_text("Rust is great", "great stuff");

        // first-seen order: rust, great, stuff
        assert_eq!(vector.len(), 3);
        assert!((vector[0] - 2.0f64.ln()).abs() < 1e-9);
        assert!((vector[1] - 3.0f64.ln()).abs() < 1e-9);
        assert!((vector[2] - 2.0f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn test_vectorize_is_case_insensitive_and_deterministic() {
        let a = vectorize_text("Async Runtime", "async runtime");
        let b = vectorize_text("Async Runtime", "async runtime");
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_vectorize_empty_text() {
        assert!(vectorize_text("", "").is_empty());
        assert!(vectorize_text("a b c", "of in at").is_empty());
    }

    #[test]
    fn test_cosine_self_similarity_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_bounds_for_nonnegative_vectors() {
        let a = vec![1.0, 0.5, 0.0];
        let b = vec![0.2, 1.0, 3.0];
        let sim = cosine_similarity(&a, &b);
        assert!((0.0..=1.0).contains(&sim));
    }

    #[test]
    fn test_cosine_orthogonal_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_length_mismatch_is_incomparable() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_cosine_zero_magnitude_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }
}
