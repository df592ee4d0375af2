// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relevance scoring: vector cosine and cross-encoder helpers.

/// Cosine similarity in `[-1, 1]`.
///
/// Degenerate input (empty, zero-norm, or vectors of different length)
/// scores 0.0 rather than failing.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f32::EPSILON || !denom.is_finite() {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0)
}

/// Logistic activation mapping a cross-encoder logit into `[0, 1]`.
pub fn sigmoid(logit: f32) -> f32 {
    1.0 / (1.0 + (-logit).exp())
}

/// Index and value of the highest score, first occurrence on ties.
///
/// Starts from 0.0 with a strict comparison, so an all-non-positive list
/// yields `None`.
pub fn best_candidate(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    let mut best_score = 0.0f32;
    for (i, &score) in scores.iter().enumerate() {
        if score > best_score {
            best_score = score;
            best = Some((i, score));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn identical_vectors_score_one() {
        let v = [0.2, -0.4, 0.9];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_score_minus_one() {
        assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_inputs_score_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn cosine_ignores_magnitude() {
        let a = [1.0, 2.0, 3.0];
        let b = [10.0, 20.0, 30.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sigmoid_is_centered_and_bounded() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(12.0) > 0.99);
        assert!(sigmoid(-12.0) < 0.01);
    }

    #[test]
    fn best_candidate_keeps_first_on_ties() {
        assert_eq!(best_candidate(&[0.3, 0.8, 0.8, 0.1]), Some((1, 0.8)));
    }

    #[test]
    fn best_candidate_ignores_non_positive_scores() {
        assert_eq!(best_candidate(&[-0.2, 0.0]), None);
        assert_eq!(best_candidate(&[]), None);
    }

    fn vector() -> impl Strategy<Value = Vec<f32>> {
        prop::collection::vec(-100.0f32..100.0, 1..32)
    }

    proptest! {
        #[test]
        fn cosine_is_symmetric((a, b) in (1usize..32).prop_flat_map(|n| {
            (prop::collection::vec(-100.0f32..100.0, n), prop::collection::vec(-100.0f32..100.0, n))
        })) {
            let ab = cosine_similarity(&a, &b);
            let ba = cosine_similarity(&b, &a);
            prop_assert!((ab - ba).abs() < 1e-5);
            prop_assert!((-1.0..=1.0).contains(&ab));
        }

        #[test]
        fn self_similarity_is_one_or_degenerate(v in vector()) {
            let s = cosine_similarity(&v, &v);
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 1e-3 {
                prop_assert!((s - 1.0).abs() < 1e-4);
            } else {
                prop_assert!(s == 0.0 || (s - 1.0).abs() < 1e-4);
            }
        }
    }
}
